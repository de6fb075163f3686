//! Hemisphere assignment settings

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::Hemisphere;

/// How hemispheres are derived from raw fields and coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HemisphereConfig {
    /// Medio-lateral coordinate of the midline, in microns
    pub midline: f64,
    /// Hemisphere of objects with a medio-lateral coordinate below the midline
    pub below_midline: Hemisphere,
    /// Hemisphere of objects lying exactly on the midline
    pub on_midline: Hemisphere,
    /// Extra raw hemisphere names, checked before the usual spellings
    pub names: BTreeMap<String, Hemisphere>,
    /// Pool both hemispheres as `both`
    pub merge: bool,
    /// Hemisphere of records with neither raw field nor coordinate; dropped if `None`
    pub fallback: Option<Hemisphere>,
    /// Relabel left/right as ipsi/contra relative to the injected hemisphere
    pub ipsi_contra: bool,
}

impl Default for HemisphereConfig {
    fn default() -> Self {
        Self {
            midline: 5700.0,
            below_midline: Hemisphere::Right,
            on_midline: Hemisphere::Left,
            names: BTreeMap::new(),
            merge: false,
            fallback: None,
            ipsi_contra: false,
        }
    }
}

impl HemisphereConfig {
    /// Set the midline coordinate
    #[must_use]
    pub fn with_midline(mut self, midline: f64) -> Self {
        self.midline = midline;
        self
    }

    /// Set the side of coordinates below the midline
    #[must_use]
    pub fn with_below_midline(mut self, hemisphere: Hemisphere) -> Self {
        self.below_midline = hemisphere;
        self
    }

    /// Set the side of coordinates exactly on the midline
    #[must_use]
    pub fn with_on_midline(mut self, hemisphere: Hemisphere) -> Self {
        self.on_midline = hemisphere;
        self
    }

    /// Map an extra raw hemisphere name
    #[must_use]
    pub fn with_name(mut self, raw: &str, hemisphere: Hemisphere) -> Self {
        self.names.insert(raw.to_string(), hemisphere);
        self
    }

    /// Pool both hemispheres
    #[must_use]
    pub fn merged(mut self) -> Self {
        self.merge = true;
        self
    }

    /// Set the fallback hemisphere
    #[must_use]
    pub fn with_fallback(mut self, hemisphere: Option<Hemisphere>) -> Self {
        self.fallback = hemisphere;
        self
    }

    /// Enable ipsi/contra labels
    #[must_use]
    pub fn with_ipsi_contra(mut self, enabled: bool) -> Self {
        self.ipsi_contra = enabled;
        self
    }
}
