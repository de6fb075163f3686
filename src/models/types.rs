//! Common domain type definitions
//!
//! Enums and small value types shared by the records, the classifiers and the
//! output tables.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Hemisphere label attached to regions, objects and output rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hemisphere {
    /// Left hemisphere
    Left,
    /// Right hemisphere
    Right,
    /// Both hemispheres pooled
    Both,
    /// Same side as the injection site
    Ipsi,
    /// Opposite side to the injection site
    Contra,
}

impl Hemisphere {
    /// Opposite side; pooled labels are their own opposite
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Ipsi => Self::Contra,
            Self::Contra => Self::Ipsi,
            Self::Both => Self::Both,
        }
    }

    /// Whether the label designates a single hemisphere
    #[must_use]
    pub fn is_single_side(self) -> bool {
        !matches!(self, Self::Both)
    }

    /// Parse the usual spellings of a hemisphere name
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "left" | "l" => Some(Self::Left),
            "right" | "r" => Some(Self::Right),
            "both" | "bilateral" => Some(Self::Both),
            "ipsi" | "ipsilateral" => Some(Self::Ipsi),
            "contra" | "contralateral" => Some(Self::Contra),
            _ => None,
        }
    }

    /// Lowercase label used in output tables
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Both => "both",
            Self::Ipsi => "ipsi",
            Self::Contra => "contra",
        }
    }
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anatomical axis along which spatial distributions are computed
///
/// Atlas coordinates follow the Allen CCF ordering: `x` is antero-posterior,
/// `y` dorso-ventral and `z` medio-lateral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Antero-posterior
    Ap,
    /// Dorso-ventral
    Dv,
    /// Medio-lateral
    Ml,
}

impl Axis {
    /// All axes in coordinate order
    pub const ALL: [Self; 3] = [Self::Ap, Self::Dv, Self::Ml];

    /// Coordinate of `coords` along this axis, `None` if missing or not finite
    #[must_use]
    pub fn component(self, coords: &Coordinates) -> Option<f64> {
        let value = match self {
            Self::Ap => coords.x,
            Self::Dv => coords.y,
            Self::Ml => coords.z,
        };
        value.filter(|v| v.is_finite())
    }

    /// Upper-case label, e.g. `AP`
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Ap => "AP",
            Self::Dv => "DV",
            Self::Ml => "ML",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Atlas coordinates in microns; any component may be missing
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Antero-posterior coordinate
    #[serde(default)]
    pub x: Option<f64>,
    /// Dorso-ventral coordinate
    #[serde(default)]
    pub y: Option<f64>,
    /// Medio-lateral coordinate
    #[serde(default)]
    pub z: Option<f64>,
}

impl Coordinates {
    /// Fully specified coordinates
    #[must_use]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: Some(z),
        }
    }

    /// Coordinates with no component known
    #[must_use]
    pub fn missing() -> Self {
        Self::default()
    }

    /// All three components when each is present and finite
    #[must_use]
    pub fn complete(&self) -> Option<(f64, f64, f64)> {
        Some((
            Axis::Ap.component(self)?,
            Axis::Dv.component(self)?,
            Axis::Ml.component(self)?,
        ))
    }
}
