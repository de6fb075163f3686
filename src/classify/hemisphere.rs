//! Hemisphere assignment

use crate::config::HemisphereConfig;
use crate::diagnostics::DropReason;
use crate::models::{Axis, Coordinates, Hemisphere};

/// Derives the hemisphere of a record
///
/// Precedence: merged mode, then the raw hemisphere field, then the
/// medio-lateral coordinate against the midline, then the fallback.
#[derive(Debug, Clone, Copy)]
pub struct HemisphereClassifier<'a> {
    config: &'a HemisphereConfig,
    injection: Option<Hemisphere>,
}

impl<'a> HemisphereClassifier<'a> {
    /// Create a classifier for one animal
    ///
    /// `injection` is the injected hemisphere, used for ipsi/contra labels.
    #[must_use]
    pub fn new(config: &'a HemisphereConfig, injection: Option<Hemisphere>) -> Self {
        Self { config, injection }
    }

    /// Hemisphere of a raw field and coordinates
    ///
    /// # Errors
    ///
    /// [`DropReason::MissingHemisphere`] if neither a usable field nor a
    /// coordinate is present and no fallback is configured.
    pub fn classify(
        &self,
        raw: Option<&str>,
        coords: Option<&Coordinates>,
    ) -> Result<Hemisphere, DropReason> {
        if self.config.merge {
            return Ok(Hemisphere::Both);
        }
        let side = raw
            .and_then(|name| self.from_name(name))
            .or_else(|| coords.and_then(|c| self.from_coordinate(c)))
            .or(self.config.fallback)
            .ok_or(DropReason::MissingHemisphere)?;
        Ok(self.relabel(side))
    }

    /// Labels a region can be reported under for this animal
    ///
    /// Both sides, relabelled ipsi/contra when configured, or only
    /// [`Hemisphere::Both`] when hemispheres are pooled.
    #[must_use]
    pub fn sides(&self) -> Vec<Hemisphere> {
        if self.config.merge || self.config.below_midline == Hemisphere::Both {
            return vec![Hemisphere::Both];
        }
        vec![self.relabel(Hemisphere::Left), self.relabel(Hemisphere::Right)]
    }

    fn from_name(&self, name: &str) -> Option<Hemisphere> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        self.config
            .names
            .get(name)
            .copied()
            .or_else(|| Hemisphere::parse(name))
    }

    fn from_coordinate(&self, coords: &Coordinates) -> Option<Hemisphere> {
        let ml = Axis::Ml.component(coords)?;
        let side = if ml < self.config.midline {
            self.config.below_midline
        } else if ml > self.config.midline {
            match self.config.below_midline {
                Hemisphere::Both => Hemisphere::Both,
                below => below.opposite(),
            }
        } else {
            self.config.on_midline
        };
        Some(side)
    }

    /// Left/right as ipsi/contra relative to the injected side
    fn relabel(&self, side: Hemisphere) -> Hemisphere {
        if !self.config.ipsi_contra {
            return side;
        }
        let sided = |h: Hemisphere| matches!(h, Hemisphere::Left | Hemisphere::Right);
        match self.injection {
            Some(injected) if sided(injected) && sided(side) => {
                if injected == side {
                    Hemisphere::Ipsi
                } else {
                    Hemisphere::Contra
                }
            }
            _ => side,
        }
    }
}
