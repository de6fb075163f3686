//! Spatial distribution settings

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::Axis;

/// Upper bound on the number of bins along one axis
pub const MAX_BINS_PER_AXIS: usize = 100_000;

/// How bin counts are turned into bin values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionNormalization {
    /// Raw counts
    #[default]
    None,
    /// Divide by the channel's total count in the animal
    TotalCount,
    /// Divide by the atlas volume of the bin's slab
    VolumeSlice,
    /// Divide by the reference channel's count in the same bin and hemisphere
    ReferenceChannel,
}

/// Fixed coordinate range of an axis, in microns
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
}

impl AxisRange {
    /// Create a range
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// Atlas volume per slab of constant width along one axis
///
/// Slab `k` spans `[origin + k * step, origin + (k + 1) * step)` in atlas
/// coordinates and holds `volumes[k]` cubic millimetres of brain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceProfile {
    /// Start of the first slab, in microns
    pub origin: f64,
    /// Slab width, in microns
    pub step: f64,
    /// Volume of each slab
    pub volumes: Vec<f64>,
}

impl SliceProfile {
    /// Volume between `lo` and `hi`, slabs prorated by overlap
    #[must_use]
    pub fn volume_between(&self, lo: f64, hi: f64) -> f64 {
        if self.step.is_nan() || self.step <= 0.0 || hi <= lo {
            return 0.0;
        }
        self.volumes
            .iter()
            .enumerate()
            .map(|(k, volume)| {
                let slab_lo = self.origin + k as f64 * self.step;
                let slab_hi = slab_lo + self.step;
                let overlap = hi.min(slab_hi) - lo.max(slab_lo);
                if overlap > 0.0 {
                    volume * overlap / self.step
                } else {
                    0.0
                }
            })
            .sum()
    }
}

/// Settings of the spatial distribution binner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionConfig {
    /// Whether distributions are computed at all
    pub enabled: bool,
    /// Axes to bin along, in output order
    pub axes: Vec<Axis>,
    /// Bin width per axis, in microns
    pub bin_widths: BTreeMap<Axis, f64>,
    /// Fixed range per axis; derived from the data when absent
    pub ranges: BTreeMap<Axis, AxisRange>,
    /// Subtract the animal's injection site before binning
    pub center_on_injection: bool,
    /// Bin value normalization
    pub normalization: DistributionNormalization,
    /// Keep hemispheres apart; otherwise all objects are pooled as `both`
    pub per_hemisphere: bool,
    /// Slab volumes for [`DistributionNormalization::VolumeSlice`]
    pub slice_profiles: BTreeMap<Axis, SliceProfile>,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            axes: Axis::ALL.to_vec(),
            bin_widths: Axis::ALL.iter().map(|&axis| (axis, 100.0)).collect(),
            ranges: BTreeMap::new(),
            center_on_injection: false,
            normalization: DistributionNormalization::None,
            per_hemisphere: true,
            slice_profiles: BTreeMap::new(),
        }
    }
}

impl DistributionConfig {
    /// Disable distributions
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Restrict to the given axes
    #[must_use]
    pub fn with_axes(mut self, axes: &[Axis]) -> Self {
        self.axes = axes.to_vec();
        self
    }

    /// Set the bin width of an axis
    #[must_use]
    pub fn with_bin_width(mut self, axis: Axis, width: f64) -> Self {
        self.bin_widths.insert(axis, width);
        self
    }

    /// Fix the range of an axis
    #[must_use]
    pub fn with_range(mut self, axis: Axis, min: f64, max: f64) -> Self {
        self.ranges.insert(axis, AxisRange::new(min, max));
        self
    }

    /// Enable or disable injection-site centering
    #[must_use]
    pub fn with_centering(mut self, enabled: bool) -> Self {
        self.center_on_injection = enabled;
        self
    }

    /// Set the bin normalization
    #[must_use]
    pub fn with_normalization(mut self, normalization: DistributionNormalization) -> Self {
        self.normalization = normalization;
        self
    }

    /// Keep or pool hemispheres
    #[must_use]
    pub fn with_per_hemisphere(mut self, per_hemisphere: bool) -> Self {
        self.per_hemisphere = per_hemisphere;
        self
    }

    /// Set the slab volumes of an axis
    #[must_use]
    pub fn with_slice_profile(mut self, axis: Axis, profile: SliceProfile) -> Self {
        self.slice_profiles.insert(axis, profile);
        self
    }
}
