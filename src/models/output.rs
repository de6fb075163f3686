//! Output rows
//!
//! Rows are created once per animal and never mutated afterwards; the
//! combiner only concatenates them.

use serde::{Deserialize, Serialize};

use super::types::{Axis, Hemisphere};

/// Count, length and density statistics of one region/hemisphere/channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionStat {
    /// Animal identifier
    pub animal_id: String,
    /// Canonical region acronym
    pub region: String,
    /// Hemisphere label
    pub hemisphere: Hemisphere,
    /// Canonical channel name
    pub channel: String,
    /// Number of objects
    pub count: u64,
    /// Summed length of line objects in microns
    pub length_sum_um: f64,
    /// Region volume used as denominator, per hemisphere if configured
    pub volume_mm3: Option<f64>,
    /// Summed annotation area in square millimetres
    pub area_mm2: Option<f64>,
    /// Count or length per unit volume/area, NaN when the denominator is unknown or zero
    pub density: f64,
    /// Density relative to the reference channel, `None` without reference channel
    pub normalized_density: Option<f64>,
    /// Share of the channel's total count (or length) in this animal
    pub relative_count: f64,
    /// Share of the channel's summed density in this animal
    pub relative_density: f64,
}

/// One bin of a spatial distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionBin {
    /// Animal identifier
    pub animal_id: String,
    /// Axis the distribution runs along
    pub axis: Axis,
    /// Canonical channel name
    pub channel: String,
    /// Hemisphere label
    pub hemisphere: Hemisphere,
    /// Inclusive lower bound
    pub bin_start: f64,
    /// Upper bound, exclusive except for the last bin
    pub bin_end: f64,
    /// Number of objects in the bin
    pub count: u64,
    /// Count after normalization
    pub value: f64,
}

/// Distribution table of one axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisDistribution {
    /// Axis
    pub axis: Axis,
    /// Bins, grouped by channel then hemisphere, in ascending position
    pub bins: Vec<DistributionBin>,
}

impl AxisDistribution {
    /// Empty table for an axis
    #[must_use]
    pub fn new(axis: Axis) -> Self {
        Self {
            axis,
            bins: Vec::new(),
        }
    }
}

/// Flat per-object coordinates for 2D plots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateRow {
    /// Animal identifier
    pub animal_id: String,
    /// Canonical channel name
    pub channel: String,
    /// Hemisphere label
    pub hemisphere: Hemisphere,
    /// Antero-posterior coordinate in microns
    pub x: f64,
    /// Dorso-ventral coordinate in microns
    pub y: f64,
    /// Medio-lateral coordinate in microns
    pub z: f64,
}
