//! Configuration for region aggregation and spatial distributions.
//!
//! The configuration is a typed struct validated before any animal is
//! processed. Checks that need the atlas (region names, nesting of fusion
//! sources) run when the [`crate::context::QuantContext`] is built.

pub mod distribution;
pub mod hemisphere;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::{QuantError, Result};
use crate::models::Hemisphere;

pub use distribution::{
    AxisRange, DistributionConfig, DistributionNormalization, MAX_BINS_PER_AXIS, SliceProfile,
};
pub use hemisphere::HemisphereConfig;

/// Denominator used for region densities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMode {
    /// Region volume in cubic millimetres
    #[default]
    Volume,
    /// Summed annotation area in square millimetres
    Area,
    /// Channel total in the animal
    Count,
}

/// Quantity a density is computed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementKind {
    /// Number of objects (cells, boutons)
    #[default]
    Count,
    /// Summed length of line objects (fibers)
    Length,
}

/// Table region counts are taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountSource {
    /// Count resolved detections
    #[default]
    Detections,
    /// Sum the measurement already counted per annotation
    Annotations,
}

/// What to do when the atlas has no volume for a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeFallback {
    /// Leave the volume unknown (density is NaN)
    #[default]
    Nan,
    /// Use the closest ancestor that has a volume
    NearestAncestor,
}

/// Value of a ratio whose denominator is zero or not finite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NanPolicy {
    /// NaN
    #[default]
    Propagate,
    /// Zero
    Zero,
}

impl NanPolicy {
    /// `num / den` under this policy
    #[must_use]
    pub fn ratio(self, num: f64, den: f64) -> f64 {
        if num.is_finite() && den.is_finite() && den != 0.0 {
            return num / den;
        }
        match self {
            Self::Propagate => f64::NAN,
            Self::Zero => 0.0,
        }
    }
}

/// Several atlas regions merged into one reported region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FusionRuleConfig {
    /// Source acronyms or ids
    pub sources: Vec<String>,
    /// Reported acronym
    pub destination: String,
}

impl FusionRuleConfig {
    /// Create a fusion rule
    #[must_use]
    pub fn new(sources: &[&str], destination: &str) -> Self {
        Self {
            sources: sources.iter().map(ToString::to_string).collect(),
            destination: destination.to_string(),
        }
    }
}

/// Configuration of a quantification run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantConfig {
    /// Primary classification of the objects to quantify, e.g. `Cells`
    pub object_type: String,
    /// Raw channel name to reported channel name
    pub channel_map: BTreeMap<String, String>,
    /// Region fusion rules
    pub fusion_rules: Vec<FusionRuleConfig>,
    /// Regions excluded from every output
    pub blacklist: Vec<String>,
    /// Extend each blacklist entry to its descendants
    pub blacklist_descendants: bool,
    /// Reporting granularity cutoff
    pub leaves_list: Option<Vec<String>>,
    /// Annotation ROI types to ignore, e.g. rectangles drawn for other purposes
    pub excluded_roi_types: Vec<String>,
    /// Hemisphere assignment
    pub hemispheres: HemisphereConfig,
    /// Quantity densities are computed from
    pub measurement: MeasurementKind,
    /// Table counts are taken from
    pub count_source: CountSource,
    /// Density denominator
    pub normalization_mode: NormalizationMode,
    /// Halve region volumes for single-hemisphere rows
    pub split_volume_by_hemisphere: bool,
    /// Missing volume handling
    pub volume_fallback: VolumeFallback,
    /// Channel other densities are expressed relative to
    pub reference_channel: Option<String>,
    /// Value of ratios with a zero or NaN denominator
    pub zero_reference: NanPolicy,
    /// Spatial distributions
    pub distributions: DistributionConfig,
}

impl Default for QuantConfig {
    fn default() -> Self {
        Self {
            object_type: "Cells".to_string(),
            channel_map: BTreeMap::new(),
            fusion_rules: Vec::new(),
            blacklist: Vec::new(),
            blacklist_descendants: true,
            leaves_list: None,
            excluded_roi_types: vec!["Rectangle".to_string()],
            hemispheres: HemisphereConfig::default(),
            measurement: MeasurementKind::Count,
            count_source: CountSource::Detections,
            normalization_mode: NormalizationMode::Volume,
            split_volume_by_hemisphere: false,
            volume_fallback: VolumeFallback::Nan,
            reference_channel: None,
            zero_reference: NanPolicy::Propagate,
            distributions: DistributionConfig::default(),
        }
    }
}

impl QuantConfig {
    /// Create a configuration with default settings
    #[must_use]
    pub fn new(object_type: &str) -> Self {
        Self {
            object_type: object_type.to_string(),
            ..Self::default()
        }
    }

    /// Parse a configuration from JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Map a raw channel name to a reported name
    #[must_use]
    pub fn with_channel(mut self, raw: &str, name: &str) -> Self {
        self.channel_map.insert(raw.to_string(), name.to_string());
        self
    }

    /// Add a fusion rule
    #[must_use]
    pub fn with_fusion(mut self, sources: &[&str], destination: &str) -> Self {
        self.fusion_rules
            .push(FusionRuleConfig::new(sources, destination));
        self
    }

    /// Blacklist a region
    #[must_use]
    pub fn with_blacklisted(mut self, region: &str) -> Self {
        self.blacklist.push(region.to_string());
        self
    }

    /// Set the leaves list
    #[must_use]
    pub fn with_leaves_list(mut self, leaves: &[&str]) -> Self {
        self.leaves_list = Some(leaves.iter().map(ToString::to_string).collect());
        self
    }

    /// Set the hemisphere settings
    #[must_use]
    pub fn with_hemispheres(mut self, hemispheres: HemisphereConfig) -> Self {
        self.hemispheres = hemispheres;
        self
    }

    /// Set the measured quantity
    #[must_use]
    pub fn with_measurement(mut self, measurement: MeasurementKind) -> Self {
        self.measurement = measurement;
        self
    }

    /// Set the count source
    #[must_use]
    pub fn with_count_source(mut self, source: CountSource) -> Self {
        self.count_source = source;
        self
    }

    /// Set the density denominator
    #[must_use]
    pub fn with_normalization_mode(mut self, mode: NormalizationMode) -> Self {
        self.normalization_mode = mode;
        self
    }

    /// Set the missing volume handling
    #[must_use]
    pub fn with_volume_fallback(mut self, fallback: VolumeFallback) -> Self {
        self.volume_fallback = fallback;
        self
    }

    /// Set the reference channel
    #[must_use]
    pub fn with_reference_channel(mut self, channel: &str) -> Self {
        self.reference_channel = Some(channel.to_string());
        self
    }

    /// Set the value of ratios with a zero denominator
    #[must_use]
    pub fn with_zero_reference(mut self, policy: NanPolicy) -> Self {
        self.zero_reference = policy;
        self
    }

    /// Set the distribution settings
    #[must_use]
    pub fn with_distributions(mut self, distributions: DistributionConfig) -> Self {
        self.distributions = distributions;
        self
    }

    /// Reported channel names in output order, without duplicates
    #[must_use]
    pub fn channels(&self) -> Vec<String> {
        self.channel_map.values().unique().cloned().collect()
    }

    /// Reported name of a raw channel
    #[must_use]
    pub fn canonical_channel(&self, raw: &str) -> Option<&str> {
        self.channel_map.get(raw).map(String::as_str)
    }

    /// Check the settings that do not depend on the atlas
    ///
    /// # Errors
    ///
    /// - [`QuantError::InvalidConfig`] for values outside their domain
    /// - [`QuantError::ConfigurationConflict`] for an ambiguous fusion or
    ///   blacklist policy
    pub fn validate(&self) -> Result<()> {
        if self.object_type.trim().is_empty() {
            return Err(QuantError::InvalidConfig("object_type is empty".to_string()));
        }
        if self.channel_map.is_empty() {
            return Err(QuantError::InvalidConfig("channel_map is empty".to_string()));
        }
        if let Some(reference) = &self.reference_channel {
            if !self.channel_map.values().any(|c| c == reference) {
                return Err(QuantError::InvalidConfig(format!(
                    "reference channel {reference} is not a mapped channel"
                )));
            }
        }

        self.validate_hemispheres()?;
        self.validate_fusion()?;
        self.validate_distributions()
    }

    fn validate_hemispheres(&self) -> Result<()> {
        let hemispheres = &self.hemispheres;
        if !hemispheres.midline.is_finite() {
            return Err(QuantError::InvalidConfig(format!(
                "midline {} is not finite",
                hemispheres.midline
            )));
        }
        let anatomical = [Hemisphere::Left, Hemisphere::Right, Hemisphere::Both];
        for (name, side) in [
            ("below_midline", hemispheres.below_midline),
            ("on_midline", hemispheres.on_midline),
        ] {
            if !anatomical.contains(&side) {
                return Err(QuantError::InvalidConfig(format!(
                    "{name} must be left, right or both, got {side}"
                )));
            }
        }
        Ok(())
    }

    fn validate_fusion(&self) -> Result<()> {
        let blacklisted: BTreeSet<&str> = self.blacklist.iter().map(|s| s.trim()).collect();
        let mut sources_seen: BTreeMap<&str, &str> = BTreeMap::new();
        let mut destinations: BTreeSet<&str> = BTreeSet::new();

        for rule in &self.fusion_rules {
            let destination = rule.destination.trim();
            if destination.is_empty() {
                return Err(QuantError::ConfigurationConflict(
                    "fusion rule with empty destination".to_string(),
                ));
            }
            if rule.sources.is_empty() {
                return Err(QuantError::ConfigurationConflict(format!(
                    "fusion rule {destination} has no source"
                )));
            }
            if !destinations.insert(destination) {
                return Err(QuantError::ConfigurationConflict(format!(
                    "fusion destination {destination} is declared twice"
                )));
            }
            if blacklisted.contains(destination) {
                return Err(QuantError::ConfigurationConflict(format!(
                    "fusion destination {destination} is blacklisted"
                )));
            }
            for source in &rule.sources {
                if let Some(other) = sources_seen.insert(source.trim(), destination) {
                    return Err(QuantError::ConfigurationConflict(format!(
                        "region {source} is a source of both {other} and {destination}"
                    )));
                }
            }
        }
        Ok(())
    }

    fn validate_distributions(&self) -> Result<()> {
        let distributions = &self.distributions;
        if !distributions.enabled {
            return Ok(());
        }
        for axis in &distributions.axes {
            let width = match distributions.bin_widths.get(axis) {
                Some(&width) if width.is_finite() && width > 0.0 => width,
                Some(width) => {
                    return Err(QuantError::InvalidConfig(format!(
                        "bin width {width} of axis {axis} must be positive"
                    )));
                }
                None => {
                    return Err(QuantError::InvalidConfig(format!(
                        "no bin width for axis {axis}"
                    )));
                }
            };
            if let Some(range) = distributions.ranges.get(axis) {
                if !(range.min.is_finite() && range.max.is_finite() && range.min < range.max) {
                    return Err(QuantError::InvalidConfig(format!(
                        "range [{}, {}] of axis {axis} is empty or not finite",
                        range.min, range.max
                    )));
                }
                if (range.max - range.min) / width > MAX_BINS_PER_AXIS as f64 {
                    return Err(QuantError::InvalidConfig(format!(
                        "range [{}, {}] of axis {axis} needs more than {MAX_BINS_PER_AXIS} bins of width {width}",
                        range.min, range.max
                    )));
                }
            }
            if distributions.normalization == DistributionNormalization::VolumeSlice {
                match distributions.slice_profiles.get(axis) {
                    Some(profile) if profile.step.is_finite() && profile.step > 0.0 => {}
                    _ => {
                        return Err(QuantError::InvalidConfig(format!(
                            "volume slice normalization needs a slice profile with positive step for axis {axis}"
                        )));
                    }
                }
            }
        }
        if distributions.normalization == DistributionNormalization::ReferenceChannel
            && self.reference_channel.is_none()
        {
            return Err(QuantError::InvalidConfig(
                "reference channel normalization needs reference_channel".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for QuantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Quantification Configuration:")?;
        writeln!(f, "  Object Type: {}", self.object_type)?;
        writeln!(f, "  Channels: {}", self.channels().join(", "))?;
        writeln!(f, "  Fusion Rules: {}", self.fusion_rules.len())?;
        writeln!(f, "  Blacklisted Regions: {}", self.blacklist.len())?;
        if let Some(leaves) = &self.leaves_list {
            writeln!(f, "  Leaves List: {} regions", leaves.len())?;
        }
        writeln!(f, "  Measurement: {:?}", self.measurement)?;
        writeln!(f, "  Count Source: {:?}", self.count_source)?;
        writeln!(f, "  Normalization: {:?}", self.normalization_mode)?;
        if let Some(reference) = &self.reference_channel {
            writeln!(f, "  Reference Channel: {reference}")?;
        }
        writeln!(f, "  Midline: {}", self.hemispheres.midline)?;
        if self.distributions.enabled {
            let axes = self.distributions.axes.iter().join(", ");
            writeln!(f, "  Distribution Axes: {axes}")?;
            writeln!(
                f,
                "  Injection Centering: {}",
                self.distributions.center_on_injection
            )?;
        }
        Ok(())
    }
}
