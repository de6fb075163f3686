//! Per-animal diagnostics
//!
//! Records that cannot be used are dropped and tallied here rather than
//! raised; degraded lookups (missing volumes, missing injection sites) are
//! listed by name.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

/// Why a record was left out of (part of) the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Region absent from the atlas
    UnresolvedRegion,
    /// Region or one of its ancestors is blacklisted
    Blacklisted,
    /// Primary classification differs from the configured object type
    WrongObjectType,
    /// Channel absent from the channel map
    UnknownChannel,
    /// No hemisphere field, no coordinate and no fallback
    MissingHemisphere,
    /// Annotation ROI type is excluded
    ExcludedRoi,
    /// Object region was not part of the annotated regions
    UncoveredRegion,
    /// Coordinate outside a configured distribution range
    OutOfRange,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::UnresolvedRegion => "unresolved region",
            Self::Blacklisted => "blacklisted",
            Self::WrongObjectType => "wrong object type",
            Self::UnknownChannel => "unknown channel",
            Self::MissingHemisphere => "missing hemisphere",
            Self::ExcludedRoi => "excluded ROI",
            Self::UncoveredRegion => "uncovered region",
            Self::OutOfRange => "out of range",
        };
        f.write_str(label)
    }
}

/// Summary of everything that was dropped or degraded for one animal
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    /// Number of dropped records per reason
    pub dropped: BTreeMap<DropReason, usize>,
    /// Raw region names absent from the atlas
    pub unresolved_regions: BTreeSet<String>,
    /// Raw channel names absent from the channel map
    pub unknown_channels: BTreeSet<String>,
    /// Regions reported with an unknown or zero volume
    pub missing_volumes: BTreeSet<String>,
    /// Channels binned without injection-site centering
    pub missing_injection_sites: BTreeSet<String>,
}

impl Diagnostics {
    /// Create an empty summary
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tally one dropped record
    pub fn record(&mut self, reason: DropReason) {
        *self.dropped.entry(reason).or_insert(0) += 1;
    }

    /// Number of records dropped for `reason`
    #[must_use]
    pub fn count(&self, reason: DropReason) -> usize {
        self.dropped.get(&reason).copied().unwrap_or(0)
    }

    /// Total number of dropped records
    #[must_use]
    pub fn total_dropped(&self) -> usize {
        self.dropped.values().sum()
    }

    /// Whether nothing was dropped or degraded
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.dropped.is_empty()
            && self.missing_volumes.is_empty()
            && self.missing_injection_sites.is_empty()
    }

    /// Add another summary into this one
    pub fn merge(&mut self, other: &Self) {
        for (reason, count) in &other.dropped {
            *self.dropped.entry(*reason).or_insert(0) += count;
        }
        self.unresolved_regions
            .extend(other.unresolved_regions.iter().cloned());
        self.unknown_channels
            .extend(other.unknown_channels.iter().cloned());
        self.missing_volumes
            .extend(other.missing_volumes.iter().cloned());
        self.missing_injection_sites
            .extend(other.missing_injection_sites.iter().cloned());
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            return write!(f, "no record dropped");
        }
        let dropped: Vec<String> = self
            .dropped
            .iter()
            .map(|(reason, count)| format!("{count} {reason}"))
            .collect();
        write!(f, "dropped: [{}]", dropped.join(", "))?;
        if !self.missing_volumes.is_empty() {
            write!(f, "; no volume: {} regions", self.missing_volumes.len())?;
        }
        if !self.missing_injection_sites.is_empty() {
            write!(
                f,
                "; not centered: {}",
                self.missing_injection_sites
                    .iter()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ")
            )?;
        }
        Ok(())
    }
}
