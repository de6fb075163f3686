//! Region aggregation
//!
//! Groups the resolved records of one animal by (region, hemisphere, channel)
//! and derives count, summed length and densities for each group.
//!
//! Rows exist only for the (region, hemisphere) pairs covered by the
//! annotation table. Each covered pair gets one row per configured channel,
//! including channels with no object there, so that zero counts are reported
//! for imaged regions but never invented for regions that were not imaged.
//! Only an animal without any annotation table takes its coverage from the
//! objects themselves.
//!
//! `count` is the number of objects in the group whatever their shape, so
//! for line objects it is the number of segments next to their summed
//! length. The `measurement` setting picks which of the two feeds the
//! density.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::{CountSource, MeasurementKind, NanPolicy, NormalizationMode, QuantConfig};
use crate::diagnostics::{Diagnostics, DropReason};
use crate::models::{CanonicalRegion, Hemisphere, RegionStat, ResolvedAnnotation, ResolvedObject};

const UM2_PER_MM2: f64 = 1.0e6;

/// (region acronym, hemisphere)
type CoverageKey = (String, Hemisphere);

/// One covered (region, hemisphere) pair
#[derive(Debug)]
struct Coverage {
    region: Arc<CanonicalRegion>,
    hemisphere: Hemisphere,
    area_um2: Option<f64>,
}

/// Running totals of one (region, hemisphere, channel) group
#[derive(Debug, Clone, Copy, Default)]
struct GroupTotals {
    count: f64,
    length_sum_um: f64,
}

/// Covered pairs in first-occurrence order
#[derive(Debug, Default)]
struct CoverageIndex {
    entries: Vec<Coverage>,
    index: FxHashMap<CoverageKey, usize>,
    seen_annotations: FxHashSet<(usize, String)>,
}

impl CoverageIndex {
    fn from_annotations(annotations: &[ResolvedAnnotation]) -> Self {
        let mut coverage = Self::default();
        for annotation in annotations {
            let idx = coverage.insert(&annotation.region, annotation.hemisphere);
            if let Some(area) = annotation.area_um2 {
                // Several rows may describe the same polygon, one per channel
                if coverage
                    .seen_annotations
                    .insert((idx, annotation.annotation_id.clone()))
                {
                    let entry = &mut coverage.entries[idx];
                    entry.area_um2 = Some(entry.area_um2.unwrap_or(0.0) + area);
                }
            }
        }
        coverage
    }

    fn from_objects(objects: &[ResolvedObject]) -> Self {
        let mut coverage = Self::default();
        for object in objects {
            coverage.insert(&object.region, object.hemisphere);
        }
        coverage
    }

    fn insert(&mut self, region: &Arc<CanonicalRegion>, hemisphere: Hemisphere) -> usize {
        let key = (region.acronym.clone(), hemisphere);
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.entries.len();
        self.entries.push(Coverage {
            region: Arc::clone(region),
            hemisphere,
            area_um2: None,
        });
        self.index.insert(key, idx);
        idx
    }

    fn get(&self, region: &str, hemisphere: Hemisphere) -> Option<usize> {
        self.index.get(&(region.to_string(), hemisphere)).copied()
    }
}

/// Aggregate the resolved records of one animal into region rows
///
/// `annotations` is `None` when the animal has no annotation table, in which
/// case every (region, hemisphere) holding an object is covered. An empty
/// slice covers nothing.
///
/// Objects outside the annotated coverage are tallied as
/// [`DropReason::UncoveredRegion`]; regions reported without a usable volume
/// are listed in [`Diagnostics::missing_volumes`].
#[must_use]
pub fn aggregate_regions(
    config: &QuantConfig,
    animal_id: &str,
    objects: &[ResolvedObject],
    annotations: Option<&[ResolvedAnnotation]>,
    diagnostics: &mut Diagnostics,
) -> Vec<RegionStat> {
    let coverage = match annotations {
        Some(annotations) => CoverageIndex::from_annotations(annotations),
        None => CoverageIndex::from_objects(objects),
    };
    let annotations = annotations.unwrap_or_default();
    let channels = config.channels();
    let channel_idx: FxHashMap<&str, usize> = channels
        .iter()
        .enumerate()
        .map(|(idx, channel)| (channel.as_str(), idx))
        .collect();

    let n_channels = channels.len();
    let mut totals = vec![GroupTotals::default(); coverage.entries.len() * n_channels];

    match config.count_source {
        CountSource::Detections => {
            for object in objects {
                let Some(cov) = coverage.get(&object.region.acronym, object.hemisphere) else {
                    diagnostics.record(DropReason::UncoveredRegion);
                    continue;
                };
                let Some(&ch) = channel_idx.get(object.channel.as_str()) else {
                    continue;
                };
                let group = &mut totals[cov * n_channels + ch];
                group.count += 1.0;
                group.length_sum_um += object.length_um.unwrap_or(0.0);
            }
        }
        CountSource::Annotations => {
            for annotation in annotations {
                let Some(channel) = annotation.channel.as_deref() else {
                    continue;
                };
                let (Some(cov), Some(&ch)) = (
                    coverage.get(&annotation.region.acronym, annotation.hemisphere),
                    channel_idx.get(channel),
                ) else {
                    continue;
                };
                let group = &mut totals[cov * n_channels + ch];
                match config.measurement {
                    MeasurementKind::Count => group.count += annotation.value,
                    MeasurementKind::Length => group.length_sum_um += annotation.value,
                }
            }
        }
    }

    let measured = |group: &GroupTotals| match config.measurement {
        MeasurementKind::Count => group.count,
        MeasurementKind::Length => group.length_sum_um,
    };

    let mut channel_totals = vec![0.0; n_channels];
    for (idx, group) in totals.iter().enumerate() {
        channel_totals[idx % n_channels] += measured(group);
    }

    let mut rows = Vec::with_capacity(totals.len());
    for (cov_idx, cov) in coverage.entries.iter().enumerate() {
        let volume_mm3 = row_volume(config, &cov.region, cov.hemisphere);
        if volume_mm3.is_none_or(|v| v <= 0.0) {
            diagnostics
                .missing_volumes
                .insert(cov.region.acronym.clone());
        }
        let area_mm2 = cov.area_um2.map(|a| a / UM2_PER_MM2);

        for (ch, channel) in channels.iter().enumerate() {
            let group = &totals[cov_idx * n_channels + ch];
            let value = measured(group);
            let denominator = match config.normalization_mode {
                NormalizationMode::Volume => volume_mm3,
                NormalizationMode::Area => area_mm2,
                NormalizationMode::Count => Some(channel_totals[ch]),
            };
            rows.push(RegionStat {
                animal_id: animal_id.to_string(),
                region: cov.region.acronym.clone(),
                hemisphere: cov.hemisphere,
                channel: channel.clone(),
                count: to_count(group.count),
                length_sum_um: group.length_sum_um,
                volume_mm3,
                area_mm2,
                density: NanPolicy::Propagate.ratio(value, denominator.unwrap_or(f64::NAN)),
                normalized_density: None,
                relative_count: config.zero_reference.ratio(value, channel_totals[ch]),
                relative_density: f64::NAN,
            });
        }
    }

    fill_relative_density(config, &mut rows, n_channels);
    fill_normalized_density(config, &mut rows, &channels);
    rows
}

fn row_volume(config: &QuantConfig, region: &CanonicalRegion, hemisphere: Hemisphere) -> Option<f64> {
    let volume = region.volume_mm3?;
    if config.split_volume_by_hemisphere && hemisphere.is_single_side() {
        Some(volume / 2.0)
    } else {
        Some(volume)
    }
}

fn to_count(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

/// Density over the sum of the channel's finite densities
fn fill_relative_density(config: &QuantConfig, rows: &mut [RegionStat], n_channels: usize) {
    if n_channels == 0 {
        return;
    }
    let mut sums = vec![0.0; n_channels];
    for (idx, row) in rows.iter().enumerate() {
        if row.density.is_finite() {
            sums[idx % n_channels] += row.density;
        }
    }
    for (idx, row) in rows.iter_mut().enumerate() {
        row.relative_density = config.zero_reference.ratio(row.density, sums[idx % n_channels]);
    }
}

/// Density over the reference channel's density in the same region and hemisphere
fn fill_normalized_density(config: &QuantConfig, rows: &mut [RegionStat], channels: &[String]) {
    let Some(reference) = config.reference_channel.as_deref() else {
        return;
    };
    let Some(ref_idx) = channels.iter().position(|c| c == reference) else {
        return;
    };
    for chunk in rows.chunks_mut(channels.len()) {
        let reference_density = chunk[ref_idx].density;
        for row in chunk.iter_mut() {
            row.normalized_density = Some(config.zero_reference.ratio(row.density, reference_density));
        }
    }
}
