//! Per-animal processing
//!
//! Resolves and classifies the records of one animal, then runs the region
//! aggregation and the distribution binning over them.

use std::sync::Arc;
use std::time::Instant;

use crate::algorithm::distribution::bin_distributions;
use crate::algorithm::regions::aggregate_regions;
use crate::classify::{ChannelClassifier, HemisphereClassifier};
use crate::context::QuantContext;
use crate::diagnostics::{Diagnostics, DropReason};
use crate::error::{QuantError, Result};
use crate::models::{
    AnimalInput, AxisDistribution, CanonicalRegion, CoordinateRow, RegionStat, ResolvedAnnotation,
    ResolvedObject,
};
use crate::policy::{RegionCache, Resolution};

/// Every table produced for one animal
#[derive(Debug, Clone, PartialEq)]
pub struct AnimalOutput {
    /// Animal identifier
    pub animal_id: String,
    /// One row per covered (region, hemisphere) and channel
    pub regions: Vec<RegionStat>,
    /// One table per configured axis
    pub distributions: Vec<AxisDistribution>,
    /// Coordinates of every resolved object with complete coordinates
    pub coordinates: Vec<CoordinateRow>,
    /// Dropped and degraded records
    pub diagnostics: Diagnostics,
}

/// Run region aggregation and distribution binning for one animal
///
/// # Errors
///
/// Returns [`QuantError::AnimalProcessingFailure`] if the input is malformed
/// (a record of another animal, a negative or non-finite length, a
/// non-finite coordinate or measurement value) or if its coordinates span
/// too many distribution bins.
pub fn process_animal(ctx: &QuantContext, input: &AnimalInput) -> Result<AnimalOutput> {
    let start = Instant::now();
    let animal_id = input.animal_id.as_str();
    check_input(input).map_err(|reason| QuantError::AnimalProcessingFailure {
        animal: animal_id.to_string(),
        reason,
    })?;

    let config = ctx.config();
    let mut diagnostics = Diagnostics::new();
    let mut regions = ctx.region_cache();
    let channels = ChannelClassifier::new(config);
    let hemispheres = HemisphereClassifier::new(&config.hemispheres, input.injection_hemisphere);

    let mut annotations = Vec::with_capacity(input.annotations.len());
    for record in &input.annotations {
        if config
            .excluded_roi_types
            .iter()
            .any(|roi| roi.eq_ignore_ascii_case(record.roi_type.trim()))
        {
            diagnostics.record(DropReason::ExcludedRoi);
            continue;
        }
        let Some(region) = resolve_region(&mut regions, &record.raw_region, &mut diagnostics) else {
            continue;
        };
        // Without a side, the annotation marks the region as imaged on both
        // sides; its area and measurement cannot be attributed to either.
        let (sides, attributed) = match hemispheres.classify(record.raw_hemisphere.as_deref(), None) {
            Ok(hemisphere) => (vec![hemisphere], true),
            Err(DropReason::MissingHemisphere) => (hemispheres.sides(), false),
            Err(reason) => {
                diagnostics.record(reason);
                continue;
            }
        };
        // Rows measuring something else still mark the region as imaged
        let channel = match record.raw_classification.as_deref().map(|c| channels.classify(c)) {
            Some(Ok(channel)) if attributed => Some(channel.to_string()),
            Some(Err(DropReason::UnknownChannel)) => {
                if let Some(raw) = &record.raw_classification {
                    let (_, name) = ChannelClassifier::split(raw);
                    diagnostics.unknown_channels.insert(name.to_string());
                }
                None
            }
            _ => None,
        };
        for hemisphere in sides {
            annotations.push(ResolvedAnnotation {
                annotation_id: record.object_id.clone(),
                region: Arc::clone(&region),
                hemisphere,
                channel: channel.clone(),
                area_um2: record.area_um2.filter(|_| attributed),
                value: record.base_measurement_value,
            });
        }
    }

    let mut objects = Vec::with_capacity(input.objects.len());
    for record in &input.objects {
        let channel = match channels.classify(&record.raw_classification) {
            Ok(channel) => channel,
            Err(reason) => {
                if reason == DropReason::UnknownChannel {
                    let (_, name) = ChannelClassifier::split(&record.raw_classification);
                    diagnostics.unknown_channels.insert(name.to_string());
                }
                diagnostics.record(reason);
                continue;
            }
        };
        let Some(region) = resolve_region(&mut regions, &record.raw_region, &mut diagnostics) else {
            continue;
        };
        let hemisphere =
            match hemispheres.classify(record.raw_hemisphere.as_deref(), Some(&record.coords)) {
                Ok(hemisphere) => hemisphere,
                Err(reason) => {
                    diagnostics.record(reason);
                    continue;
                }
            };
        objects.push(ResolvedObject {
            object_id: record.object_id.clone(),
            region,
            hemisphere,
            channel: channel.to_string(),
            coords: record.coords,
            length_um: record.length_um,
        });
    }

    // Coverage comes from the objects only when there is no annotation table
    let coverage = (!input.annotations.is_empty()).then_some(annotations.as_slice());
    let region_rows = aggregate_regions(config, animal_id, &objects, coverage, &mut diagnostics);
    let distributions = if config.distributions.enabled {
        bin_distributions(
            config,
            animal_id,
            &hemispheres.sides(),
            &input.injection_sites,
            &objects,
            &mut diagnostics,
        )?
    } else {
        Vec::new()
    };
    let coordinates = coordinate_rows(animal_id, &objects);

    log::debug!(
        "Processed animal {animal_id}: {} objects, {} region rows in {:?} ({diagnostics})",
        objects.len(),
        region_rows.len(),
        start.elapsed()
    );

    Ok(AnimalOutput {
        animal_id: animal_id.to_string(),
        regions: region_rows,
        distributions,
        coordinates,
        diagnostics,
    })
}

fn resolve_region(
    cache: &mut RegionCache<'_>,
    raw_region: &str,
    diagnostics: &mut Diagnostics,
) -> Option<Arc<CanonicalRegion>> {
    match cache.resolve(raw_region) {
        Resolution::Resolved(region) => Some(region),
        Resolution::Excluded(reason) => {
            if reason == DropReason::UnresolvedRegion {
                diagnostics
                    .unresolved_regions
                    .insert(raw_region.to_string());
            }
            diagnostics.record(reason);
            None
        }
    }
}

fn coordinate_rows(animal_id: &str, objects: &[ResolvedObject]) -> Vec<CoordinateRow> {
    objects
        .iter()
        .filter_map(|object| {
            let (x, y, z) = object.coords.complete()?;
            Some(CoordinateRow {
                animal_id: animal_id.to_string(),
                channel: object.channel.clone(),
                hemisphere: object.hemisphere,
                x,
                y,
                z,
            })
        })
        .collect()
}

/// Reject inputs that would silently corrupt the animal's tables
fn check_input(input: &AnimalInput) -> std::result::Result<(), String> {
    let animal_id = input.animal_id.as_str();
    if let Some(record) = input.objects.iter().find(|r| r.animal_id != animal_id) {
        return Err(format!(
            "object {} belongs to animal '{}'",
            record.object_id, record.animal_id
        ));
    }
    if let Some(record) = input.annotations.iter().find(|r| r.animal_id != animal_id) {
        return Err(format!(
            "annotation {} belongs to animal '{}'",
            record.object_id, record.animal_id
        ));
    }
    if let Some(record) = input
        .objects
        .iter()
        .find(|r| r.length_um.is_some_and(|l| !l.is_finite() || l < 0.0))
    {
        return Err(format!(
            "object {} has invalid length {:?}",
            record.object_id, record.length_um
        ));
    }
    if let Some(record) = input.objects.iter().find(|r| {
        [r.coords.x, r.coords.y, r.coords.z]
            .into_iter()
            .flatten()
            .any(|v| !v.is_finite())
    }) {
        return Err(format!(
            "object {} has non-finite coordinates",
            record.object_id
        ));
    }
    if let Some(record) = input
        .annotations
        .iter()
        .find(|r| !r.base_measurement_value.is_finite())
    {
        return Err(format!(
            "annotation {} has non-finite measurement {}",
            record.object_id, record.base_measurement_value
        ));
    }
    Ok(())
}
