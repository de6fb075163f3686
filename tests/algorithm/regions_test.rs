//! Tests for per-animal region aggregation

#[path = "../utils/mod.rs"]
mod utils;

use std::collections::HashSet;

use atlasquant::config::{CountSource, MeasurementKind, NanPolicy, NormalizationMode};
use atlasquant::{
    AnimalInput, AnnotationRecord, Coordinates, DistributionConfig, DropReason, Hemisphere,
    HemisphereConfig, ObjectRecord, QuantConfig, QuantError, RegionStat, process_animal,
};
use utils::{approx_eq, base_config, cell, context, covered, left, right, two_animals};

fn config() -> QuantConfig {
    base_config().with_distributions(DistributionConfig::disabled())
}

fn row<'a>(rows: &'a [RegionStat], region: &str, hemisphere: Hemisphere, channel: &str) -> &'a RegionStat {
    rows.iter()
        .find(|r| r.region == region && r.hemisphere == hemisphere && r.channel == channel)
        .unwrap_or_else(|| panic!("no row for {region} {hemisphere} {channel}"))
}

#[test]
fn test_two_cells_in_cerebellum() {
    let ctx = context(config());
    let input = AnimalInput::new("mouse0")
        .with_annotations(vec![covered("a0", "mouse0", "CB", "Left")])
        .with_objects(vec![
            cell("c0", "mouse0", "CB", "marker1", left(100.0, 100.0)),
            cell("c1", "mouse0", "CB", "marker1", left(200.0, 100.0)),
        ]);

    let output = process_animal(&ctx, &input).unwrap();
    let cb = row(&output.regions, "CB", Hemisphere::Left, "egfp");
    assert_eq!(cb.animal_id, "mouse0");
    assert_eq!(cb.count, 2);
    assert!(approx_eq(cb.density, 0.4));
    assert_eq!(cb.volume_mm3, Some(5.0));
    assert!(approx_eq(cb.relative_count, 1.0));
    assert!(cb.normalized_density.is_none());

    let other = row(&output.regions, "CB", Hemisphere::Left, "tdtomato");
    assert_eq!(other.count, 0);
    assert_eq!(other.density, 0.0);
    assert_eq!(output.regions.len(), 2);
}

#[test]
fn test_fused_medulla() {
    let ctx = context(config().with_fusion(&["MDRNv", "MDRNd"], "MDRN"));
    let input = AnimalInput::new("mouse0")
        .with_objects(vec![
            cell("c0", "mouse0", "MDRNv", "marker1", left(0.0, 0.0)),
            cell("c1", "mouse0", "MDRNd", "marker1", left(0.0, 0.0)),
        ]);

    let output = process_animal(&ctx, &input).unwrap();
    let egfp: Vec<&RegionStat> = output.regions.iter().filter(|r| r.channel == "egfp").collect();
    assert_eq!(egfp.len(), 1);
    assert_eq!(egfp[0].region, "MDRN");
    assert_eq!(egfp[0].count, 2);
    assert_eq!(egfp[0].volume_mm3, Some(5.0));
    assert!(approx_eq(egfp[0].density, 2.0 / 5.0));
}

#[test]
fn test_fused_region_independent_of_annotation_order() {
    let ctx = context(config().with_fusion(&["MDRNv", "MDRNd"], "MDRN"));
    let objects = vec![
        cell("c0", "mouse0", "MDRNv", "marker1", left(0.0, 0.0)),
        cell("c1", "mouse0", "MDRNd", "marker1", left(0.0, 0.0)),
    ];
    let mut outputs = Vec::new();
    for regions in [["MDRN", "MDRNv"], ["MDRNv", "MDRN"]] {
        let input = AnimalInput::new("mouse0")
            .with_annotations(vec![
                covered("a0", "mouse0", regions[0], "Left"),
                covered("a1", "mouse0", regions[1], "Left"),
            ])
            .with_objects(objects.clone());
        let output = process_animal(&ctx, &input).unwrap();
        let mdrn = row(&output.regions, "MDRN", Hemisphere::Left, "egfp");
        assert_eq!(mdrn.count, 2);
        assert_eq!(mdrn.volume_mm3, Some(5.0));
        assert!(approx_eq(mdrn.density, 0.4));
        outputs.push(output.regions);
    }
    assert_eq!(outputs[0], outputs[1]);
}

#[test]
fn test_density_invariant() {
    let ctx = context(config());
    let input = AnimalInput::new("mouse0").with_objects(vec![
        cell("c0", "mouse0", "CB", "marker1", left(0.0, 0.0)),
        cell("c1", "mouse0", "MDRN", "marker1", left(0.0, 0.0)),
        cell("c2", "mouse0", "MOp", "marker2", right(0.0, 0.0)),
        cell("c3", "mouse0", "MOp", "marker2", right(0.0, 0.0)),
        cell("c4", "mouse0", "MOp", "marker1", left(0.0, 0.0)),
    ]);

    let output = process_animal(&ctx, &input).unwrap();
    for row in &output.regions {
        match row.volume_mm3 {
            Some(volume) if volume > 0.0 => {
                assert!(approx_eq(row.density, row.count as f64 / volume));
            }
            _ => assert!(row.density.is_nan(), "{} should have NaN density", row.region),
        }
    }
    assert!(output.diagnostics.missing_volumes.contains("MDRN"));
}

#[test]
fn test_unique_keys_and_first_occurrence_order() {
    let ctx = context(config());
    let input = &two_animals()[0];
    let output = process_animal(&ctx, input).unwrap();

    let keys: Vec<(String, Hemisphere, String)> = output
        .regions
        .iter()
        .map(|r| (r.region.clone(), r.hemisphere, r.channel.clone()))
        .collect();
    let unique: HashSet<_> = keys.iter().cloned().collect();
    assert_eq!(unique.len(), keys.len());

    let order: Vec<(&str, Hemisphere)> = output
        .regions
        .iter()
        .filter(|r| r.channel == "egfp")
        .map(|r| (r.region.as_str(), r.hemisphere))
        .collect();
    assert_eq!(
        order,
        vec![
            ("CB", Hemisphere::Left),
            ("CB", Hemisphere::Right),
            ("MOp", Hemisphere::Left)
        ]
    );
}

#[test]
fn test_rows_only_for_annotated_regions() {
    let ctx = context(config());
    let input = AnimalInput::new("mouse0")
        .with_annotations(vec![covered("a0", "mouse0", "CB", "Left")])
        .with_objects(vec![
            cell("c0", "mouse0", "CB", "marker1", left(0.0, 0.0)),
            cell("c1", "mouse0", "MOp", "marker1", left(0.0, 0.0)),
            cell("c2", "mouse0", "CB", "marker1", right(0.0, 0.0)),
        ]);

    let output = process_animal(&ctx, &input).unwrap();
    assert!(output.regions.iter().all(|r| r.region == "CB" && r.hemisphere == Hemisphere::Left));
    assert_eq!(output.diagnostics.count(DropReason::UncoveredRegion), 2);
}

#[test]
fn test_annotation_without_side_covers_both_sides() {
    let ctx = context(config());
    let input = AnimalInput::new("mouse0")
        .with_annotations(vec![AnnotationRecord::new("a0", "mouse0", "CB")])
        .with_objects(vec![
            cell("c0", "mouse0", "CB", "marker1", left(0.0, 0.0)),
            cell("c1", "mouse0", "CB", "marker1", right(0.0, 0.0)),
            cell("c2", "mouse0", "MOp", "marker1", left(0.0, 0.0)),
        ]);

    let output = process_animal(&ctx, &input).unwrap();
    assert!(output.regions.iter().all(|r| r.region == "CB"));
    assert_eq!(row(&output.regions, "CB", Hemisphere::Left, "egfp").count, 1);
    assert_eq!(row(&output.regions, "CB", Hemisphere::Right, "egfp").count, 1);
    assert_eq!(output.diagnostics.count(DropReason::UncoveredRegion), 1);
    assert_eq!(output.diagnostics.count(DropReason::MissingHemisphere), 0);
}

#[test]
fn test_no_usable_annotation_covers_nothing() {
    let ctx = context(config());
    let input = AnimalInput::new("mouse0")
        .with_annotations(vec![covered("a0", "mouse0", "CB", "Left").with_roi_type("Rectangle")])
        .with_objects(vec![
            cell("c0", "mouse0", "CB", "marker1", left(0.0, 0.0)),
            cell("c1", "mouse0", "MOp", "marker2", left(0.0, 0.0)),
        ]);

    let output = process_animal(&ctx, &input).unwrap();
    assert!(output.regions.is_empty());
    assert_eq!(output.diagnostics.count(DropReason::ExcludedRoi), 1);
    assert_eq!(output.diagnostics.count(DropReason::UncoveredRegion), 2);
}

#[test]
fn test_blacklisted_regions_never_reported() {
    let ctx = context(config().with_blacklisted("MO"));
    let input = AnimalInput::new("mouse0")
        .with_annotations(vec![
            covered("a0", "mouse0", "MOp", "Left"),
            covered("a1", "mouse0", "CB", "Left"),
        ])
        .with_objects(vec![
            cell("c0", "mouse0", "MOp", "marker1", left(0.0, 0.0)),
            cell("c1", "mouse0", "MOs", "marker1", left(0.0, 0.0)),
            cell("c2", "mouse0", "CB", "marker1", left(0.0, 0.0)),
        ]);

    let output = process_animal(&ctx, &input).unwrap();
    let blacklisted = ["MO", "MOp", "MOs"];
    assert!(output.regions.iter().all(|r| !blacklisted.contains(&r.region.as_str())));
    // one annotation and two objects
    assert_eq!(output.diagnostics.count(DropReason::Blacklisted), 3);
    assert_eq!(output.coordinates.len(), 1);
}

#[test]
fn test_record_level_drops_are_tallied() {
    let ctx = context(config());
    let input = AnimalInput::new("mouse0").with_objects(vec![
        cell("c0", "mouse0", "CB", "marker1", left(0.0, 0.0)),
        cell("c1", "mouse0", "XYZ", "marker1", left(0.0, 0.0)),
        cell("c2", "mouse0", "CB", "marker9", left(0.0, 0.0)),
        ObjectRecord::new("c3", "mouse0", "CB", "Fibers: marker1", left(0.0, 0.0)),
        cell("c4", "mouse0", "CB", "marker1", Coordinates::missing()),
    ]);

    let output = process_animal(&ctx, &input).unwrap();
    let diagnostics = &output.diagnostics;
    assert_eq!(diagnostics.count(DropReason::UnresolvedRegion), 1);
    assert_eq!(diagnostics.count(DropReason::UnknownChannel), 1);
    assert_eq!(diagnostics.count(DropReason::WrongObjectType), 1);
    assert_eq!(diagnostics.count(DropReason::MissingHemisphere), 1);
    assert!(diagnostics.unresolved_regions.contains("XYZ"));
    assert!(diagnostics.unknown_channels.contains("marker9"));
    assert_eq!(row(&output.regions, "CB", Hemisphere::Left, "egfp").count, 1);
}

#[test]
fn test_excluded_roi_types() {
    let ctx = context(config());
    let input = AnimalInput::new("mouse0")
        .with_annotations(vec![
            covered("a0", "mouse0", "CB", "Left"),
            covered("a1", "mouse0", "MOp", "Left").with_roi_type("Rectangle"),
        ])
        .with_objects(vec![cell("c0", "mouse0", "CB", "marker1", left(0.0, 0.0))]);

    let output = process_animal(&ctx, &input).unwrap();
    assert!(output.regions.iter().all(|r| r.region == "CB"));
    assert_eq!(output.diagnostics.count(DropReason::ExcludedRoi), 1);
}

#[test]
fn test_reference_channel_normalization() {
    let ctx = context(config().with_reference_channel("egfp"));
    let input = AnimalInput::new("mouse0")
        .with_annotations(vec![
            covered("a0", "mouse0", "CB", "Left"),
            covered("a1", "mouse0", "MOp", "Left"),
        ])
        .with_objects(vec![
            cell("c0", "mouse0", "CB", "marker1", left(0.0, 0.0)),
            cell("c1", "mouse0", "CB", "marker1", left(0.0, 0.0)),
            cell("c2", "mouse0", "CB", "marker2", left(0.0, 0.0)),
            cell("c3", "mouse0", "MOp", "marker2", left(0.0, 0.0)),
        ]);

    let output = process_animal(&ctx, &input).unwrap();
    let cb = row(&output.regions, "CB", Hemisphere::Left, "tdtomato");
    assert!(approx_eq(cb.normalized_density.unwrap(), 0.5));
    let cb_ref = row(&output.regions, "CB", Hemisphere::Left, "egfp");
    assert!(approx_eq(cb_ref.normalized_density.unwrap(), 1.0));

    // No reference cell in MOp: the ratio is undefined
    let mop = row(&output.regions, "MOp", Hemisphere::Left, "tdtomato");
    assert!(mop.normalized_density.unwrap().is_nan());

    let ctx = context(
        config()
            .with_reference_channel("egfp")
            .with_zero_reference(NanPolicy::Zero),
    );
    let output = process_animal(&ctx, &input).unwrap();
    let mop = row(&output.regions, "MOp", Hemisphere::Left, "tdtomato");
    assert_eq!(mop.normalized_density, Some(0.0));
}

#[test]
fn test_relative_columns() {
    let ctx = context(config());
    let input = AnimalInput::new("mouse0").with_objects(vec![
        cell("c0", "mouse0", "CB", "marker1", left(0.0, 0.0)),
        cell("c1", "mouse0", "MOp", "marker1", left(0.0, 0.0)),
        cell("c2", "mouse0", "MOp", "marker1", left(0.0, 0.0)),
        cell("c3", "mouse0", "MOp", "marker1", left(0.0, 0.0)),
    ]);

    let output = process_animal(&ctx, &input).unwrap();
    let cb = row(&output.regions, "CB", Hemisphere::Left, "egfp");
    let mop = row(&output.regions, "MOp", Hemisphere::Left, "egfp");
    assert!(approx_eq(cb.relative_count, 0.25));
    assert!(approx_eq(mop.relative_count, 0.75));
    // densities 1/5 and 3/10
    assert!(approx_eq(cb.relative_density, 0.2 / 0.5));
    assert!(approx_eq(mop.relative_density, 0.3 / 0.5));
}

#[test]
fn test_fiber_length_density() {
    let config = QuantConfig::new("Fibers")
        .with_channel("marker1", "egfp")
        .with_measurement(MeasurementKind::Length)
        .with_distributions(DistributionConfig::disabled());
    let ctx = context(config);
    let input = AnimalInput::new("mouse0").with_objects(vec![
        ObjectRecord::new("f0", "mouse0", "CB", "Fibers: marker1", left(0.0, 0.0)).with_length(30.0),
        ObjectRecord::new("f1", "mouse0", "CB", "Fibers: marker1", left(0.0, 0.0)).with_length(20.0),
    ]);

    let output = process_animal(&ctx, &input).unwrap();
    let cb = row(&output.regions, "CB", Hemisphere::Left, "egfp");
    assert_eq!(cb.count, 2);
    assert!(approx_eq(cb.length_sum_um, 50.0));
    assert!(approx_eq(cb.density, 10.0));
}

#[test]
fn test_counts_from_annotations() {
    let ctx = context(config().with_count_source(CountSource::Annotations));
    let input = AnimalInput::new("mouse0").with_annotations(vec![
        AnnotationRecord::new("a0", "mouse0", "CB")
            .with_hemisphere("Left")
            .with_measurement("Cells: marker1", 7.0),
        AnnotationRecord::new("a1", "mouse0", "CB")
            .with_hemisphere("Left")
            .with_measurement("Cells: marker1", 3.0),
        AnnotationRecord::new("a2", "mouse0", "MOp")
            .with_hemisphere("Right")
            .with_measurement("Cells: marker2", 4.0),
    ]);

    let output = process_animal(&ctx, &input).unwrap();
    assert_eq!(row(&output.regions, "CB", Hemisphere::Left, "egfp").count, 10);
    assert!(approx_eq(row(&output.regions, "CB", Hemisphere::Left, "egfp").density, 2.0));
    assert_eq!(row(&output.regions, "MOp", Hemisphere::Right, "tdtomato").count, 4);
    assert_eq!(row(&output.regions, "MOp", Hemisphere::Right, "egfp").count, 0);
}

#[test]
fn test_area_normalization() {
    let ctx = context(config().with_normalization_mode(NormalizationMode::Area));
    let input = AnimalInput::new("mouse0")
        .with_annotations(vec![
            covered("a0", "mouse0", "CB", "Left").with_area(1.5e6),
            covered("a1", "mouse0", "CB", "Left").with_area(0.5e6),
        ])
        .with_objects(vec![
            cell("c0", "mouse0", "CB", "marker1", left(0.0, 0.0)),
            cell("c1", "mouse0", "CB", "marker1", left(0.0, 0.0)),
            cell("c2", "mouse0", "CB", "marker1", left(0.0, 0.0)),
        ]);

    let output = process_animal(&ctx, &input).unwrap();
    let cb = row(&output.regions, "CB", Hemisphere::Left, "egfp");
    assert_eq!(cb.area_mm2, Some(2.0));
    assert!(approx_eq(cb.density, 1.5));
}

#[test]
fn test_split_volume_by_hemisphere() {
    let mut config = config();
    config.split_volume_by_hemisphere = true;
    let ctx = context(config);
    let input = AnimalInput::new("mouse0")
        .with_objects(vec![cell("c0", "mouse0", "CB", "marker1", left(0.0, 0.0))]);

    let output = process_animal(&ctx, &input).unwrap();
    let cb = row(&output.regions, "CB", Hemisphere::Left, "egfp");
    assert_eq!(cb.volume_mm3, Some(2.5));
    assert!(approx_eq(cb.density, 0.4));
}

#[test]
fn test_merged_hemispheres() {
    let ctx = context(config().with_hemispheres(HemisphereConfig::default().merged()));
    let input = AnimalInput::new("mouse0").with_objects(vec![
        cell("c0", "mouse0", "CB", "marker1", left(0.0, 0.0)),
        cell("c1", "mouse0", "CB", "marker1", right(0.0, 0.0)),
    ]);

    let output = process_animal(&ctx, &input).unwrap();
    assert!(output.regions.iter().all(|r| r.hemisphere == Hemisphere::Both));
    assert_eq!(row(&output.regions, "CB", Hemisphere::Both, "egfp").count, 2);
}

#[test]
fn test_ipsi_contra_labels() {
    let ctx = context(config().with_hemispheres(HemisphereConfig::default().with_ipsi_contra(true)));
    let input = AnimalInput::new("mouse0")
        .with_injection_hemisphere(Hemisphere::Right)
        .with_objects(vec![
            cell("c0", "mouse0", "CB", "marker1", left(0.0, 0.0)),
            cell("c1", "mouse0", "CB", "marker1", right(0.0, 0.0)),
            cell("c2", "mouse0", "CB", "marker1", right(0.0, 0.0)),
        ]);

    let output = process_animal(&ctx, &input).unwrap();
    assert_eq!(row(&output.regions, "CB", Hemisphere::Contra, "egfp").count, 1);
    assert_eq!(row(&output.regions, "CB", Hemisphere::Ipsi, "egfp").count, 2);
}

#[test]
fn test_malformed_input_fails_the_animal() {
    let ctx = context(config());
    let input = AnimalInput::new("mouse0")
        .with_objects(vec![cell("c0", "mouse1", "CB", "marker1", left(0.0, 0.0))]);
    let err = process_animal(&ctx, &input).unwrap_err();
    assert!(matches!(err, QuantError::AnimalProcessingFailure { .. }));
    assert_eq!(err.animal(), Some("mouse0"));

    let input = AnimalInput::new("mouse0").with_objects(vec![
        cell("c0", "mouse0", "CB", "marker1", left(0.0, 0.0)).with_length(-1.0),
    ]);
    assert!(process_animal(&ctx, &input).is_err());
}

#[test]
fn test_processing_is_idempotent() {
    let ctx = context(base_config().with_fusion(&["MDRNv", "MDRNd"], "MDRN"));
    let input = &two_animals()[1];
    let first = process_animal(&ctx, input).unwrap();
    let second = process_animal(&ctx, input).unwrap();
    assert_eq!(first.regions, second.regions);
    assert_eq!(first.distributions, second.distributions);
    assert_eq!(first.coordinates, second.coordinates);
}
