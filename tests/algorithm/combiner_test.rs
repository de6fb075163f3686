//! Tests for multi-animal combination and summaries

#[path = "../utils/mod.rs"]
mod utils;

use atlasquant::{
    AnimalInput, Axis, CombineOptions, DistributionConfig, Hemisphere, InMemoryLoader, QuantError,
    process_animal, process_animals, summarize_regions,
};
use utils::{approx_eq, base_config, cell, context, left, two_animals};

#[test]
fn test_concatenation_matches_per_animal_runs() {
    let ctx = context(base_config().with_fusion(&["MDRNv", "MDRNd"], "MDRN"));
    let inputs = two_animals();
    let loader = InMemoryLoader::new(inputs.clone());

    let combined = process_animals(&ctx, &loader, &["mouse0", "mouse1"], CombineOptions::default()).unwrap();

    let a = process_animal(&ctx, &inputs[0]).unwrap();
    let b = process_animal(&ctx, &inputs[1]).unwrap();

    let expected_regions: Vec<_> = a.regions.iter().chain(&b.regions).cloned().collect();
    assert_eq!(combined.regions, expected_regions);

    let expected_coordinates: Vec<_> = a.coordinates.iter().chain(&b.coordinates).cloned().collect();
    assert_eq!(combined.coordinates, expected_coordinates);

    for axis in Axis::ALL {
        let expected: Vec<_> = a
            .distributions
            .iter()
            .chain(&b.distributions)
            .filter(|d| d.axis == axis)
            .flat_map(|d| d.bins.iter().cloned())
            .collect();
        assert_eq!(combined.distribution(axis).unwrap().bins, expected);
    }

    let ids: Vec<&str> = combined.diagnostics.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["mouse0", "mouse1"]);
    assert!(combined.regions[..a.regions.len()].iter().all(|r| r.animal_id == "mouse0"));
    assert!(combined.regions[a.regions.len()..].iter().all(|r| r.animal_id == "mouse1"));
}

#[test]
fn test_caller_order_is_preserved() {
    let ctx = context(base_config());
    let loader = InMemoryLoader::new(two_animals());

    let combined = process_animals(&ctx, &loader, &["mouse1", "mouse0"], CombineOptions::default()).unwrap();
    assert_eq!(combined.regions.first().unwrap().animal_id, "mouse1");
    assert_eq!(combined.regions.last().unwrap().animal_id, "mouse0");
}

#[test]
fn test_parallel_matches_sequential() {
    let ctx = context(base_config());
    let mut inputs = two_animals();
    for i in 2..6 {
        let animal = format!("mouse{i}");
        inputs.push(AnimalInput::new(&animal).with_objects(vec![
            cell("c0", &animal, "CB", "marker1", left(i as f64 * 10.0, 0.0)),
            cell("c1", &animal, "CB", "marker2", left(i as f64 * 25.0, 0.0)),
        ]));
    }
    let animals: Vec<String> = inputs.iter().map(|i| i.animal_id.clone()).collect();
    let loader = InMemoryLoader::new(inputs);

    let sequential = process_animals(&ctx, &loader, &animals, CombineOptions::default()).unwrap();
    let parallel = process_animals(
        &ctx,
        &loader,
        &animals,
        CombineOptions::default().with_parallel(true),
    )
    .unwrap();

    assert_eq!(sequential.regions, parallel.regions);
    assert_eq!(sequential.distributions, parallel.distributions);
    assert_eq!(sequential.coordinates, parallel.coordinates);
}

#[test]
fn test_failure_aborts_by_default() {
    let ctx = context(base_config());
    let loader = InMemoryLoader::new(two_animals());

    let err = process_animals(&ctx, &loader, &["mouse0", "mouse9", "mouse1"], CombineOptions::default())
        .unwrap_err();
    assert!(matches!(err, QuantError::AnimalProcessingFailure { .. }));
    assert_eq!(err.animal(), Some("mouse9"));
}

#[test]
fn test_continue_on_error_collects_failures() {
    let ctx = context(base_config());
    let mut inputs = two_animals();
    inputs.push(
        AnimalInput::new("mouse2")
            .with_objects(vec![cell("c0", "mouse3", "CB", "marker1", left(0.0, 0.0))]),
    );
    let loader = InMemoryLoader::new(inputs);

    for parallel in [false, true] {
        let options = CombineOptions::default()
            .with_continue_on_error(true)
            .with_parallel(parallel);
        let combined = process_animals(&ctx, &loader, &["mouse0", "mouse2", "mouse9", "mouse1"], options)
            .unwrap();

        let failed: Vec<&str> = combined.failures.iter().map(|f| f.animal_id.as_str()).collect();
        assert_eq!(failed, vec!["mouse2", "mouse9"]);
        assert!(matches!(
            combined.failures[1].error,
            QuantError::AnimalProcessingFailure { .. }
        ));
        assert_eq!(combined.diagnostics.len(), 2);
        assert!(combined
            .regions
            .iter()
            .all(|r| r.animal_id == "mouse0" || r.animal_id == "mouse1"));
    }
}

#[test]
fn test_region_summary() {
    let ctx = context(base_config());
    let loader = InMemoryLoader::new(two_animals());
    let combined = process_animals(&ctx, &loader, &["mouse0", "mouse1"], CombineOptions::default()).unwrap();

    let summary = summarize_regions(&combined.regions);
    let cb = summary
        .iter()
        .find(|s| s.region == "CB" && s.hemisphere == Hemisphere::Left && s.channel == "egfp")
        .unwrap();
    assert_eq!(cb.n_animals, 2);
    assert!(approx_eq(cb.count_mean, 2.0));
    assert!(approx_eq(cb.count_sem, 0.0));
    assert!(approx_eq(cb.density_mean, 0.4));

    // Keys appear once, in first-occurrence order
    assert_eq!(summary.len(), combined.regions.len() / 2);
    assert_eq!(summary[0].region, combined.regions[0].region);
}

#[test]
fn test_distribution_summary_aligns_bins() {
    let ctx = context(base_config());
    let loader = InMemoryLoader::new(two_animals());
    let combined = process_animals(&ctx, &loader, &["mouse0", "mouse1"], CombineOptions::default()).unwrap();

    let summary = combined.distribution_summary(Axis::Ap, ctx.config());
    assert!(!summary.is_empty());
    for bin in &summary {
        assert!((bin.bin_start / 100.0).fract().abs() < 1e-9);
        // Bins one animal lacks count as empty for it
        assert_eq!(bin.n_animals, 2);
    }
    let total: f64 = summary
        .iter()
        .filter(|b| b.channel == "egfp")
        .map(|b| b.mean * b.n_animals as f64)
        .sum();
    // three egfp cells per animal
    assert!(approx_eq(total, 6.0));
}

#[test]
fn test_distribution_summary_averages_over_all_animals() {
    let ctx = context(base_config().with_distributions(
        DistributionConfig::default()
            .with_axes(&[Axis::Ap])
            .with_bin_width(Axis::Ap, 100.0),
    ));
    let inputs = vec![
        AnimalInput::new("a").with_objects(vec![cell("c0", "a", "CB", "marker1", left(50.0, 0.0))]),
        AnimalInput::new("b").with_objects(vec![
            cell("c0", "b", "CB", "marker1", left(50.0, 0.0)),
            cell("c1", "b", "CB", "marker1", left(550.0, 0.0)),
        ]),
        AnimalInput::new("c"),
    ];
    let loader = InMemoryLoader::new(inputs);
    let combined = process_animals(&ctx, &loader, &["a", "b", "c"], CombineOptions::default()).unwrap();
    assert_eq!(combined.animal_ids(), vec!["a", "b", "c"]);

    let summary = combined.distribution_summary(Axis::Ap, ctx.config());
    let egfp_left = |start: f64| {
        summary
            .iter()
            .find(|b| b.channel == "egfp" && b.hemisphere == Hemisphere::Left && b.bin_start == start)
            .unwrap()
    };
    assert_eq!(egfp_left(0.0).n_animals, 3);
    assert!(approx_eq(egfp_left(0.0).mean, 2.0 / 3.0));
    assert_eq!(egfp_left(500.0).n_animals, 3);
    assert!(approx_eq(egfp_left(500.0).mean, 1.0 / 3.0));
    assert!(summary
        .iter()
        .filter(|b| b.channel == "tdtomato")
        .all(|b| b.mean == 0.0 && b.n_animals == 3));

    assert!(combined.distribution_summary(Axis::Dv, ctx.config()).is_empty());
}
