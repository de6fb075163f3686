use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, bail};
use atlasquant::algorithm::{CombineOptions, process_animals, summarize_regions};
use atlasquant::export::write_rows;
use atlasquant::utils::logging::console::print_run_summary;
use atlasquant::utils::logging::log_animal_diagnostics;
use atlasquant::{AtlasTree, JsonDirLoader, QuantConfig, QuantContext};
use log::info;

const USAGE: &str = "usage: atlasquant <config.json> <atlas.json> <input_dir> <output_dir> <animal>...";

fn read_file(path: &Path, what: &str) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {what} {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 5 {
        bail!("{USAGE}");
    }
    let config_path = PathBuf::from(&args[0]);
    let atlas_path = PathBuf::from(&args[1]);
    let input_dir = PathBuf::from(&args[2]);
    let output_dir = PathBuf::from(&args[3]);
    let animals = &args[4..];

    let config = QuantConfig::from_json_str(&read_file(&config_path, "configuration")?)
        .with_context(|| format!("Invalid configuration {}", config_path.display()))?;
    info!("{config}");
    let atlas = AtlasTree::from_json_str(&read_file(&atlas_path, "atlas ontology")?)
        .with_context(|| format!("Invalid atlas {}", atlas_path.display()))?;
    info!("Loaded atlas with {} structures", atlas.len());

    let ctx = QuantContext::new(atlas, config).context("Configuration rejected")?;
    let loader = JsonDirLoader::new(&input_dir)?;

    let start = Instant::now();
    let options = CombineOptions::default()
        .with_parallel(true)
        .with_progress(true);
    let output = process_animals(&ctx, &loader, animals, options)?;

    for (animal_id, diagnostics) in &output.diagnostics {
        log_animal_diagnostics(animal_id, diagnostics);
    }

    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    write_rows(&output_dir.join("regions.parquet"), &output.regions)?;
    write_rows(
        &output_dir.join("regions_summary.parquet"),
        &summarize_regions(&output.regions),
    )?;
    for distribution in &output.distributions {
        let name = distribution.axis.label().to_lowercase();
        write_rows(
            &output_dir.join(format!("distribution_{name}.parquet")),
            &distribution.bins,
        )?;
        write_rows(
            &output_dir.join(format!("distribution_{name}_summary.parquet")),
            &output.distribution_summary(distribution.axis, ctx.config()),
        )?;
    }
    write_rows(&output_dir.join("coordinates.parquet"), &output.coordinates)?;

    print_run_summary(&output, start.elapsed());
    Ok(())
}
