//! Multi-animal combination
//!
//! Runs the per-animal pipeline over a caller-ordered list of animals and
//! concatenates the tables. Output order always follows the caller's order,
//! whether animals are processed sequentially or in parallel.

use std::time::Instant;

use rayon::prelude::*;

use crate::algorithm::distribution::empty_bin_value;
use crate::algorithm::pipeline::{AnimalOutput, process_animal};
use crate::algorithm::summary::{BinSummary, summarize_distributions};
use crate::config::QuantConfig;
use crate::context::QuantContext;
use crate::diagnostics::Diagnostics;
use crate::error::{QuantError, Result};
use crate::loader::AnimalLoader;
use crate::models::{Axis, AxisDistribution, CoordinateRow, RegionStat};
use crate::utils::logging::{create_main_progress_bar, finish_progress_bar};

/// How a batch of animals is run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CombineOptions {
    /// Keep going when an animal fails, collecting the failure
    pub continue_on_error: bool,
    /// Process animals on the rayon thread pool
    pub parallel: bool,
    /// Show a progress bar
    pub show_progress: bool,
}

impl CombineOptions {
    /// Keep going when an animal fails
    #[must_use]
    pub fn with_continue_on_error(mut self, enabled: bool) -> Self {
        self.continue_on_error = enabled;
        self
    }

    /// Process animals in parallel
    #[must_use]
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Show a progress bar
    #[must_use]
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }
}

/// An animal skipped under `continue_on_error`
#[derive(Debug)]
pub struct AnimalFailure {
    /// Animal identifier
    pub animal_id: String,
    /// Cause of the failure
    pub error: QuantError,
}

/// Concatenated tables of a batch of animals
#[derive(Debug, Default)]
pub struct CombinedOutput {
    /// Region rows of every animal, in animal order
    pub regions: Vec<RegionStat>,
    /// One table per configured axis, bins of every animal in animal order
    pub distributions: Vec<AxisDistribution>,
    /// Coordinates of every animal, in animal order
    pub coordinates: Vec<CoordinateRow>,
    /// Diagnostics per processed animal
    pub diagnostics: Vec<(String, Diagnostics)>,
    /// Animals that failed and were skipped
    pub failures: Vec<AnimalFailure>,
}

impl CombinedOutput {
    /// Append the tables of one animal
    pub fn push(&mut self, output: AnimalOutput) {
        self.regions.extend(output.regions);
        for distribution in output.distributions {
            match self
                .distributions
                .iter_mut()
                .find(|d| d.axis == distribution.axis)
            {
                Some(existing) => existing.bins.extend(distribution.bins),
                None => self.distributions.push(distribution),
            }
        }
        self.coordinates.extend(output.coordinates);
        self.diagnostics.push((output.animal_id, output.diagnostics));
    }

    /// Distribution table of an axis, if configured
    #[must_use]
    pub fn distribution(&self, axis: Axis) -> Option<&AxisDistribution> {
        self.distributions.iter().find(|d| d.axis == axis)
    }

    /// Identifiers of the processed animals, in order
    #[must_use]
    pub fn animal_ids(&self) -> Vec<&str> {
        self.diagnostics.iter().map(|(id, _)| id.as_str()).collect()
    }

    /// Cross-animal summary of an axis, averaged over every processed animal
    #[must_use]
    pub fn distribution_summary(&self, axis: Axis, config: &QuantConfig) -> Vec<BinSummary> {
        self.distribution(axis).map_or_else(Vec::new, |distribution| {
            summarize_distributions(&distribution.bins, &self.animal_ids(), empty_bin_value(config))
        })
    }

    /// Diagnostics of all processed animals merged together
    #[must_use]
    pub fn merged_diagnostics(&self) -> Diagnostics {
        let mut merged = Diagnostics::new();
        for (_, diagnostics) in &self.diagnostics {
            merged.merge(diagnostics);
        }
        merged
    }
}

fn run_one(ctx: &QuantContext, loader: &(impl AnimalLoader + ?Sized), animal_id: &str) -> Result<AnimalOutput> {
    let input = loader.load(animal_id).map_err(|e| e.for_animal(animal_id))?;
    if input.animal_id != animal_id {
        return Err(QuantError::AnimalProcessingFailure {
            animal: animal_id.to_string(),
            reason: format!("loader returned input of animal '{}'", input.animal_id),
        });
    }
    process_animal(ctx, &input).map_err(|e| e.for_animal(animal_id))
}

/// Process animals in the given order and concatenate their tables
///
/// # Errors
///
/// Returns the first [`QuantError::AnimalProcessingFailure`] unless
/// `continue_on_error` is set, in which case failures are collected in
/// [`CombinedOutput::failures`].
pub fn process_animals<L, S>(
    ctx: &QuantContext,
    loader: &L,
    animals: &[S],
    options: CombineOptions,
) -> Result<CombinedOutput>
where
    L: AnimalLoader + Sync + ?Sized,
    S: AsRef<str> + Sync,
{
    let start = Instant::now();
    log::info!("Processing {} animals", animals.len());
    let pb = options
        .show_progress
        .then(|| create_main_progress_bar(animals.len() as u64, Some("Processing animals")));

    let mut combined = CombinedOutput::default();
    let mut record = |animal_id: &str, result: Result<AnimalOutput>| -> Result<()> {
        match result {
            Ok(output) => combined.push(output),
            Err(error) if options.continue_on_error => {
                log::warn!("Skipping animal {animal_id}: {error}");
                combined.failures.push(AnimalFailure {
                    animal_id: animal_id.to_string(),
                    error,
                });
            }
            Err(error) => return Err(error),
        }
        Ok(())
    };

    if options.parallel {
        let results: Vec<Result<AnimalOutput>> = animals
            .par_iter()
            .map(|animal| {
                let result = run_one(ctx, loader, animal.as_ref());
                if let Some(pb) = &pb {
                    pb.inc(1);
                }
                result
            })
            .collect();
        for (animal, result) in animals.iter().zip(results) {
            record(animal.as_ref(), result)?;
        }
    } else {
        for animal in animals {
            record(animal.as_ref(), run_one(ctx, loader, animal.as_ref()))?;
            if let Some(pb) = &pb {
                pb.inc(1);
            }
        }
    }

    if let Some(pb) = &pb {
        finish_progress_bar(pb, Some("Processing complete"));
    }
    log::info!(
        "Processed {} animals ({} failed) in {:?}",
        combined.diagnostics.len(),
        combined.failures.len(),
        start.elapsed()
    );
    Ok(combined)
}
