//! Console output utilities
//!
//! This module provides utilities for formatted console output.

use crate::algorithm::CombinedOutput;

/// Print summary information about a combined run
pub fn print_run_summary(output: &CombinedOutput, elapsed: std::time::Duration) {
    println!(
        "Processed {} animals in {:?}",
        output.diagnostics.len(),
        elapsed
    );
    println!("Region rows: {}", output.regions.len());
    for distribution in &output.distributions {
        println!("{} bins: {}", distribution.axis, distribution.bins.len());
    }
    println!("Coordinate rows: {}", output.coordinates.len());

    let merged = output.merged_diagnostics();
    println!("Dropped records: {}", merged.total_dropped());
    for (reason, count) in &merged.dropped {
        println!("  - {reason}: {count}");
    }
    if !output.failures.is_empty() {
        println!("Failed animals:");
        for failure in &output.failures {
            println!("  - {}: {}", failure.animal_id, failure.error);
        }
    }
}
