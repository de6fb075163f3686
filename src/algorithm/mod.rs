//! Region aggregation and spatial distribution algorithms
//!
//! The per-animal pipeline chains region resolution, classification,
//! aggregation and binning; the combiner drives it over many animals.

pub mod combiner;
pub mod distribution;
pub mod pipeline;
pub mod regions;
pub mod summary;

pub use combiner::{AnimalFailure, CombineOptions, CombinedOutput, process_animals};
pub use distribution::{BinLayout, bin_distributions, empty_bin_value};
pub use pipeline::{AnimalOutput, process_animal};
pub use regions::aggregate_regions;
pub use summary::{BinSummary, MeanSem, RegionSummary, summarize_distributions, summarize_regions};
