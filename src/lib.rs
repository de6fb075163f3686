//! Region aggregation and spatial distributions of objects detected in
//! atlas-registered brain sections.
//!
//! Objects (cells, fibers, boutons) and region annotations exported per
//! animal are resolved onto a hierarchical atlas through a fusion, blacklist
//! and leaves-list policy, then aggregated into per-region statistics and
//! binned into per-axis spatial distributions.

pub mod algorithm;
pub mod atlas;
pub mod classify;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod export;
pub mod loader;
pub mod models;
pub mod policy;
pub mod utils;

// Re-export the most common types for easier use
// Core types
pub use atlas::{AtlasNode, AtlasTree, StructureRecord};
pub use config::{DistributionConfig, HemisphereConfig, QuantConfig};
pub use context::QuantContext;
pub use diagnostics::{Diagnostics, DropReason};
pub use error::{QuantError, Result};

// Records and output rows
pub use models::{
    AnimalInput, AnnotationRecord, Axis, AxisDistribution, Coordinates, CoordinateRow,
    DistributionBin, Hemisphere, ObjectRecord, RegionStat,
};

// Processing
pub use algorithm::{
    AnimalOutput, CombineOptions, CombinedOutput, empty_bin_value, process_animal,
    process_animals, summarize_distributions, summarize_regions,
};
pub use loader::{AnimalLoader, InMemoryLoader, JsonDirLoader};

// Arrow types
pub use arrow::record_batch::RecordBatch;
