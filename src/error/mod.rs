//! Error handling for `atlasquant`.
//!
//! Only failures that abort a configuration or an animal live here. Issues
//! affecting a single record are tallied in [`crate::diagnostics`] instead.

pub mod util;

use parquet::errors::ParquetError;

/// Specialized error type for region aggregation and distribution runs
#[derive(Debug, thiserror::Error)]
pub enum QuantError {
    /// A region acronym or id is absent from the atlas ontology
    #[error("Unknown atlas region: {0}")]
    UnknownRegion(String),

    /// The atlas carries no usable volume for this structure
    #[error("No volume available for atlas region: {0}")]
    MissingVolume(String),

    /// The ontology does not form a single rooted tree
    #[error("Invalid atlas ontology: {0}")]
    InvalidAtlas(String),

    /// The configuration describes an ambiguous resolution policy
    #[error("Configuration conflict: {0}")]
    ConfigurationConflict(String),

    /// A configuration value is out of its valid domain
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Processing of one animal failed
    #[error("Processing failed for animal '{animal}': {reason}")]
    AnimalProcessingFailure {
        /// Identifier of the failing animal
        animal: String,
        /// Human readable cause
        reason: String,
    },

    /// Input data for an animal could not be found
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// Error opening or reading a file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON input
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error writing a Parquet file
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Error converting output tables
    #[error("Export error: {0}")]
    Export(String),
}

impl QuantError {
    /// Wrap any error as a failure of the given animal.
    ///
    /// An error that already names an animal is returned unchanged.
    #[must_use]
    pub fn for_animal(self, animal: &str) -> Self {
        match self {
            Self::AnimalProcessingFailure { .. } => self,
            other => Self::AnimalProcessingFailure {
                animal: animal.to_string(),
                reason: other.to_string(),
            },
        }
    }

    /// Identifier of the failing animal, if any
    #[must_use]
    pub fn animal(&self) -> Option<&str> {
        match self {
            Self::AnimalProcessingFailure { animal, .. } => Some(animal),
            _ => None,
        }
    }
}

/// Result type for `atlasquant` operations
pub type Result<T> = std::result::Result<T, QuantError>;
