//! Animal input loading
//!
//! Reading annotation tool exports is a collaborator concern; the combiner
//! only sees the [`AnimalLoader`] trait. Two implementations are provided: an
//! in-memory map for callers that already hold the records, and a loader for
//! a directory of per-animal JSON files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::error::util::{safe_read_to_string, validate_directory};
use crate::error::{QuantError, Result};
use crate::models::{AnimalInput, AnnotationRecord, Coordinates, Hemisphere, ObjectRecord};
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Source of per-animal records
pub trait AnimalLoader {
    /// Load every record of one animal
    ///
    /// # Errors
    ///
    /// Returns an error if the animal's input is missing or malformed.
    fn load(&self, animal_id: &str) -> Result<AnimalInput>;
}

/// Loader over inputs already in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryLoader {
    animals: FxHashMap<String, AnimalInput>,
}

impl InMemoryLoader {
    /// Create a loader from a list of inputs, keyed by their animal id
    #[must_use]
    pub fn new(inputs: Vec<AnimalInput>) -> Self {
        let animals = inputs
            .into_iter()
            .map(|input| (input.animal_id.clone(), input))
            .collect();
        Self { animals }
    }

    /// Add or replace an animal
    pub fn insert(&mut self, input: AnimalInput) {
        self.animals.insert(input.animal_id.clone(), input);
    }

    /// Number of animals held
    #[must_use]
    pub fn len(&self) -> usize {
        self.animals.len()
    }

    /// Whether no animal is held
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.animals.is_empty()
    }
}

impl AnimalLoader for InMemoryLoader {
    fn load(&self, animal_id: &str) -> Result<AnimalInput> {
        self.animals
            .get(animal_id)
            .cloned()
            .ok_or_else(|| QuantError::MissingInput(format!("no input for animal {animal_id}")))
    }
}

/// Injection site file content
#[derive(Debug, Default, Deserialize)]
struct InjectionFile {
    #[serde(default)]
    sites: BTreeMap<String, Coordinates>,
    #[serde(default)]
    hemisphere: Option<Hemisphere>,
}

/// Loader over a directory of per-animal JSON files
///
/// For an animal `mouse0` the directory holds:
/// - `mouse0_annotations.json`: array of annotation records
/// - `mouse0_detections.json`: array of object records
/// - `mouse0_injection.json` (optional): `{"sites": {channel: {x, y, z}}, "hemisphere": "left"}`
#[derive(Debug, Clone)]
pub struct JsonDirLoader {
    dir: PathBuf,
}

impl JsonDirLoader {
    /// Create a loader over an existing directory
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        validate_directory(&dir, "animal inputs")?;
        Ok(Self { dir })
    }

    /// Directory the files are read from
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, animal_id: &str, suffix: &str) -> PathBuf {
        self.dir.join(format!("{animal_id}_{suffix}.json"))
    }
}

impl AnimalLoader for JsonDirLoader {
    fn load(&self, animal_id: &str) -> Result<AnimalInput> {
        let start = Instant::now();
        log_operation_start("Loading animal inputs from", &self.dir);

        let annotations_path = self.path(animal_id, "annotations");
        let annotations: Vec<AnnotationRecord> =
            serde_json::from_str(&safe_read_to_string(&annotations_path, "region annotations")?)?;

        let detections_path = self.path(animal_id, "detections");
        let objects: Vec<ObjectRecord> =
            serde_json::from_str(&safe_read_to_string(&detections_path, "object detections")?)?;

        let injection_path = self.path(animal_id, "injection");
        let injection = if injection_path.is_file() {
            serde_json::from_str(&safe_read_to_string(&injection_path, "injection sites")?)?
        } else {
            log::debug!("No injection file for animal {animal_id}");
            InjectionFile::default()
        };

        log_operation_complete(
            "loaded",
            &self.dir,
            annotations.len() + objects.len(),
            Some(start.elapsed()),
        );

        Ok(AnimalInput {
            animal_id: animal_id.to_string(),
            annotations,
            objects,
            injection_sites: injection.sites,
            injection_hemisphere: injection.hemisphere,
        })
    }
}
