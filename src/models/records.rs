//! Input records
//!
//! Per-object (detection) and per-region (annotation) rows exported by the
//! annotation tool, and the bundle of them that makes up one animal.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::types::{Coordinates, Hemisphere};

/// One detected object (cell, fiber segment, bouton)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// Object identifier
    pub object_id: String,
    /// Animal the object belongs to
    pub animal_id: String,
    /// Image (section) the object was detected in
    #[serde(default)]
    pub image_id: String,
    /// Atlas region as annotated, acronym or numeric id
    pub raw_region: String,
    /// Classification string, `"<object_type>: <channel>"`
    pub raw_classification: String,
    /// Hemisphere as annotated, when the tool exports one
    #[serde(default)]
    pub raw_hemisphere: Option<String>,
    /// Atlas coordinates in microns
    #[serde(default)]
    pub coords: Coordinates,
    /// Length in microns for line objects
    #[serde(default)]
    pub length_um: Option<f64>,
    /// Area in square microns for polygon objects
    #[serde(default)]
    pub area_um2: Option<f64>,
}

impl ObjectRecord {
    /// Create a point object with the minimal set of fields
    #[must_use]
    pub fn new(
        object_id: &str,
        animal_id: &str,
        raw_region: &str,
        raw_classification: &str,
        coords: Coordinates,
    ) -> Self {
        Self {
            object_id: object_id.to_string(),
            animal_id: animal_id.to_string(),
            image_id: String::new(),
            raw_region: raw_region.to_string(),
            raw_classification: raw_classification.to_string(),
            raw_hemisphere: None,
            coords,
            length_um: None,
            area_um2: None,
        }
    }

    /// Set the annotated hemisphere
    #[must_use]
    pub fn with_hemisphere(mut self, hemisphere: &str) -> Self {
        self.raw_hemisphere = Some(hemisphere.to_string());
        self
    }

    /// Set the length, making this a line object
    #[must_use]
    pub fn with_length(mut self, length_um: f64) -> Self {
        self.length_um = Some(length_um);
        self
    }

    /// Set the image identifier
    #[must_use]
    pub fn with_image(mut self, image_id: &str) -> Self {
        self.image_id = image_id.to_string();
        self
    }

    /// Whether the object is a line (has a length)
    #[must_use]
    pub fn is_line(&self) -> bool {
        self.length_um.is_some()
    }
}

/// One region annotation row with its upstream measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    /// Annotation identifier
    pub object_id: String,
    /// Animal the annotation belongs to
    pub animal_id: String,
    /// Atlas region of the annotation polygon
    pub raw_region: String,
    /// Hemisphere as annotated
    #[serde(default)]
    pub raw_hemisphere: Option<String>,
    /// ROI shape reported by the annotation tool, e.g. `Polygon`
    #[serde(default)]
    pub roi_type: String,
    /// `"<object_type>: <channel>"` the measurement refers to, if any
    #[serde(default)]
    pub raw_classification: Option<String>,
    /// Annotation area in square microns
    #[serde(default)]
    pub area_um2: Option<f64>,
    /// Measurement counted by the upstream tool within the polygon
    #[serde(default)]
    pub base_measurement_value: f64,
}

impl AnnotationRecord {
    /// Create an annotation row covering a region, without measurement
    #[must_use]
    pub fn new(object_id: &str, animal_id: &str, raw_region: &str) -> Self {
        Self {
            object_id: object_id.to_string(),
            animal_id: animal_id.to_string(),
            raw_region: raw_region.to_string(),
            raw_hemisphere: None,
            roi_type: "Polygon".to_string(),
            raw_classification: None,
            area_um2: None,
            base_measurement_value: 0.0,
        }
    }

    /// Set the annotated hemisphere
    #[must_use]
    pub fn with_hemisphere(mut self, hemisphere: &str) -> Self {
        self.raw_hemisphere = Some(hemisphere.to_string());
        self
    }

    /// Attach a channel measurement
    #[must_use]
    pub fn with_measurement(mut self, classification: &str, value: f64) -> Self {
        self.raw_classification = Some(classification.to_string());
        self.base_measurement_value = value;
        self
    }

    /// Set the polygon area
    #[must_use]
    pub fn with_area(mut self, area_um2: f64) -> Self {
        self.area_um2 = Some(area_um2);
        self
    }

    /// Set the ROI type
    #[must_use]
    pub fn with_roi_type(mut self, roi_type: &str) -> Self {
        self.roi_type = roi_type.to_string();
        self
    }
}

/// Everything the pipeline needs for one animal
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimalInput {
    /// Animal identifier
    pub animal_id: String,
    /// Region annotation rows
    #[serde(default)]
    pub annotations: Vec<AnnotationRecord>,
    /// Detected objects
    #[serde(default)]
    pub objects: Vec<ObjectRecord>,
    /// Injection site per canonical channel name
    #[serde(default)]
    pub injection_sites: BTreeMap<String, Coordinates>,
    /// Hemisphere of the injection, for ipsi/contra labels
    #[serde(default)]
    pub injection_hemisphere: Option<Hemisphere>,
}

impl AnimalInput {
    /// Create an empty input for an animal
    #[must_use]
    pub fn new(animal_id: &str) -> Self {
        Self {
            animal_id: animal_id.to_string(),
            ..Self::default()
        }
    }

    /// Set the annotation rows
    #[must_use]
    pub fn with_annotations(mut self, annotations: Vec<AnnotationRecord>) -> Self {
        self.annotations = annotations;
        self
    }

    /// Set the detected objects
    #[must_use]
    pub fn with_objects(mut self, objects: Vec<ObjectRecord>) -> Self {
        self.objects = objects;
        self
    }

    /// Add an injection site for a channel
    #[must_use]
    pub fn with_injection_site(mut self, channel: &str, site: Coordinates) -> Self {
        self.injection_sites.insert(channel.to_string(), site);
        self
    }

    /// Set the injected hemisphere
    #[must_use]
    pub fn with_injection_hemisphere(mut self, hemisphere: Hemisphere) -> Self {
        self.injection_hemisphere = Some(hemisphere);
        self
    }
}
