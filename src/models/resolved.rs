//! Records after region resolution and classification
//!
//! These carry the canonical region, hemisphere and channel of a raw record;
//! several raw records may collapse onto the same region key.

use std::sync::Arc;

use super::types::{Coordinates, Hemisphere};

/// Output region a raw atlas region resolves to
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRegion {
    /// Reported acronym (atlas acronym or fusion destination)
    pub acronym: String,
    /// Atlas id, `None` for fusion destinations absent from the atlas
    pub node_id: Option<u32>,
    /// Volume used for density normalization, `None` when unknown
    pub volume_mm3: Option<f64>,
    /// Whether the region comes from a fusion rule
    pub fused: bool,
}

/// A detected object with its resolved region, hemisphere and channel
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedObject {
    /// Object identifier
    pub object_id: String,
    /// Canonical region
    pub region: Arc<CanonicalRegion>,
    /// Hemisphere label (after ipsi/contra relabelling)
    pub hemisphere: Hemisphere,
    /// Canonical channel name
    pub channel: String,
    /// Atlas coordinates in microns
    pub coords: Coordinates,
    /// Length for line objects
    pub length_um: Option<f64>,
}

/// An annotation row with its resolved region and hemisphere
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAnnotation {
    /// Annotation identifier, shared by rows describing the same polygon
    pub annotation_id: String,
    /// Canonical region
    pub region: Arc<CanonicalRegion>,
    /// Hemisphere label (after ipsi/contra relabelling)
    pub hemisphere: Hemisphere,
    /// Canonical channel of the measurement, if the row carries one
    pub channel: Option<String>,
    /// Polygon area in square microns
    pub area_um2: Option<f64>,
    /// Upstream measurement value
    pub value: f64,
}
