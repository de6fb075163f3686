//! Atlas structure types

use serde::{Deserialize, Serialize};

/// One structure of the ontology as supplied by the atlas provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureRecord {
    /// Numeric structure id
    pub id: u32,
    /// Short unique name, e.g. `MDRNv`
    pub acronym: String,
    /// Full structure name
    pub name: String,
    /// Parent structure id, `None` for the root
    #[serde(default)]
    pub parent_id: Option<u32>,
    /// Structure volume, when the atlas provides one
    #[serde(default)]
    pub volume_mm3: Option<f64>,
}

impl StructureRecord {
    /// Create a structure record
    #[must_use]
    pub fn new(
        id: u32,
        acronym: &str,
        name: &str,
        parent_id: Option<u32>,
        volume_mm3: Option<f64>,
    ) -> Self {
        Self {
            id,
            acronym: acronym.to_string(),
            name: name.to_string(),
            parent_id,
            volume_mm3,
        }
    }
}

/// A structure of the loaded atlas tree
#[derive(Debug, Clone, PartialEq)]
pub struct AtlasNode {
    /// Numeric structure id
    pub id: u32,
    /// Short unique name
    pub acronym: String,
    /// Full structure name
    pub name: String,
    /// Parent structure id, `None` for the root
    pub parent_id: Option<u32>,
    /// Ids of direct children, sorted
    pub children_ids: Vec<u32>,
    /// Structure volume, when known
    pub volume_mm3: Option<f64>,
}

impl AtlasNode {
    /// Whether this structure has no children
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children_ids.is_empty()
    }

    /// Whether this structure is the root of the ontology
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

impl From<StructureRecord> for AtlasNode {
    fn from(record: StructureRecord) -> Self {
        Self {
            id: record.id,
            acronym: record.acronym,
            name: record.name,
            parent_id: record.parent_id,
            children_ids: Vec::new(),
            volume_mm3: record.volume_mm3,
        }
    }
}
