//! Blacklisted regions

use rustc_hash::FxHashSet;

use crate::atlas::{AtlasNode, AtlasTree};
use crate::error::Result;

/// Set of atlas regions excluded from every output
#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    ids: FxHashSet<u32>,
}

impl Blacklist {
    /// Resolve blacklist entries, optionally extended to their descendants
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::QuantError::UnknownRegion`] if an entry is not
    /// in the atlas.
    pub fn build(atlas: &AtlasTree, entries: &[String], include_descendants: bool) -> Result<Self> {
        let mut ids = FxHashSet::default();
        for entry in entries {
            let node = atlas.resolve(entry)?;
            ids.insert(node.id);
            if include_descendants {
                ids.extend(atlas.descendants(node).iter().map(|n| n.id));
            }
        }
        log::debug!(
            "Blacklist covers {} atlas regions from {} entries",
            ids.len(),
            entries.len()
        );
        Ok(Self { ids })
    }

    /// Whether the region is excluded
    #[must_use]
    pub fn contains(&self, node: &AtlasNode) -> bool {
        self.ids.contains(&node.id)
    }

    /// Whether the region id is excluded
    #[must_use]
    pub fn contains_id(&self, id: u32) -> bool {
        self.ids.contains(&id)
    }

    /// Number of excluded atlas regions
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing is excluded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
