//! Arena-backed atlas tree
//!
//! Structures are stored once in a `Vec` and addressed by index. Parent links
//! are ids, the children index is built at load time, so the tree never
//! owns cyclic references and is freely shareable across threads.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::node::{AtlasNode, StructureRecord};
use crate::error::{QuantError, Result};

/// Chain of structures from a node up to the root, node first
pub type AncestorChain<'a> = SmallVec<[&'a AtlasNode; 16]>;

/// Immutable hierarchical region ontology
#[derive(Debug, Clone)]
pub struct AtlasTree {
    nodes: Vec<AtlasNode>,
    by_id: FxHashMap<u32, usize>,
    by_acronym: FxHashMap<String, usize>,
    root: usize,
}

impl AtlasTree {
    /// Build the tree from a flat list of structures
    ///
    /// # Errors
    ///
    /// Returns [`QuantError::InvalidAtlas`] if:
    /// - the list is empty
    /// - an id or acronym appears twice
    /// - a volume is negative or not finite
    /// - a parent id does not exist
    /// - there is not exactly one root
    /// - the parent links contain a cycle
    pub fn from_structures(records: Vec<StructureRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(QuantError::InvalidAtlas("ontology is empty".to_string()));
        }

        let mut nodes: Vec<AtlasNode> = Vec::with_capacity(records.len());
        let mut by_id = FxHashMap::default();
        let mut by_acronym = FxHashMap::default();

        for record in records {
            let idx = nodes.len();
            if by_id.insert(record.id, idx).is_some() {
                return Err(QuantError::InvalidAtlas(format!(
                    "duplicate structure id {}",
                    record.id
                )));
            }
            if by_acronym.insert(record.acronym.clone(), idx).is_some() {
                return Err(QuantError::InvalidAtlas(format!(
                    "duplicate structure acronym {}",
                    record.acronym
                )));
            }
            if let Some(volume) = record.volume_mm3 {
                if !volume.is_finite() || volume < 0.0 {
                    return Err(QuantError::InvalidAtlas(format!(
                        "invalid volume {volume} for {}",
                        record.acronym
                    )));
                }
            }
            nodes.push(AtlasNode::from(record));
        }

        let mut root = None;
        for idx in 0..nodes.len() {
            match nodes[idx].parent_id {
                None => {
                    if let Some(previous) = root.replace(idx) {
                        return Err(QuantError::InvalidAtlas(format!(
                            "multiple roots: {} and {}",
                            nodes[previous].acronym, nodes[idx].acronym
                        )));
                    }
                }
                Some(parent_id) => {
                    let parent_idx = *by_id.get(&parent_id).ok_or_else(|| {
                        QuantError::InvalidAtlas(format!(
                            "parent {parent_id} of {} does not exist",
                            nodes[idx].acronym
                        ))
                    })?;
                    let child_id = nodes[idx].id;
                    nodes[parent_idx].children_ids.push(child_id);
                }
            }
        }
        let root =
            root.ok_or_else(|| QuantError::InvalidAtlas("ontology has no root".to_string()))?;

        for node in &mut nodes {
            node.children_ids.sort_unstable();
        }

        let tree = Self {
            nodes,
            by_id,
            by_acronym,
            root,
        };
        tree.check_reaches_root()?;

        log::debug!(
            "Loaded atlas ontology with {} structures (root: {})",
            tree.len(),
            tree.root().acronym
        );
        Ok(tree)
    }

    /// Parse a JSON array of [`StructureRecord`] and build the tree
    pub fn from_json_str(json: &str) -> Result<Self> {
        let records: Vec<StructureRecord> = serde_json::from_str(json)?;
        Self::from_structures(records)
    }

    fn check_reaches_root(&self) -> Result<()> {
        for node in &self.nodes {
            let mut current = node;
            let mut steps = 0;
            while let Some(parent) = self.parent(current) {
                steps += 1;
                if steps > self.nodes.len() {
                    return Err(QuantError::InvalidAtlas(format!(
                        "cycle in parent links involving {}",
                        node.acronym
                    )));
                }
                current = parent;
            }
        }
        Ok(())
    }

    /// Look up a structure by acronym, or by numeric id given as text
    pub fn resolve(&self, key: &str) -> Result<&AtlasNode> {
        self.find(key)
            .ok_or_else(|| QuantError::UnknownRegion(key.trim().to_string()))
    }

    /// Look up a structure by acronym, or by numeric id given as text
    #[must_use]
    pub fn find(&self, key: &str) -> Option<&AtlasNode> {
        let key = key.trim();
        if let Some(&idx) = self.by_acronym.get(key) {
            return Some(&self.nodes[idx]);
        }
        key.parse::<u32>().ok().and_then(|id| self.get(id))
    }

    /// Look up a structure by id
    #[must_use]
    pub fn get(&self, id: u32) -> Option<&AtlasNode> {
        self.by_id.get(&id).map(|&idx| &self.nodes[idx])
    }

    /// Root structure
    #[must_use]
    pub fn root(&self) -> &AtlasNode {
        &self.nodes[self.root]
    }

    /// Number of structures
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds no structure (never true once built)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over structures in load order
    pub fn iter(&self) -> impl Iterator<Item = &AtlasNode> {
        self.nodes.iter()
    }

    /// Parent of a structure, `None` for the root
    #[must_use]
    pub fn parent(&self, node: &AtlasNode) -> Option<&AtlasNode> {
        node.parent_id.and_then(|id| self.get(id))
    }

    /// Structures from `node` (included) up to the root
    #[must_use]
    pub fn ancestors<'a>(&'a self, node: &'a AtlasNode) -> AncestorChain<'a> {
        let mut chain = AncestorChain::new();
        let mut current = Some(node);
        while let Some(n) = current {
            chain.push(n);
            current = self.parent(n);
        }
        chain
    }

    /// Whether `ancestor_id` is a strict ancestor of `node`
    #[must_use]
    pub fn is_ancestor(&self, ancestor_id: u32, node: &AtlasNode) -> bool {
        self.ancestors(node)
            .iter()
            .skip(1)
            .any(|n| n.id == ancestor_id)
    }

    /// All structures below `node`, depth first, children in id order
    #[must_use]
    pub fn descendants(&self, node: &AtlasNode) -> Vec<&AtlasNode> {
        let mut descendants = Vec::new();
        let mut to_visit: Vec<u32> = node.children_ids.iter().rev().copied().collect();

        while let Some(id) = to_visit.pop() {
            if let Some(child) = self.get(id) {
                descendants.push(child);
                to_visit.extend(child.children_ids.iter().rev().copied());
            }
        }

        descendants
    }

    /// Whether the structure has no children
    #[must_use]
    pub fn is_leaf(&self, node: &AtlasNode) -> bool {
        node.is_leaf()
    }

    /// Volume of a structure
    ///
    /// # Errors
    ///
    /// Returns [`QuantError::MissingVolume`] when the atlas does not provide
    /// one; callers fall back to [`Self::nearest_volume`] or treat the volume
    /// as unknown.
    pub fn volume(&self, node: &AtlasNode) -> Result<f64> {
        node.volume_mm3
            .ok_or_else(|| QuantError::MissingVolume(node.acronym.clone()))
    }

    /// First structure from `node` up to the root that has a volume
    #[must_use]
    pub fn nearest_volume<'a>(&'a self, node: &'a AtlasNode) -> Option<(f64, &'a AtlasNode)> {
        self.ancestors(node)
            .into_iter()
            .find_map(|n| n.volume_mm3.map(|v| (v, n)))
    }
}
