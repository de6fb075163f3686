//! Atlas ontology access
//!
//! Read-only view over a hierarchical brain region ontology: structures are
//! stored in an arena indexed by id, with parent ids and a children index,
//! and queried upward (ancestors) and downward (descendants).

pub mod node;
pub mod tree;

pub use node::{AtlasNode, StructureRecord};
pub use tree::{AncestorChain, AtlasTree};
