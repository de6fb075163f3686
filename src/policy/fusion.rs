//! Fusion rules

use itertools::Itertools;
use rustc_hash::FxHashMap;

use crate::atlas::{AtlasNode, AtlasTree};
use crate::config::FusionRuleConfig;
use crate::error::{QuantError, Result};

/// A fusion rule with its sources resolved against the atlas
#[derive(Debug, Clone, PartialEq)]
pub struct FusionRule {
    /// Reported acronym
    pub destination: String,
    /// Atlas ids of the merged regions
    pub source_ids: Vec<u32>,
    /// Sum of the source volumes, `None` if any is unknown
    pub volume_mm3: Option<f64>,
}

/// All fusion rules of a configuration, indexed by source id
///
/// A destination that is itself an atlas structure is indexed too, so that
/// records annotated with the destination report the fused region.
#[derive(Debug, Clone, Default)]
pub struct FusionTable {
    rules: Vec<FusionRule>,
    by_source: FxHashMap<u32, usize>,
    by_destination: FxHashMap<u32, usize>,
}

impl FusionTable {
    /// Resolve the configured rules
    ///
    /// # Errors
    ///
    /// - [`QuantError::UnknownRegion`] if a source is not in the atlas
    /// - [`QuantError::ConfigurationConflict`] if a region is the source of
    ///   two rules, or a source lies below another source
    pub fn build(atlas: &AtlasTree, configs: &[FusionRuleConfig]) -> Result<Self> {
        let mut table = Self::default();

        for config in configs {
            let rule_idx = table.rules.len();
            let mut source_ids = Vec::with_capacity(config.sources.len());
            let mut volume_mm3 = Some(0.0);

            for source in &config.sources {
                let node = atlas.resolve(source)?;
                if let Some(&other) = table.by_source.get(&node.id) {
                    return Err(QuantError::ConfigurationConflict(format!(
                        "region {} is fused into both {} and {}",
                        node.acronym, table.rules[other].destination, config.destination
                    )));
                }
                table.by_source.insert(node.id, rule_idx);
                source_ids.push(node.id);

                volume_mm3 = match (volume_mm3, atlas.volume(node)) {
                    (Some(total), Ok(volume)) => Some(total + volume),
                    (_, Err(e)) => {
                        log::warn!("Fusion {}: {e}", config.destination);
                        None
                    }
                    (None, Ok(_)) => None,
                };
            }

            let destination = config.destination.trim();
            if let Some(node) = atlas.find(destination) {
                table.by_destination.insert(node.id, rule_idx);
            }
            table.rules.push(FusionRule {
                destination: destination.to_string(),
                source_ids,
                volume_mm3,
            });
        }

        table.check_nesting(atlas)?;
        Ok(table)
    }

    fn check_nesting(&self, atlas: &AtlasTree) -> Result<()> {
        let sources: Vec<(&AtlasNode, usize)> = self
            .by_source
            .iter()
            .filter_map(|(&id, &idx)| atlas.get(id).map(|node| (node, idx)))
            .sorted_by_key(|(node, _)| node.id)
            .collect();
        for &(inner, inner_idx) in &sources {
            for &(outer, outer_idx) in &sources {
                if atlas.is_ancestor(outer.id, inner) {
                    return Err(QuantError::ConfigurationConflict(format!(
                        "fusion source {} ({}) lies within fusion source {} ({})",
                        inner.acronym,
                        self.rules[inner_idx].destination,
                        outer.acronym,
                        self.rules[outer_idx].destination
                    )));
                }
            }
        }
        Ok(())
    }

    /// Rule covering `node` or one of its ancestors
    #[must_use]
    pub fn rule_for(&self, atlas: &AtlasTree, node: &AtlasNode) -> Option<&FusionRule> {
        if self.by_source.is_empty() {
            return None;
        }
        atlas
            .ancestors(node)
            .iter()
            .find_map(|n| self.by_source.get(&n.id))
            .map(|&idx| &self.rules[idx])
    }

    /// Rule whose destination is the structure `node`
    #[must_use]
    pub fn rule_into(&self, node: &AtlasNode) -> Option<&FusionRule> {
        self.by_destination.get(&node.id).map(|&idx| &self.rules[idx])
    }

    /// Resolved rules in configuration order
    #[must_use]
    pub fn rules(&self) -> &[FusionRule] {
        &self.rules
    }

    /// Whether no rule is configured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
