//! Raw region to reported region
//!
//! Resolution order for one raw region:
//! 1. unknown to the atlas: excluded as unresolved
//! 2. blacklisted: excluded
//! 3. covered by a fusion rule (itself or an ancestor): the rule destination
//! 4. otherwise the region itself, or its closest ancestor in the leaves list
//!
//! A region reached in step 4 that is the destination of a fusion rule is
//! reported as the fused region, so one acronym always carries one volume.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use super::blacklist::Blacklist;
use super::fusion::{FusionRule, FusionTable};
use crate::atlas::{AtlasNode, AtlasTree};
use crate::config::{QuantConfig, VolumeFallback};
use crate::diagnostics::DropReason;
use crate::error::{QuantError, Result};
use crate::models::CanonicalRegion;

/// Outcome of resolving one raw region
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Reported region
    Resolved(Arc<CanonicalRegion>),
    /// Left out of the aggregation
    Excluded(DropReason),
}

impl Resolution {
    /// Reported region, if not excluded
    #[must_use]
    pub fn region(&self) -> Option<&CanonicalRegion> {
        match self {
            Self::Resolved(region) => Some(region),
            Self::Excluded(_) => None,
        }
    }
}

/// Fusion, blacklist and granularity policy, built once per configuration
#[derive(Debug, Clone)]
pub struct RegionPolicy {
    fusion: FusionTable,
    blacklist: Blacklist,
    leaves: Option<FxHashSet<u32>>,
    volume_fallback: VolumeFallback,
}

impl RegionPolicy {
    /// Build the policy, checking it against the atlas
    ///
    /// # Errors
    ///
    /// - [`QuantError::UnknownRegion`] if a configured region is not in the atlas
    /// - [`QuantError::ConfigurationConflict`] if a fusion destination is
    ///   blacklisted or fusion sources overlap
    pub fn build(atlas: &AtlasTree, config: &QuantConfig) -> Result<Self> {
        let fusion = FusionTable::build(atlas, &config.fusion_rules)?;
        let blacklist = Blacklist::build(atlas, &config.blacklist, config.blacklist_descendants)?;

        for rule in fusion.rules() {
            if let Some(node) = atlas.find(&rule.destination) {
                if blacklist.contains(node) {
                    return Err(QuantError::ConfigurationConflict(format!(
                        "fusion destination {} is blacklisted",
                        rule.destination
                    )));
                }
            }
            if rule.source_ids.iter().all(|&id| blacklist.contains_id(id)) {
                log::warn!(
                    "All sources of fusion {} are blacklisted, it will never be reported",
                    rule.destination
                );
            }
        }

        let leaves = match &config.leaves_list {
            Some(entries) => {
                let mut ids = FxHashSet::default();
                for entry in entries {
                    ids.insert(atlas.resolve(entry)?.id);
                }
                Some(ids)
            }
            None => None,
        };

        Ok(Self {
            fusion,
            blacklist,
            leaves,
            volume_fallback: config.volume_fallback,
        })
    }

    /// Resolve a raw region annotation
    ///
    /// This is a pure function of the raw region and the policy.
    #[must_use]
    pub fn resolve(&self, atlas: &AtlasTree, raw_region: &str) -> Resolution {
        let Some(node) = atlas.find(raw_region) else {
            return Resolution::Excluded(DropReason::UnresolvedRegion);
        };
        if self.blacklist.contains(node) {
            return Resolution::Excluded(DropReason::Blacklisted);
        }

        if let Some(rule) = self.fusion.rule_for(atlas, node) {
            return Resolution::Resolved(fused_region(atlas, rule));
        }

        let target = self.granularity_target(atlas, node);
        if self.blacklist.contains(target) {
            return Resolution::Excluded(DropReason::Blacklisted);
        }
        if let Some(rule) = self.fusion.rule_into(target) {
            return Resolution::Resolved(fused_region(atlas, rule));
        }

        Resolution::Resolved(Arc::new(CanonicalRegion {
            acronym: target.acronym.clone(),
            node_id: Some(target.id),
            volume_mm3: self.volume_of(atlas, target),
            fused: false,
        }))
    }

    fn granularity_target<'a>(&self, atlas: &'a AtlasTree, node: &'a AtlasNode) -> &'a AtlasNode {
        match &self.leaves {
            Some(leaves) => atlas
                .ancestors(node)
                .into_iter()
                .find(|n| leaves.contains(&n.id))
                .unwrap_or(node),
            None => node,
        }
    }

    fn volume_of(&self, atlas: &AtlasTree, node: &AtlasNode) -> Option<f64> {
        match atlas.volume(node) {
            Ok(volume) => Some(volume),
            Err(_) => match self.volume_fallback {
                VolumeFallback::Nan => None,
                VolumeFallback::NearestAncestor => atlas.nearest_volume(node).map(|(v, _)| v),
            },
        }
    }

    /// Resolved fusion rules
    #[must_use]
    pub fn fusion(&self) -> &FusionTable {
        &self.fusion
    }

    /// Resolved blacklist
    #[must_use]
    pub fn blacklist(&self) -> &Blacklist {
        &self.blacklist
    }
}

fn fused_region(atlas: &AtlasTree, rule: &FusionRule) -> Arc<CanonicalRegion> {
    Arc::new(CanonicalRegion {
        acronym: rule.destination.clone(),
        node_id: atlas.find(&rule.destination).map(|n| n.id),
        volume_mm3: rule.volume_mm3,
        fused: true,
    })
}

/// Memoizing front of [`RegionPolicy::resolve`] for one animal
#[derive(Debug)]
pub struct RegionCache<'a> {
    policy: &'a RegionPolicy,
    atlas: &'a AtlasTree,
    cache: FxHashMap<String, Resolution>,
}

impl<'a> RegionCache<'a> {
    /// Create an empty cache
    #[must_use]
    pub fn new(policy: &'a RegionPolicy, atlas: &'a AtlasTree) -> Self {
        Self {
            policy,
            atlas,
            cache: FxHashMap::default(),
        }
    }

    /// Resolve a raw region, reusing earlier results
    pub fn resolve(&mut self, raw_region: &str) -> Resolution {
        if let Some(resolution) = self.cache.get(raw_region) {
            return resolution.clone();
        }
        let resolution = self.policy.resolve(self.atlas, raw_region);
        self.cache
            .insert(raw_region.to_string(), resolution.clone());
        resolution
    }

    /// Number of distinct raw regions seen
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether no region has been resolved yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
