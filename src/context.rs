//! Shared processing context
//!
//! The atlas, the validated configuration and the region policy built from
//! both. Constructed once, then passed by reference to every animal; nothing
//! in it is mutated after construction, so it can be shared across threads.

use crate::atlas::AtlasTree;
use crate::config::QuantConfig;
use crate::error::Result;
use crate::policy::{RegionCache, RegionPolicy};

/// Read-only state shared by all animals of a run
#[derive(Debug, Clone)]
pub struct QuantContext {
    atlas: AtlasTree,
    config: QuantConfig,
    policy: RegionPolicy,
}

impl QuantContext {
    /// Validate the configuration against the atlas and build the region policy
    ///
    /// # Errors
    ///
    /// - [`crate::error::QuantError::InvalidConfig`] or
    ///   [`crate::error::QuantError::ConfigurationConflict`] from validation
    /// - [`crate::error::QuantError::UnknownRegion`] if a configured region is
    ///   not in the atlas
    pub fn new(atlas: AtlasTree, config: QuantConfig) -> Result<Self> {
        config.validate()?;
        let policy = RegionPolicy::build(&atlas, &config)?;
        log::debug!(
            "Built region policy: {} fusion rules, {} blacklisted structures",
            policy.fusion().rules().len(),
            policy.blacklist().len()
        );
        Ok(Self {
            atlas,
            config,
            policy,
        })
    }

    /// Atlas ontology
    #[must_use]
    pub fn atlas(&self) -> &AtlasTree {
        &self.atlas
    }

    /// Validated configuration
    #[must_use]
    pub fn config(&self) -> &QuantConfig {
        &self.config
    }

    /// Region resolution policy
    #[must_use]
    pub fn policy(&self) -> &RegionPolicy {
        &self.policy
    }

    /// Fresh resolution cache for one animal
    #[must_use]
    pub fn region_cache(&self) -> RegionCache<'_> {
        RegionCache::new(&self.policy, &self.atlas)
    }
}
