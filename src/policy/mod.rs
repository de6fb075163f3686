//! Region resolution policy
//!
//! Maps each raw region annotation to exactly one reported region, or
//! excludes it, according to the configured fusion rules, blacklist and
//! leaves list.

pub mod blacklist;
pub mod fusion;
pub mod resolver;

pub use blacklist::Blacklist;
pub use fusion::{FusionRule, FusionTable};
pub use resolver::{RegionCache, RegionPolicy, Resolution};
