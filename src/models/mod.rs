//! Domain models
//!
//! Input records as exported per animal, their resolved form, and the output
//! tables produced by the aggregation and distribution passes.

pub mod output;
pub mod records;
pub mod resolved;
pub mod types;

pub use output::{AxisDistribution, CoordinateRow, DistributionBin, RegionStat};
pub use records::{AnimalInput, AnnotationRecord, ObjectRecord};
pub use resolved::{CanonicalRegion, ResolvedAnnotation, ResolvedObject};
pub use types::{Axis, Coordinates, Hemisphere};
