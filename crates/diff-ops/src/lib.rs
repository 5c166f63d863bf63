pub mod aggregate;
pub mod boolean;
pub mod collect;
pub mod fault;
pub mod kernel_ext;
pub mod report;
pub mod significance;
pub mod types;

pub use aggregate::ShapeAggregator;
pub use boolean::{BooleanDiffEngine, BooleanKind, DiffComputation, Normalized, OpOutcome};
pub use collect::{collect, collect_detailed, CollectionSummary};
pub use fault::{FaultClass, FaultPolicy};
pub use report::{build_report, report, CategoryVolumes, DiffReport};
pub use significance::{filter, is_significant, significant_volume};
pub use types::*;
