use serde::{Deserialize, Serialize};

/// Structural kind of a kernel shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    /// A single solid body.
    Single,
    /// A grouping of independent solids with no boolean merging between them.
    Compound,
}

/// How a version's solids are consolidated into one comparable shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    /// Fuse all solids into one manifold volume. Touching components merge.
    #[default]
    Union,
    /// Group all solids into a compound. Every input stays traceable.
    Preservation,
}

impl std::fmt::Display for AggregationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregationMode::Union => write!(f, "union"),
            AggregationMode::Preservation => write!(f, "preservation"),
        }
    }
}

/// Which strategy actually produced an aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregateOrigin {
    /// Copy of the only input solid.
    Single,
    /// Left fold of fuse calls succeeded.
    Fused,
    /// Compound built on purpose (Preservation mode).
    Compound,
    /// Union fold faulted; compound of the original inputs.
    FallbackCompound,
}
