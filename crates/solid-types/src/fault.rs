use serde::{Deserialize, Serialize};

/// Kernel-independent classification of a geometry kernel failure.
///
/// Backends map their own error conditions onto these kinds. Whether a kind
/// is recoverable is decided by the diff layer's fault policy, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// The bounding region of an operand is empty or degenerate.
    VoidBoundingBox,
    /// The kernel refused to modify a shape it treats as immutable.
    ImmutableShape,
    /// Shape identity/hashing disagreed between operands.
    HasherMismatch,
    /// An operand resolved to a null shape inside the kernel.
    NullShape,
    /// The boolean solver gave up without a more specific reason.
    BooleanFailed,
    /// A handle did not resolve to a stored shape.
    EntityNotFound,
    /// The backend does not implement the requested capability.
    NotSupported,
    /// Anything else.
    Other,
}

impl FaultKind {
    /// The conditions observed to be transient geometry issues rather than
    /// real failures of the comparison.
    pub const TRANSIENT: [FaultKind; 4] = [
        FaultKind::VoidBoundingBox,
        FaultKind::ImmutableShape,
        FaultKind::HasherMismatch,
        FaultKind::NullShape,
    ];
}

impl std::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FaultKind::VoidBoundingBox => "void bounding box",
            FaultKind::ImmutableShape => "immutable shape",
            FaultKind::HasherMismatch => "hasher mismatch",
            FaultKind::NullShape => "null shape",
            FaultKind::BooleanFailed => "boolean failed",
            FaultKind::EntityNotFound => "entity not found",
            FaultKind::NotSupported => "not supported",
            FaultKind::Other => "other",
        };
        f.write_str(s)
    }
}
