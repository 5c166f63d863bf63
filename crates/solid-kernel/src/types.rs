use serde::{Deserialize, Serialize};

pub use solid_types::{FaultKind, ShapeKind};

/// Opaque handle to a shape owned by the geometry kernel.
/// Valid only for the kernel session that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SolidHandle(pub(crate) u64);

impl SolidHandle {
    pub(crate) fn id(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SolidHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A failure raised by the geometry kernel.
///
/// `kind` is the structured classification used by callers; `detail` is the
/// backend's own description and is only ever logged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("kernel fault ({kind}): {detail}")]
pub struct KernelFault {
    pub kind: FaultKind,
    pub detail: String,
}

impl KernelFault {
    pub fn new(kind: FaultKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn not_found(handle: &SolidHandle) -> Self {
        Self::new(FaultKind::EntityNotFound, format!("no shape for handle {handle}"))
    }

    pub fn null_shape(handle: &SolidHandle) -> Self {
        Self::new(FaultKind::NullShape, format!("shape {handle} is null"))
    }
}

/// Kernel operations, used for call accounting and fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KernelOp {
    Copy,
    Fuse,
    FuseAll,
    Intersect,
    Subtract,
    Members,
    RemoveSeams,
}

impl KernelOp {
    /// Whether the operation runs the boolean solver.
    pub fn is_boolean(&self) -> bool {
        matches!(
            self,
            KernelOp::Fuse | KernelOp::FuseAll | KernelOp::Intersect | KernelOp::Subtract
        )
    }
}
