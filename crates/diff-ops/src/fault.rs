//! Mapping of kernel faults onto the recoverable/fatal split.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use solid_kernel::KernelFault;
use solid_types::FaultKind;

/// What the pipeline does with a failed boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultClass {
    /// The operation yields no shape; the run continues.
    Recoverable,
    /// The run aborts.
    Fatal,
}

/// The set of fault kinds treated as recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultPolicy {
    recoverable: BTreeSet<FaultKind>,
}

impl FaultPolicy {
    /// A policy under which every fault is fatal.
    pub fn strict() -> Self {
        Self {
            recoverable: BTreeSet::new(),
        }
    }

    pub fn with_recoverable(kinds: impl IntoIterator<Item = FaultKind>) -> Self {
        Self {
            recoverable: kinds.into_iter().collect(),
        }
    }

    /// Also treat `kind` as recoverable.
    pub fn allow(mut self, kind: FaultKind) -> Self {
        self.recoverable.insert(kind);
        self
    }

    pub fn is_recoverable(&self, kind: FaultKind) -> bool {
        self.recoverable.contains(&kind)
    }

    pub fn classify(&self, fault: &KernelFault) -> FaultClass {
        if self.is_recoverable(fault.kind) {
            FaultClass::Recoverable
        } else {
            FaultClass::Fatal
        }
    }

    pub fn recoverable_kinds(&self) -> impl Iterator<Item = FaultKind> + '_ {
        self.recoverable.iter().copied()
    }
}

impl Default for FaultPolicy {
    /// Void bounding box, immutable shape, hasher mismatch and null shape.
    fn default() -> Self {
        Self::with_recoverable(FaultKind::TRANSIENT)
    }
}
