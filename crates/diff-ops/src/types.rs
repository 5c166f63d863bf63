use serde::Serialize;
use solid_kernel::{KernelFault, SolidHandle, SolidKernel};
use solid_types::{AggregateOrigin, DiffCategory, FaultKind};

use crate::boolean::BooleanKind;

/// A version's consolidated shape, owned by the run that built it.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateShape {
    pub handle: SolidHandle,
    /// How the shape was actually produced.
    pub origin: AggregateOrigin,
    /// Number of collected solids that went into it.
    pub input_count: usize,
}

/// The three derived volumes of a comparison.
///
/// Every present handle is non-null and above the significance epsilon.
/// Built once; there are no setters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffResult {
    unchanged: Option<SolidHandle>,
    added: Option<SolidHandle>,
    removed: Option<SolidHandle>,
}

impl DiffResult {
    pub fn new(
        unchanged: Option<SolidHandle>,
        added: Option<SolidHandle>,
        removed: Option<SolidHandle>,
    ) -> Self {
        Self {
            unchanged,
            added,
            removed,
        }
    }

    pub fn get(&self, category: DiffCategory) -> Option<&SolidHandle> {
        match category {
            DiffCategory::Unchanged => self.unchanged.as_ref(),
            DiffCategory::Added => self.added.as_ref(),
            DiffCategory::Removed => self.removed.as_ref(),
        }
    }

    pub fn unchanged(&self) -> Option<&SolidHandle> {
        self.unchanged.as_ref()
    }

    pub fn added(&self) -> Option<&SolidHandle> {
        self.added.as_ref()
    }

    pub fn removed(&self) -> Option<&SolidHandle> {
        self.removed.as_ref()
    }

    /// Categories that carry a shape, in `DiffCategory::ALL` order.
    pub fn present(&self) -> Vec<DiffCategory> {
        DiffCategory::ALL
            .into_iter()
            .filter(|c| self.get(*c).is_some())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.present().is_empty()
    }

    /// Hand every shape back to the kernel.
    pub fn release(self, kernel: &mut dyn SolidKernel) {
        for handle in [self.unchanged, self.added, self.removed].into_iter().flatten() {
            kernel.release(&handle);
        }
    }
}

/// A recoverable kernel fault that was absorbed during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaultRecord {
    pub category: DiffCategory,
    pub operation: BooleanKind,
    pub kind: FaultKind,
    pub detail: String,
}

impl FaultRecord {
    pub fn new(category: DiffCategory, fault: &KernelFault) -> Self {
        Self {
            category,
            operation: BooleanKind::for_category(category).0,
            kind: fault.kind,
            detail: fault.detail.clone(),
        }
    }
}

/// Errors from the diff operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DiffError {
    #[error("fatal kernel fault during {operation}: {fault}")]
    FatalKernelFault {
        operation: BooleanKind,
        fault: KernelFault,
    },

    #[error("aggregation failed: {fault}")]
    AggregationFailed { fault: KernelFault },
}
