//! Robust evaluation of the diff booleans.

use serde::Serialize;
use solid_kernel::{KernelFault, SolidHandle, SolidKernel};
use solid_types::{DiffCategory, ShapeKind};
use tracing::{debug, error, warn};

use crate::fault::{FaultClass, FaultPolicy};
use crate::kernel_ext;
use crate::significance::significant_volume;
use crate::types::{DiffError, DiffResult, FaultRecord};

/// Boolean operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BooleanKind {
    Intersect,
    Subtract,
}

impl BooleanKind {
    /// The operation behind a category and whether the operands are taken
    /// as `(new, old)` rather than `(old, new)`.
    pub fn for_category(category: DiffCategory) -> (BooleanKind, bool) {
        match category {
            DiffCategory::Unchanged => (BooleanKind::Intersect, false),
            DiffCategory::Added => (BooleanKind::Subtract, true),
            DiffCategory::Removed => (BooleanKind::Subtract, false),
        }
    }

    fn apply(
        self,
        kernel: &mut dyn SolidKernel,
        a: &SolidHandle,
        b: &SolidHandle,
    ) -> Result<SolidHandle, KernelFault> {
        match self {
            BooleanKind::Intersect => kernel.intersect(a, b),
            BooleanKind::Subtract => kernel.subtract(a, b),
        }
    }
}

impl std::fmt::Display for BooleanKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BooleanKind::Intersect => write!(f, "intersect"),
            BooleanKind::Subtract => write!(f, "subtract"),
        }
    }
}

/// Result of one boolean evaluation that did not abort the run.
#[derive(Debug, Clone, PartialEq)]
pub enum OpOutcome {
    /// A significant result, owned by the caller.
    Accepted(SolidHandle),
    /// An operand was absent or null; the kernel was not called.
    Skipped,
    /// The kernel answered with a null or negligible shape.
    Insignificant,
    /// The kernel raised a fault the policy treats as recoverable.
    Recovered(KernelFault),
}

impl OpOutcome {
    pub fn into_solid(self) -> Option<SolidHandle> {
        match self {
            OpOutcome::Accepted(solid) => Some(solid),
            _ => None,
        }
    }
}

/// An operand after compound normalization.
#[derive(Debug)]
#[must_use = "a fused operand must be released"]
pub struct Normalized {
    fused: Option<SolidHandle>,
}

impl Normalized {
    fn pass_through() -> Self {
        Self { fused: None }
    }

    pub fn is_fused(&self) -> bool {
        self.fused.is_some()
    }

    /// The shape to hand to the kernel in place of `original`.
    pub fn resolve<'a>(&'a self, original: &'a SolidHandle) -> &'a SolidHandle {
        self.fused.as_ref().unwrap_or(original)
    }

    pub fn release(self, kernel: &mut dyn SolidKernel) {
        if let Some(fused) = self.fused {
            kernel.release(&fused);
        }
    }
}

/// The three results and the recoverable faults met along the way.
#[derive(Debug, Clone, Default)]
pub struct DiffComputation {
    pub result: DiffResult,
    pub recovered: Vec<FaultRecord>,
}

/// Evaluates intersect/subtract between aggregates, classifying kernel
/// faults and dropping negligible results.
#[derive(Debug, Clone)]
pub struct BooleanDiffEngine {
    pub epsilon: f64,
    pub policy: FaultPolicy,
    /// Run the cosmetic seam cleanup on accepted results.
    pub clean_seams: bool,
}

impl BooleanDiffEngine {
    pub fn new(epsilon: f64, policy: FaultPolicy) -> Self {
        Self {
            epsilon,
            policy,
            clean_seams: false,
        }
    }

    pub fn with_seam_cleanup(mut self, clean_seams: bool) -> Self {
        self.clean_seams = clean_seams;
        self
    }

    /// Turn a compound into one solid where the kernel allows it.
    ///
    /// Tries `fuse_all`, then a pairwise fold over the members, then gives
    /// up and leaves the shape as it is. Never fails.
    pub fn normalize(&self, kernel: &mut dyn SolidKernel, solid: &SolidHandle) -> Normalized {
        match kernel.shape_kind(solid) {
            Ok(ShapeKind::Compound) => {}
            Ok(ShapeKind::Single) => return Normalized::pass_through(),
            Err(fault) => {
                debug!(%solid, %fault, "shape kind unknown, not normalizing");
                return Normalized::pass_through();
            }
        }

        match kernel.fuse_all(solid) {
            Ok(fused) => return Normalized { fused: Some(fused) },
            Err(fault) => debug!(%solid, %fault, "fuse_all failed, trying pairwise fusion"),
        }

        match fuse_members(kernel, solid) {
            Ok(fused) => Normalized { fused },
            Err(fault) => {
                warn!(%solid, %fault, "compound normalization failed, using compound as is");
                Normalized::pass_through()
            }
        }
    }

    /// Evaluate `a <kind> b`.
    ///
    /// Only a fault outside the policy's recoverable set is an error. Every
    /// shape created here except an accepted result is released.
    pub fn op(
        &self,
        kernel: &mut dyn SolidKernel,
        a: Option<&SolidHandle>,
        b: Option<&SolidHandle>,
        kind: BooleanKind,
    ) -> Result<OpOutcome, DiffError> {
        let (Some(a), Some(b)) = (a, b) else {
            debug!(%kind, "operand absent, skipping");
            return Ok(OpOutcome::Skipped);
        };
        if kernel.is_null(a) || kernel.is_null(b) {
            debug!(%kind, "null operand, skipping");
            return Ok(OpOutcome::Skipped);
        }

        let left = self.normalize(kernel, a);
        let right = self.normalize(kernel, b);
        let raw = kind.apply(kernel, left.resolve(a), right.resolve(b));
        left.release(kernel);
        right.release(kernel);

        let result = match raw {
            Ok(result) => result,
            Err(fault) => {
                return match self.policy.classify(&fault) {
                    FaultClass::Recoverable => {
                        warn!(%kind, %fault, "recoverable kernel fault, no result");
                        Ok(OpOutcome::Recovered(fault))
                    }
                    FaultClass::Fatal => {
                        error!(%kind, %fault, "fatal kernel fault");
                        Err(DiffError::FatalKernelFault {
                            operation: kind,
                            fault,
                        })
                    }
                };
            }
        };

        if significant_volume(&*kernel, &result, self.epsilon).is_none() {
            debug!(%kind, "result null or below epsilon, dropped");
            kernel.release(&result);
            return Ok(OpOutcome::Insignificant);
        }

        if !self.clean_seams {
            return Ok(OpOutcome::Accepted(result));
        }
        let cleaned = kernel_ext::clean_seams(kernel, result);
        if significant_volume(&*kernel, &cleaned, self.epsilon).is_none() {
            debug!(%kind, "result lost its volume in seam cleanup, dropped");
            kernel.release(&cleaned);
            return Ok(OpOutcome::Insignificant);
        }
        Ok(OpOutcome::Accepted(cleaned))
    }

    /// Evaluate one diff category between the old and new aggregates.
    pub fn evaluate(
        &self,
        kernel: &mut dyn SolidKernel,
        category: DiffCategory,
        old: Option<&SolidHandle>,
        new: Option<&SolidHandle>,
    ) -> Result<OpOutcome, DiffError> {
        let (kind, swapped) = BooleanKind::for_category(category);
        if swapped {
            self.op(kernel, new, old, kind)
        } else {
            self.op(kernel, old, new, kind)
        }
    }

    /// Unchanged, Added and Removed, in that order.
    ///
    /// On a fatal fault the results accepted so far are released before the
    /// error is returned.
    pub fn compute(
        &self,
        kernel: &mut dyn SolidKernel,
        old: Option<&SolidHandle>,
        new: Option<&SolidHandle>,
    ) -> Result<DiffComputation, DiffError> {
        self.compute_with(kernel, old, new, |_| {})
    }

    /// [`compute`](Self::compute), calling `before` ahead of each category.
    pub fn compute_with(
        &self,
        kernel: &mut dyn SolidKernel,
        old: Option<&SolidHandle>,
        new: Option<&SolidHandle>,
        mut before: impl FnMut(DiffCategory),
    ) -> Result<DiffComputation, DiffError> {
        let mut slots: [Option<SolidHandle>; 3] = Default::default();
        let mut recovered = Vec::new();

        for (slot, category) in DiffCategory::ALL.into_iter().enumerate() {
            before(category);
            match self.evaluate(kernel, category, old, new) {
                Ok(OpOutcome::Accepted(solid)) => slots[slot] = Some(solid),
                Ok(OpOutcome::Recovered(fault)) => {
                    recovered.push(FaultRecord::new(category, &fault))
                }
                Ok(OpOutcome::Skipped | OpOutcome::Insignificant) => {}
                Err(err) => {
                    kernel_ext::release_all(kernel, slots.iter().flatten());
                    return Err(err);
                }
            }
        }

        let [unchanged, added, removed] = slots;
        Ok(DiffComputation {
            result: DiffResult::new(unchanged, added, removed),
            recovered,
        })
    }
}

/// Pairwise fusion of a compound's members. `None` for an empty compound.
fn fuse_members(
    kernel: &mut dyn SolidKernel,
    compound: &SolidHandle,
) -> Result<Option<SolidHandle>, KernelFault> {
    let mut members = kernel.members(compound)?;
    if members.len() <= 1 {
        return Ok(members.pop());
    }
    let fused = kernel_ext::fuse_fold(kernel, &members);
    kernel_ext::release_all(kernel, &members);
    fused.map(Some)
}
