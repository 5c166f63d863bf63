//! Consolidating one version's solids into a single comparable shape.

use solid_kernel::{SolidHandle, SolidKernel};
use solid_types::{AggregateOrigin, AggregationMode};
use tracing::{debug, warn};

use crate::kernel_ext;
use crate::types::{AggregateShape, DiffError};

/// Builds the per-version aggregate under a fixed [`AggregationMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeAggregator {
    pub mode: AggregationMode,
    /// Run the cosmetic seam cleanup on fused aggregates.
    pub clean_seams: bool,
}

impl ShapeAggregator {
    pub fn new(mode: AggregationMode) -> Self {
        Self {
            mode,
            clean_seams: false,
        }
    }

    pub fn with_seam_cleanup(mut self, clean_seams: bool) -> Self {
        self.clean_seams = clean_seams;
        self
    }

    /// Consolidate `solids`.
    ///
    /// No solids give `None`. A single solid gives an independent copy. Under
    /// `Union` several solids are fused, falling back to a compound of the
    /// inputs when any fuse fails; under `Preservation` they always form a
    /// compound. The inputs are never modified or released. Only a failing
    /// copy is an error.
    pub fn aggregate(
        &self,
        kernel: &mut dyn SolidKernel,
        solids: &[SolidHandle],
    ) -> Result<Option<AggregateShape>, DiffError> {
        let input_count = solids.len();
        let (handle, origin) = match solids {
            [] => return Ok(None),
            [only] => {
                let copy = kernel
                    .copy(only)
                    .map_err(|fault| DiffError::AggregationFailed { fault })?;
                (copy, AggregateOrigin::Single)
            }
            _ => match self.mode {
                AggregationMode::Preservation => {
                    (kernel.make_compound(solids), AggregateOrigin::Compound)
                }
                AggregationMode::Union => self.union(kernel, solids),
            },
        };
        debug!(%handle, ?origin, input_count, "aggregate built");
        Ok(Some(AggregateShape {
            handle,
            origin,
            input_count,
        }))
    }

    fn union(
        &self,
        kernel: &mut dyn SolidKernel,
        solids: &[SolidHandle],
    ) -> (SolidHandle, AggregateOrigin) {
        match kernel_ext::fuse_fold(kernel, solids) {
            Ok(fused) => {
                let fused = if self.clean_seams {
                    kernel_ext::clean_seams(kernel, fused)
                } else {
                    fused
                };
                (fused, AggregateOrigin::Fused)
            }
            Err(fault) => {
                warn!(%fault, count = solids.len(), "fuse failed, falling back to compound");
                (kernel.make_compound(solids), AggregateOrigin::FallbackCompound)
            }
        }
    }
}

impl Default for ShapeAggregator {
    fn default() -> Self {
        Self::new(AggregationMode::default())
    }
}
