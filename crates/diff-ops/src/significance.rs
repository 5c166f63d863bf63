//! The volume threshold below which a shape does not count.

use solid_kernel::{SolidHandle, SolidKernel};
use tracing::debug;

/// `|volume| > epsilon`, strictly.
pub fn is_significant(volume: f64, epsilon: f64) -> bool {
    volume.abs() > epsilon
}

/// The magnitude of `solid`'s volume if it is significant.
///
/// Null shapes and failing volume queries count as not significant.
pub fn significant_volume(
    kernel: &dyn SolidKernel,
    solid: &SolidHandle,
    epsilon: f64,
) -> Option<f64> {
    if kernel.is_null(solid) {
        return None;
    }
    match kernel.volume(solid) {
        Ok(volume) if is_significant(volume, epsilon) => Some(volume.abs()),
        Ok(_) => None,
        Err(fault) => {
            debug!(%solid, %fault, "volume query failed, treating shape as insignificant");
            None
        }
    }
}

/// Pass `solid` through only if it is present and significant. Idempotent.
pub fn filter(
    kernel: &dyn SolidKernel,
    solid: Option<SolidHandle>,
    epsilon: f64,
) -> Option<SolidHandle> {
    solid.filter(|s| significant_volume(kernel, s, epsilon).is_some())
}
