//! Helpers layered over [`SolidKernel`] that several stages share.

use solid_kernel::{KernelFault, SolidHandle, SolidKernel};
use solid_types::FaultKind;
use tracing::debug;

/// Fold `solids` left with pairwise `fuse`.
///
/// Needs at least two inputs. Intermediates are released as the fold
/// advances, and on failure nothing created here survives. The inputs are
/// never released.
pub fn fuse_fold(
    kernel: &mut dyn SolidKernel,
    solids: &[SolidHandle],
) -> Result<SolidHandle, KernelFault> {
    let [first, second, rest @ ..] = solids else {
        return Err(KernelFault::new(
            FaultKind::NullShape,
            format!("fuse fold needs two solids, got {}", solids.len()),
        ));
    };
    let mut acc = kernel.fuse(first, second)?;
    for solid in rest {
        match kernel.fuse(&acc, solid) {
            Ok(next) => {
                kernel.release(&acc);
                acc = next;
            }
            Err(fault) => {
                kernel.release(&acc);
                return Err(fault);
            }
        }
    }
    Ok(acc)
}

/// Try the cosmetic seam cleanup on `solid`, consuming it.
///
/// Returns the cleaned shape when the kernel produced one, otherwise the
/// original. A backend without cleanup support is not an error.
pub fn clean_seams(kernel: &mut dyn SolidKernel, solid: SolidHandle) -> SolidHandle {
    match kernel.remove_seams(&solid) {
        Ok(Some(cleaned)) => {
            kernel.release(&solid);
            cleaned
        }
        Ok(None) => solid,
        Err(fault) => {
            debug!(%solid, %fault, "seam cleanup failed, keeping uncleaned shape");
            solid
        }
    }
}

pub fn release_all<'a>(
    kernel: &mut dyn SolidKernel,
    handles: impl IntoIterator<Item = &'a SolidHandle>,
) {
    for handle in handles {
        kernel.release(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use solid_kernel::{KernelOp, MockKernel};

    #[test]
    fn test_fuse_fold_three_solids() {
        let mut kernel = MockKernel::new();
        let a = kernel.make_cube([0.0, 0.0, 0.0], 1.0);
        let b = kernel.make_cube([1.0, 0.0, 0.0], 1.0);
        let c = kernel.make_cube([2.0, 0.0, 0.0], 1.0);

        let fused = fuse_fold(&mut kernel, &[a, b, c]).unwrap();
        assert_relative_eq!(kernel.volume(&fused).unwrap(), 3.0, epsilon = 1e-9);
        // three inputs plus the result; the intermediate is gone
        assert_eq!(kernel.live_count(), 4);
    }

    #[test]
    fn test_fuse_fold_failure_releases_intermediates() {
        let mut kernel = MockKernel::new();
        let a = kernel.make_cube([0.0, 0.0, 0.0], 1.0);
        let b = kernel.make_cube([1.0, 0.0, 0.0], 1.0);
        let broken = kernel.make_null();

        // the first fuse succeeds, the second hits the null operand
        let err = fuse_fold(&mut kernel, &[a, b, broken]).unwrap_err();
        assert_eq!(err.kind, FaultKind::NullShape);
        assert_eq!(kernel.call_count(KernelOp::Fuse), 2);
        assert_eq!(kernel.live_count(), 3);
    }

    #[test]
    fn test_fuse_fold_needs_two() {
        let mut kernel = MockKernel::new();
        let a = kernel.make_cube([0.0, 0.0, 0.0], 1.0);
        let err = fuse_fold(&mut kernel, &[a]).unwrap_err();
        assert_eq!(err.kind, FaultKind::NullShape);
        assert_eq!(kernel.call_count(KernelOp::Fuse), 0);
    }

    #[test]
    fn test_clean_seams_swaps_in_cleaned_shape() {
        let mut kernel = MockKernel::new();
        let a = kernel.make_cube([0.0, 0.0, 0.0], 2.0);
        let cleaned = clean_seams(&mut kernel, a.clone());
        assert_ne!(cleaned, a);
        assert!(!kernel.contains(&a));
        assert_relative_eq!(kernel.volume(&cleaned).unwrap(), 8.0);
    }

    #[test]
    fn test_clean_seams_unsupported_or_failing_keeps_original() {
        let mut kernel = MockKernel::new().without_seam_cleanup();
        let a = kernel.make_cube([0.0, 0.0, 0.0], 2.0);
        assert_eq!(clean_seams(&mut kernel, a.clone()), a);

        let mut kernel = MockKernel::new();
        let b = kernel.make_cube([0.0, 0.0, 0.0], 2.0);
        kernel.fail_on(KernelOp::RemoveSeams, FaultKind::NotSupported);
        assert_eq!(clean_seams(&mut kernel, b.clone()), b);
        assert!(kernel.contains(&b));
    }
}
