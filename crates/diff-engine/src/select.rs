//! Choosing which two containers to compare.

use diff_ops::collect;
use solid_kernel::{SolidKernel, VersionContainer};
use tracing::debug;

use crate::types::ConfigurationError;

/// The pair of containers chosen for a run.
pub struct SelectedVersions<'a> {
    pub old: &'a dyn VersionContainer,
    pub new: &'a dyn VersionContainer,
    /// Positions of `old` and `new` in the provider's list.
    pub old_index: usize,
    pub new_index: usize,
}

/// The first two containers, in order, that hold at least one valid,
/// significant solid. Only queries the kernel.
pub fn select_versions<'a>(
    kernel: &dyn SolidKernel,
    containers: &[&'a dyn VersionContainer],
    epsilon: f64,
) -> Result<SelectedVersions<'a>, ConfigurationError> {
    let found = containers.len();
    if found < 2 {
        return Err(ConfigurationError::TooFewContainers { found });
    }

    let mut qualifying = Vec::with_capacity(2);
    for (index, container) in containers.iter().enumerate() {
        if collect(kernel, *container, epsilon).is_empty() {
            debug!(container = container.label(), "no usable solids, not a candidate");
            continue;
        }
        qualifying.push(index);
        if qualifying.len() == 2 {
            break;
        }
    }

    match qualifying[..] {
        [old_index, new_index] => Ok(SelectedVersions {
            old: containers[old_index],
            new: containers[new_index],
            old_index,
            new_index,
        }),
        _ => Err(ConfigurationError::TooFewQualifying {
            found,
            qualifying: qualifying.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solid_kernel::{MockKernel, VersionDocument};

    #[test]
    fn test_fewer_than_two_containers() {
        let kernel = MockKernel::new();
        let only = VersionDocument::new("only");
        let err = select_versions(&kernel, &[&only], 1e-6).err().unwrap();
        assert_eq!(err, ConfigurationError::TooFewContainers { found: 1 });
    }

    #[test]
    fn test_skips_empty_containers() {
        let mut kernel = MockKernel::new();
        let a = kernel.make_cube([0.0, 0.0, 0.0], 1.0);
        let b = kernel.make_cube([0.0, 0.0, 0.0], 2.0);
        let c = kernel.make_cube([0.0, 0.0, 0.0], 3.0);
        let empty = VersionDocument::new("drawing").with_empty("Page");
        let v1 = VersionDocument::new("v1").with_solid("Pad", a);
        let v2 = VersionDocument::new("v2").with_solid("Pad", b);
        let v3 = VersionDocument::new("v3").with_solid("Pad", c);

        let selected = select_versions(&kernel, &[&empty, &v1, &v2, &v3], 1e-6).unwrap();
        assert_eq!(selected.old.label(), "v1");
        assert_eq!(selected.new.label(), "v2");
        assert_eq!((selected.old_index, selected.new_index), (1, 2));
    }

    #[test]
    fn test_too_few_qualifying() {
        let mut kernel = MockKernel::new();
        let a = kernel.make_cube([0.0, 0.0, 0.0], 1.0);
        let tiny = kernel.make_cube([0.0, 0.0, 0.0], 1e-3);
        let v1 = VersionDocument::new("v1").with_solid("Pad", a);
        let v2 = VersionDocument::new("v2").with_solid("Speck", tiny);

        let err = select_versions(&kernel, &[&v1, &v2], 1e-6).err().unwrap();
        assert_eq!(
            err,
            ConfigurationError::TooFewQualifying {
                found: 2,
                qualifying: 1
            }
        );
        assert!(kernel.calls().is_empty());
    }
}
