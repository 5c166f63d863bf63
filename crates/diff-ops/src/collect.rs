//! Gathering the usable solids of one version.

use serde::Serialize;
use solid_kernel::{ContainerEntry, SolidHandle, SolidKernel, VersionContainer};
use tracing::{debug, warn};

use crate::significance::is_significant;

/// What happened to each entry of a container during collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionSummary {
    pub inspected: usize,
    pub accepted: usize,
    /// Entries without geometry, or holding a null shape.
    pub empty: usize,
    pub invalid: usize,
    pub insignificant: usize,
    /// Entries whose geometry, validity or volume could not be read.
    pub unreadable: usize,
}

impl CollectionSummary {
    pub fn skipped(&self) -> usize {
        self.inspected - self.accepted
    }
}

enum Verdict {
    Accept(SolidHandle),
    Empty,
    Invalid,
    Insignificant,
    Unreadable,
}

/// The valid, significant solids of `container`, in container order.
pub fn collect(
    kernel: &dyn SolidKernel,
    container: &dyn VersionContainer,
    epsilon: f64,
) -> Vec<SolidHandle> {
    collect_detailed(kernel, container, epsilon).0
}

/// Like [`collect`], with per-entry accounting.
///
/// A failure on one entry never affects the others: it is logged with the
/// entry name and the entry is skipped.
pub fn collect_detailed(
    kernel: &dyn SolidKernel,
    container: &dyn VersionContainer,
    epsilon: f64,
) -> (Vec<SolidHandle>, CollectionSummary) {
    let label = container.label();
    let mut solids = Vec::new();
    let mut summary = CollectionSummary::default();

    for entry in container.entries() {
        summary.inspected += 1;
        match inspect(kernel, label, &entry, epsilon) {
            Verdict::Accept(solid) => {
                summary.accepted += 1;
                solids.push(solid);
            }
            Verdict::Empty => summary.empty += 1,
            Verdict::Invalid => summary.invalid += 1,
            Verdict::Insignificant => summary.insignificant += 1,
            Verdict::Unreadable => summary.unreadable += 1,
        }
    }

    debug!(container = label, ?summary, "collection complete");
    (solids, summary)
}

fn inspect(kernel: &dyn SolidKernel, label: &str, entry: &ContainerEntry, epsilon: f64) -> Verdict {
    let name = entry.name.as_str();
    let solid = match &entry.solid {
        Ok(Some(solid)) => solid,
        Ok(None) => return Verdict::Empty,
        Err(fault) => {
            warn!(container = label, entry = name, %fault, "cannot read entry geometry, skipping");
            return Verdict::Unreadable;
        }
    };
    if kernel.is_null(solid) {
        return Verdict::Empty;
    }
    match kernel.is_valid(solid) {
        Ok(true) => {}
        Ok(false) => {
            warn!(container = label, entry = name, "invalid solid, skipping");
            return Verdict::Invalid;
        }
        Err(fault) => {
            warn!(container = label, entry = name, %fault, "validity check failed, skipping");
            return Verdict::Unreadable;
        }
    }
    match kernel.volume(solid) {
        Ok(volume) if is_significant(volume, epsilon) => Verdict::Accept(solid.clone()),
        Ok(volume) => {
            debug!(container = label, entry = name, volume, "volume below epsilon, skipping");
            Verdict::Insignificant
        }
        Err(fault) => {
            warn!(container = label, entry = name, %fault, "volume query failed, skipping");
            Verdict::Unreadable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solid_kernel::{KernelFault, MockKernel, VersionDocument};
    use solid_types::FaultKind;

    const EPS: f64 = 1e-6;

    #[test]
    fn test_collect_keeps_order_and_skips_non_solids() {
        let mut kernel = MockKernel::new();
        let a = kernel.make_cube([0.0, 0.0, 0.0], 1.0);
        let b = kernel.make_cube([5.0, 0.0, 0.0], 1.0);
        let doc = VersionDocument::new("v1")
            .with_solid("Pad001", b.clone())
            .with_empty("Sketch")
            .with_solid("Pad", a.clone());

        assert_eq!(collect(&kernel, &doc, EPS), vec![b, a]);
    }

    #[test]
    fn test_collect_detailed_counts_each_skip_reason() {
        let mut kernel = MockKernel::new();
        let good = kernel.make_cube([0.0, 0.0, 0.0], 1.0);
        let invalid = kernel.make_invalid_box([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let tiny = kernel.make_cube([0.0, 0.0, 0.0], 1e-3);
        let null = kernel.make_null();
        let poisoned = kernel.make_cube([0.0, 0.0, 0.0], 1.0);
        kernel.poison(&poisoned, FaultKind::Other);

        let doc = VersionDocument::new("v1")
            .with_solid("Good", good.clone())
            .with_solid("Invalid", invalid)
            .with_solid("Tiny", tiny)
            .with_solid("Null", null)
            .with_solid("Poisoned", poisoned)
            .with_empty("Origin")
            .with_unreadable("Broken", KernelFault::new(FaultKind::Other, "bad brep"));

        let (solids, summary) = collect_detailed(&kernel, &doc, EPS);
        assert_eq!(solids, vec![good]);
        assert_eq!(
            summary,
            CollectionSummary {
                inspected: 7,
                accepted: 1,
                empty: 2,
                invalid: 1,
                insignificant: 1,
                unreadable: 2,
            }
        );
        assert_eq!(summary.skipped(), 6);
    }

    #[test]
    fn test_collect_makes_no_kernel_calls() {
        let mut kernel = MockKernel::new();
        let a = kernel.make_cube([0.0, 0.0, 0.0], 1.0);
        let doc = VersionDocument::new("v1").with_solid("Pad", a);
        collect(&kernel, &doc, EPS);
        assert!(kernel.calls().is_empty());
    }

    #[test]
    fn test_collect_accepts_reversed_solids() {
        let mut kernel = MockKernel::new();
        let reversed = kernel.make_reversed_box([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let doc = VersionDocument::new("v1").with_solid("Mirrored", reversed.clone());
        assert_eq!(collect(&kernel, &doc, EPS), vec![reversed]);
    }
}
