//! Tests for verification oracles.

use diff_ops::{report, CategoryVolumes};
use proptest::prelude::*;
use solid_types::DiffCategory;
use test_harness::oracle::*;
use test_harness::DiffScenario;

fn volumes(unchanged: f64, added: f64, removed: f64) -> CategoryVolumes {
    CategoryVolumes {
        unchanged,
        added,
        removed,
    }
}

// ── Report Oracle Tests ─────────────────────────────────────────────────

#[test]
fn conservation_passes_for_consistent_report() {
    let r = report(1000.0, 1200.0, volumes(900.0, 300.0, 100.0));
    let verdict = check_volume_conservation(&r, 1e-9);
    assert!(verdict.passed, "{}", verdict.detail);
}

#[test]
fn conservation_fails_when_volume_is_lost() {
    let r = report(1000.0, 1200.0, volumes(0.0, 300.0, 100.0));
    let verdict = check_volume_conservation(&r, 1e-6);
    assert!(!verdict.passed);
    assert!(verdict.value.unwrap() > 800.0);
}

#[test]
fn percentages_guard_zero_totals() {
    let r = report(0.0, 0.0, volumes(0.0, 0.0, 0.0));
    assert!(check_percentages(&r, 1e-9).passed);
    assert!(check_net_change(&r, 1e-9).passed);
}

#[test]
fn identity_and_symmetry_verdicts() {
    let same = report(1000.0, 1000.0, volumes(1000.0, 0.0, 0.0));
    assert!(check_identity(&same).passed);

    let forward = report(1000.0, 1000.0, volumes(500.0, 500.0, 500.0));
    let backward = report(1000.0, 1000.0, volumes(500.0, 500.0, 500.0));
    assert!(check_symmetry(&forward, &backward, 1e-9).passed);

    let skewed = report(1000.0, 1200.0, volumes(500.0, 700.0, 500.0));
    assert!(!check_symmetry(&forward, &skewed, 1e-9).passed);
    assert!(!check_identity(&skewed).passed);
}

// ── Shape Oracle Tests ──────────────────────────────────────────────────

#[test]
fn results_significant_after_run() {
    let mut s = DiffScenario::mock();
    s.version("v1").unwrap().cube("Cube", [0., 0., 0.], 4.0);
    s.version("v2").unwrap().cube("Cube", [2., 2., 2.], 4.0);
    s.run().unwrap();
    let outcome = s.outcome().unwrap();
    let verdict = check_results_significant(s.kernel(), &outcome.result, 1e-6);
    assert!(verdict.passed, "{}", verdict.detail);
    assert_eq!(outcome.result.present().len(), 3);
}

#[test]
fn run_all_skips_conservation_after_recovered_fault() {
    let mut s = DiffScenario::mock();
    s.version("v1").unwrap().cube("Cube", [0., 0., 0.], 4.0);
    s.version("v2").unwrap().cube("Cube", [2., 2., 2.], 4.0);
    s.fail_on(
        solid_kernel::KernelOp::Intersect,
        solid_types::FaultKind::HasherMismatch,
    )
    .unwrap();
    s.run().unwrap();
    let verdicts = s.check_oracles(1e-6).unwrap();
    assert!(verdicts.iter().all(|v| v.passed));
    assert!(verdicts.iter().all(|v| v.oracle_name != "volume_conservation"));
    assert_eq!(s.volume(DiffCategory::Unchanged).unwrap(), 0.0);
}

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

/// Integer-grid box as `(min, max)`.
fn arb_box() -> impl Strategy<Value = ([f64; 3], [f64; 3])> {
    (0i32..6, 0i32..6, 0i32..6, 1i32..5, 1i32..5, 1i32..5).prop_map(|(x, y, z, w, h, d)| {
        let min = [x as f64, y as f64, z as f64];
        (min, [min[0] + w as f64, min[1] + h as f64, min[2] + d as f64])
    })
}

// ---------------------------------------------------------------------------
// Whole-pipeline properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn pipeline_satisfies_oracles(
        old in prop::collection::vec(arb_box(), 1..3),
        new in prop::collection::vec(arb_box(), 1..3),
    ) {
        let mut s = DiffScenario::mock();
        s.version("old").unwrap();
        for (i, (min, max)) in old.iter().enumerate() {
            s.box_solid(&format!("Old{i}"), *min, *max);
        }
        s.version("new").unwrap();
        for (i, (min, max)) in new.iter().enumerate() {
            s.box_solid(&format!("New{i}"), *min, *max);
        }

        let forward = s.run_pair(0, 1).unwrap().report.clone();
        for verdict in s.check_oracles(1e-6).unwrap() {
            prop_assert!(verdict.passed, "{}: {}", verdict.oracle_name, verdict.detail);
        }
        let backward = s.run_pair(1, 0).unwrap().report.clone();
        let verdict = check_symmetry(&forward, &backward, 1e-6);
        prop_assert!(verdict.passed, "{}", verdict.detail);
    }
}
