//! Verification oracles — pure functions returning pass/fail verdicts.
//!
//! Each oracle returns an `OracleVerdict` with diagnostic detail, not panics,
//! so one pass collects every failure.

use diff_engine::DiffOutcome;
use diff_ops::{is_significant, DiffReport, DiffResult};
use serde::Serialize;
use solid_kernel::SolidKernel;

/// The result of a single oracle check.
#[derive(Debug, Clone, Serialize)]
pub struct OracleVerdict {
    pub oracle_name: String,
    pub passed: bool,
    pub detail: String,
    pub value: Option<f64>,
}

impl OracleVerdict {
    fn pass(name: &str, detail: String) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: true,
            detail,
            value: None,
        }
    }

    fn pass_val(name: &str, detail: String, value: f64) -> Self {
        Self {
            value: Some(value),
            ..Self::pass(name, detail)
        }
    }

    fn fail(name: &str, detail: String) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: false,
            detail,
            value: None,
        }
    }

    fn fail_val(name: &str, detail: String, value: f64) -> Self {
        Self {
            value: Some(value),
            ..Self::fail(name, detail)
        }
    }
}

// ── Volume Oracles ──────────────────────────────────────────────────────────

/// Unchanged + Removed = Old and Unchanged + Added = New.
///
/// Only meaningful when no boolean fault was absorbed and each version's
/// solids do not overlap one another.
pub fn check_volume_conservation(report: &DiffReport, tol: f64) -> OracleVerdict {
    let v = &report.volumes;
    let old_gap = (v.unchanged + v.removed - report.old_total).abs();
    let new_gap = (v.unchanged + v.added - report.new_total).abs();
    let gap = old_gap.max(new_gap);
    let detail = format!(
        "old: {:.6} + {:.6} vs {:.6}; new: {:.6} + {:.6} vs {:.6}",
        v.unchanged, v.removed, report.old_total, v.unchanged, v.added, report.new_total
    );
    if gap <= tol {
        OracleVerdict::pass_val("volume_conservation", detail, gap)
    } else {
        OracleVerdict::fail_val("volume_conservation", detail, gap)
    }
}

/// Net change equals added minus removed.
pub fn check_net_change(report: &DiffReport, tol: f64) -> OracleVerdict {
    let expected = report.volumes.added - report.volumes.removed;
    let gap = (report.net_change - expected).abs();
    let detail = format!("net {:.6}, added - removed {:.6}", report.net_change, expected);
    if gap <= tol {
        OracleVerdict::pass_val("net_change", detail, report.net_change)
    } else {
        OracleVerdict::fail_val("net_change", detail, report.net_change)
    }
}

/// Percentages are within 0..=100 (plus `tol`) and zero for zero totals.
pub fn check_percentages(report: &DiffReport, tol: f64) -> OracleVerdict {
    let checks = [
        ("unchanged_pct_of_old", report.unchanged_pct_of_old, report.old_total),
        ("unchanged_pct_of_new", report.unchanged_pct_of_new, report.new_total),
        ("added_pct_of_new", report.added_pct_of_new, report.new_total),
        ("removed_pct_of_old", report.removed_pct_of_old, report.old_total),
    ];
    for (name, pct, total) in checks {
        if total == 0.0 && pct != 0.0 {
            return OracleVerdict::fail_val(
                "percentages",
                format!("{name} is {pct} with a zero total"),
                pct,
            );
        }
        if !(-tol..=100.0 + tol).contains(&pct) {
            let detail = format!("{name} out of range: {pct}");
            return OracleVerdict::fail_val("percentages", detail, pct);
        }
    }
    OracleVerdict::pass("percentages", "all within 0..=100".to_string())
}

// ── Shape Oracles ───────────────────────────────────────────────────────────

/// Every present result is non-null and exceeds epsilon.
pub fn check_results_significant(
    kernel: &dyn SolidKernel,
    result: &DiffResult,
    epsilon: f64,
) -> OracleVerdict {
    for category in result.present() {
        let Some(solid) = result.get(category) else {
            continue;
        };
        if kernel.is_null(solid) {
            return OracleVerdict::fail("results_significant", format!("{category} is null"));
        }
        match kernel.volume(solid) {
            Ok(volume) if is_significant(volume, epsilon) => {}
            Ok(volume) => {
                return OracleVerdict::fail_val(
                    "results_significant",
                    format!("{category} volume {volume} <= {epsilon}"),
                    volume,
                )
            }
            Err(fault) => {
                return OracleVerdict::fail(
                    "results_significant",
                    format!("{category} volume unreadable: {fault}"),
                )
            }
        }
    }
    OracleVerdict::pass(
        "results_significant",
        format!("{} present result(s) above {epsilon}", result.present().len()),
    )
}

// ── Cross-run Oracles ───────────────────────────────────────────────────────

/// Swapping versions swaps Added and Removed and keeps Unchanged.
pub fn check_symmetry(forward: &DiffReport, backward: &DiffReport, tol: f64) -> OracleVerdict {
    let f = &forward.volumes;
    let b = &backward.volumes;
    let gaps = [
        (f.added - b.removed).abs(),
        (f.removed - b.added).abs(),
        (f.unchanged - b.unchanged).abs(),
    ];
    let gap = gaps.into_iter().fold(0.0_f64, f64::max);
    let detail = format!(
        "forward (u {:.6}, a {:.6}, r {:.6}) vs backward (u {:.6}, a {:.6}, r {:.6})",
        f.unchanged, f.added, f.removed, b.unchanged, b.added, b.removed
    );
    if gap <= tol {
        OracleVerdict::pass_val("symmetry", detail, gap)
    } else {
        OracleVerdict::fail_val("symmetry", detail, gap)
    }
}

/// Identical versions: nothing added or removed.
pub fn check_identity(report: &DiffReport) -> OracleVerdict {
    let v = &report.volumes;
    if v.added == 0.0 && v.removed == 0.0 {
        OracleVerdict::pass_val("identity", "no added or removed volume".to_string(), v.unchanged)
    } else {
        OracleVerdict::fail(
            "identity",
            format!("added {:.6}, removed {:.6}", v.added, v.removed),
        )
    }
}

/// Run the single-run oracles over an outcome.
///
/// Volume conservation is skipped when a fault was absorbed, since a lost
/// category breaks it by design of the fault policy.
pub fn run_all_oracles(
    kernel: &dyn SolidKernel,
    outcome: &DiffOutcome,
    epsilon: f64,
    tol: f64,
) -> Vec<OracleVerdict> {
    let mut verdicts = vec![
        check_net_change(&outcome.report, tol),
        check_percentages(&outcome.report, tol),
        check_results_significant(kernel, &outcome.result, epsilon),
    ];
    if outcome.recovered.is_empty() {
        verdicts.push(check_volume_conservation(&outcome.report, tol));
    }
    verdicts
}
