//! Assertion helpers with diagnostic output.
//!
//! Failures carry the context string, expected vs actual, and come back as
//! `HarnessError` rather than panics.

use diff_ops::DiffResult;
use solid_kernel::SolidKernel;
use solid_types::DiffCategory;

use crate::helpers::HarnessError;
use crate::oracle::OracleVerdict;

/// Assert a category is present with `|volume|` within `tol` of `expected`.
pub fn assert_category_volume(
    kernel: &dyn SolidKernel,
    result: &DiffResult,
    category: DiffCategory,
    expected: f64,
    tol: f64,
    ctx: &str,
) -> Result<(), HarnessError> {
    let solid = result
        .get(category)
        .ok_or(HarnessError::NoResult { category })?;
    let actual = kernel
        .volume(solid)
        .map_err(|fault| HarnessError::AssertionFailed {
            detail: format!("[{ctx}] {category} volume unreadable: {fault}"),
        })?
        .abs();
    if (actual - expected).abs() <= tol {
        Ok(())
    } else {
        Err(HarnessError::AssertionFailed {
            detail: format!(
                "[{ctx}] {category} volume: expected {expected:.6}, got {actual:.6} (tol={tol})"
            ),
        })
    }
}

/// Assert a category carries no shape.
pub fn assert_category_absent(
    result: &DiffResult,
    category: DiffCategory,
    ctx: &str,
) -> Result<(), HarnessError> {
    match result.get(category) {
        None => Ok(()),
        Some(solid) => Err(HarnessError::AssertionFailed {
            detail: format!("[{ctx}] expected no {category} result, got {solid}"),
        }),
    }
}

/// Assert every verdict passed; the first failure is returned.
pub fn assert_all_pass(verdicts: &[OracleVerdict]) -> Result<(), HarnessError> {
    match verdicts.iter().find(|v| !v.passed) {
        None => Ok(()),
        Some(v) => Err(HarnessError::OracleFailure {
            oracle: v.oracle_name.clone(),
            detail: v.detail.clone(),
        }),
    }
}
