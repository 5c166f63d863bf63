//! Volume accounting of a finished diff.

use serde::{Deserialize, Serialize};
use solid_kernel::SolidKernel;
use solid_types::DiffCategory;
use tracing::debug;

use crate::types::DiffResult;

/// Absolute volume of each category; zero when the category is absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryVolumes {
    pub unchanged: f64,
    pub added: f64,
    pub removed: f64,
}

impl CategoryVolumes {
    /// Measure the shapes of `result`. A failing volume query counts as 0.
    pub fn measure(kernel: &dyn SolidKernel, result: &DiffResult) -> Self {
        let measure = |category: DiffCategory| {
            result
                .get(category)
                .map(|solid| match kernel.volume(solid) {
                    Ok(volume) => volume.abs(),
                    Err(fault) => {
                        debug!(%category, %fault, "volume query failed, reporting 0");
                        0.0
                    }
                })
                .unwrap_or(0.0)
        };
        Self {
            unchanged: measure(DiffCategory::Unchanged),
            added: measure(DiffCategory::Added),
            removed: measure(DiffCategory::Removed),
        }
    }

    pub fn get(&self, category: DiffCategory) -> f64 {
        match category {
            DiffCategory::Unchanged => self.unchanged,
            DiffCategory::Added => self.added,
            DiffCategory::Removed => self.removed,
        }
    }
}

/// Per-category volumes, their share of each version, and the net change.
///
/// Percentages are on a 0..100 scale and are 0 whenever the reference total
/// is 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffReport {
    pub old_total: f64,
    pub new_total: f64,
    pub volumes: CategoryVolumes,
    pub unchanged_pct_of_old: f64,
    pub unchanged_pct_of_new: f64,
    pub added_pct_of_new: f64,
    pub removed_pct_of_old: f64,
    /// `added - removed`.
    pub net_change: f64,
}

impl DiffReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl std::fmt::Display for DiffReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Old version: {:.3} mm³", self.old_total)?;
        writeln!(f, "New version: {:.3} mm³", self.new_total)?;
        writeln!(
            f,
            "Unchanged: {:.3} mm³ ({:.1}% of old, {:.1}% of new)",
            self.volumes.unchanged, self.unchanged_pct_of_old, self.unchanged_pct_of_new
        )?;
        writeln!(
            f,
            "Added: {:.3} mm³ ({:.1}% of new)",
            self.volumes.added, self.added_pct_of_new
        )?;
        writeln!(
            f,
            "Removed: {:.3} mm³ ({:.1}% of old)",
            self.volumes.removed, self.removed_pct_of_old
        )?;
        write!(f, "Net change: {:+.3} mm³", self.net_change)
    }
}

fn percentage(part: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        part / total * 100.0
    }
}

/// Build the report from version totals and measured category volumes.
/// Totals are taken by magnitude.
pub fn report(old_total: f64, new_total: f64, volumes: CategoryVolumes) -> DiffReport {
    let old_total = old_total.abs();
    let new_total = new_total.abs();
    DiffReport {
        old_total,
        new_total,
        volumes,
        unchanged_pct_of_old: percentage(volumes.unchanged, old_total),
        unchanged_pct_of_new: percentage(volumes.unchanged, new_total),
        added_pct_of_new: percentage(volumes.added, new_total),
        removed_pct_of_old: percentage(volumes.removed, old_total),
        net_change: volumes.added - volumes.removed,
    }
}

/// [`report`] over the shapes of `result`.
pub fn build_report(
    kernel: &dyn SolidKernel,
    old_total: f64,
    new_total: f64,
    result: &DiffResult,
) -> DiffReport {
    report(old_total, new_total, CategoryVolumes::measure(kernel, result))
}
