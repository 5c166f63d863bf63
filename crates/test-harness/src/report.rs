//! Structured reports of a diff run.
//!
//! Text for test output next to a failing assertion, JSON for tooling that
//! archives scenario runs.

use std::fmt;

use serde::Serialize;

use diff_engine::DiffOutcome;
use diff_ops::{CollectionSummary, DiffReport};
use solid_types::{AggregateOrigin, DiffCategory};

use crate::oracle::OracleVerdict;

/// A complete run report with all sections.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub old_label: String,
    pub new_label: String,
    pub collections: [CollectionSummary; 2],
    pub origins: [AggregateOrigin; 2],
    pub present: Vec<DiffCategory>,
    pub volumes: DiffReport,
    /// `(category, fault)` for every absorbed fault.
    pub recovered: Vec<(DiffCategory, String)>,
    pub oracle_results: Vec<OracleVerdict>,
}

impl ScenarioReport {
    pub fn from_outcome(outcome: &DiffOutcome, oracle_results: Vec<OracleVerdict>) -> Self {
        Self {
            old_label: outcome.old_label.clone(),
            new_label: outcome.new_label.clone(),
            collections: [outcome.old_collection.clone(), outcome.new_collection.clone()],
            origins: [outcome.old_origin, outcome.new_origin],
            present: outcome.result.present(),
            volumes: outcome.report.clone(),
            recovered: outcome
                .recovered
                .iter()
                .map(|r| (r.category, format!("{} ({}): {}", r.kind, r.operation, r.detail)))
                .collect(),
            oracle_results,
        }
    }

    pub fn failed_oracles(&self) -> usize {
        self.oracle_results.iter().filter(|v| !v.passed).count()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Format the report as text.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str("=== Version Diff Report ===\n\n");

        out.push_str(&format!("Versions: \"{}\" -> \"{}\"\n", self.old_label, self.new_label));
        for (label, summary, origin) in [
            (&self.old_label, &self.collections[0], self.origins[0]),
            (&self.new_label, &self.collections[1], self.origins[1]),
        ] {
            out.push_str(&format!(
                "  {}: {} of {} entries used (empty {}, invalid {}, insignificant {}, unreadable {}), aggregate {:?}\n",
                label,
                summary.accepted,
                summary.inspected,
                summary.empty,
                summary.invalid,
                summary.insignificant,
                summary.unreadable,
                origin,
            ));
        }

        let present: Vec<&str> = self.present.iter().map(|c| c.name()).collect();
        out.push_str(&format!(
            "\nResults: {}\n",
            if present.is_empty() {
                "none".to_string()
            } else {
                present.join(", ")
            }
        ));
        for line in self.volumes.to_string().lines() {
            out.push_str(&format!("  {line}\n"));
        }

        if self.recovered.is_empty() {
            out.push_str("\nRecovered faults: none\n");
        } else {
            out.push_str(&format!("\nRecovered faults ({}):\n", self.recovered.len()));
            for (category, detail) in &self.recovered {
                out.push_str(&format!("  {category}: {detail}\n"));
            }
        }

        if !self.oracle_results.is_empty() {
            out.push_str(&format!(
                "\nOracle Results ({} checks):\n",
                self.oracle_results.len()
            ));
            for v in &self.oracle_results {
                let status = if v.passed { "PASS" } else { "FAIL" };
                out.push_str(&format!("  [{}] {}: {}\n", status, v.oracle_name, v.detail));
            }
        }

        out
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}
