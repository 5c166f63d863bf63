//! Helper functions: error type and tracing setup.

use std::sync::Once;

use diff_engine::PipelineError;
use solid_types::DiffCategory;
use tracing_subscriber::EnvFilter;

// ── Error Type ──────────────────────────────────────────────────────────────

/// Unified error type for the test harness.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("duplicate version name: {name}")]
    DuplicateName { name: String },

    #[error("not supported by the {backend} backend: {what}")]
    Unsupported { backend: &'static str, what: String },

    #[error("no diff has been run yet")]
    NotRun,

    #[error("no {category} result")]
    NoResult { category: DiffCategory },

    #[error("assertion failed: {detail}")]
    AssertionFailed { detail: String },

    #[error("oracle failure ({oracle}): {detail}")]
    OracleFailure { oracle: String, detail: String },

    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

// ── Tracing ─────────────────────────────────────────────────────────────────

static TRACING: Once = Once::new();

/// Install a test-friendly tracing subscriber once per process.
///
/// Honors `RUST_LOG`; defaults to warnings from the diff crates.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("diff_ops=warn,diff_engine=warn"));
        // Another subscriber may already be installed by the test binary.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
