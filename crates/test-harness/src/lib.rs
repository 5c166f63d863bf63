//! Test harness for version diff scenarios.
//!
//! Provides programmatic tools for building two or more versions of a model,
//! running the diff pipeline over them, and checking the outcome.
//!
//! # Key Components
//!
//! - [`DiffScenario`] — Fluent API for building versions and running diffs
//! - [`oracle`] — Verification functions returning pass/fail verdicts
//! - [`report`] — Structured text descriptions of a run
//! - [`helpers`] — Error type and tracing setup
//! - [`assertions`] — Assertion helpers with diagnostics

pub mod assertions;
pub mod helpers;
pub mod oracle;
pub mod report;
pub mod workflow;

pub use helpers::{init_tracing, HarnessError};
pub use oracle::OracleVerdict;
pub use report::ScenarioReport;
pub use workflow::DiffScenario;
