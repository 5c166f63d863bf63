use diff_ops::{CollectionSummary, DiffError, DiffReport, DiffResult, FaultRecord};
use serde::Serialize;
use solid_kernel::SolidKernel;
use solid_types::{AggregateOrigin, DiffCategory};
use uuid::Uuid;

/// States of a diff run, in the order they are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Start,
    CollectOld,
    CollectNew,
    AggregateOld,
    AggregateNew,
    ComputeUnchanged,
    ComputeAdded,
    ComputeRemoved,
    Filter,
    Report,
    Done,
    Aborted,
}

impl PipelineStage {
    pub fn compute(category: DiffCategory) -> Self {
        match category {
            DiffCategory::Unchanged => PipelineStage::ComputeUnchanged,
            DiffCategory::Added => PipelineStage::ComputeAdded,
            DiffCategory::Removed => PipelineStage::ComputeRemoved,
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PipelineStage::Start => "start",
            PipelineStage::CollectOld => "collect old",
            PipelineStage::CollectNew => "collect new",
            PipelineStage::AggregateOld => "aggregate old",
            PipelineStage::AggregateNew => "aggregate new",
            PipelineStage::ComputeUnchanged => "compute unchanged",
            PipelineStage::ComputeAdded => "compute added",
            PipelineStage::ComputeRemoved => "compute removed",
            PipelineStage::Filter => "filter",
            PipelineStage::Report => "report",
            PipelineStage::Done => "done",
            PipelineStage::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// The versions handed to a run are unusable. Raised before any kernel call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("at least two versions are needed, got {found}")]
    TooFewContainers { found: usize },

    #[error("at least two versions must contain valid solids, {qualifying} of {found} do")]
    TooFewQualifying { found: usize, qualifying: usize },

    #[error("invalid configuration: {reason}")]
    Invalid { reason: String },
}

/// Errors that end a diff run without a result.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("nothing to compare (old empty: {old_empty}, new empty: {new_empty})")]
    EmptyInput { old_empty: bool, new_empty: bool },

    #[error("diff aborted during {stage}: {source}")]
    Aborted {
        stage: PipelineStage,
        #[source]
        source: DiffError,
    },
}

/// Everything a finished run hands to the presentation layer.
///
/// The result shapes belong to the caller; give them back with
/// [`DiffOutcome::release`] when done.
#[derive(Debug)]
pub struct DiffOutcome {
    pub run_id: Uuid,
    pub old_label: String,
    pub new_label: String,
    pub result: DiffResult,
    pub report: DiffReport,
    /// Recoverable faults absorbed by the booleans.
    pub recovered: Vec<FaultRecord>,
    pub old_collection: CollectionSummary,
    pub new_collection: CollectionSummary,
    pub old_origin: AggregateOrigin,
    pub new_origin: AggregateOrigin,
    /// Stages entered, `Start` through `Done`.
    pub stages: Vec<PipelineStage>,
}

/// Serializable view of a [`DiffOutcome`], without kernel handles.
#[derive(Debug, Serialize)]
pub struct OutcomeSummary<'a> {
    pub run_id: Uuid,
    pub old_label: &'a str,
    pub new_label: &'a str,
    pub present: Vec<DiffCategory>,
    pub report: &'a DiffReport,
    pub recovered: &'a [FaultRecord],
    pub old_collection: &'a CollectionSummary,
    pub new_collection: &'a CollectionSummary,
    pub old_origin: AggregateOrigin,
    pub new_origin: AggregateOrigin,
}

impl DiffOutcome {
    pub fn summary(&self) -> OutcomeSummary<'_> {
        OutcomeSummary {
            run_id: self.run_id,
            old_label: &self.old_label,
            new_label: &self.new_label,
            present: self.result.present(),
            report: &self.report,
            recovered: &self.recovered,
            old_collection: &self.old_collection,
            new_collection: &self.new_collection,
            old_origin: self.old_origin,
            new_origin: self.new_origin,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.summary())
    }

    pub fn release(self, kernel: &mut dyn SolidKernel) {
        self.result.release(kernel);
    }
}
