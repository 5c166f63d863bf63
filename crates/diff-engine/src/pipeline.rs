//! The diff run: collection through report, with shape bookkeeping.

use diff_ops::{
    build_report, collect_detailed, filter, BooleanDiffEngine, DiffComputation, DiffError,
    DiffResult, ShapeAggregator,
};
use solid_kernel::{SolidHandle, SolidKernel, VersionContainer};
use solid_types::DiffCategory;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::DiffConfig;
use crate::select::select_versions;
use crate::types::{ConfigurationError, DiffOutcome, PipelineError, PipelineStage};

/// Runs version diffs under one fixed configuration.
#[derive(Debug, Clone)]
pub struct DiffPipeline {
    config: DiffConfig,
}

/// Per-run state: the stage trail, the aggregates the run owns and the
/// kernel tolerance to put back.
struct Run {
    stages: Vec<PipelineStage>,
    aggregates: Vec<SolidHandle>,
    saved_tolerance: Option<Option<f64>>,
}

impl Run {
    fn new() -> Self {
        Self {
            stages: vec![PipelineStage::Start],
            aggregates: Vec::new(),
            saved_tolerance: None,
        }
    }

    fn enter(&mut self, stage: PipelineStage) {
        debug!(%stage, "entering stage");
        self.stages.push(stage);
    }

    fn stage(&self) -> PipelineStage {
        self.stages.last().copied().unwrap_or(PipelineStage::Start)
    }

    fn apply_tolerance(&mut self, kernel: &mut dyn SolidKernel, tolerance: f64) {
        self.saved_tolerance = Some(kernel.tolerance());
        kernel.set_tolerance(Some(tolerance));
    }

    fn restore_tolerance(&mut self, kernel: &mut dyn SolidKernel) {
        if let Some(previous) = self.saved_tolerance.take() {
            kernel.set_tolerance(previous);
        }
    }

    /// Release the aggregates and hand the kernel back as it was found.
    fn finish(&mut self, kernel: &mut dyn SolidKernel) {
        for handle in self.aggregates.drain(..) {
            kernel.release(&handle);
        }
        self.restore_tolerance(kernel);
    }

    /// Release everything and turn `source` into the run's error.
    fn abort(&mut self, kernel: &mut dyn SolidKernel, source: DiffError) -> PipelineError {
        let stage = self.stage();
        warn!(%stage, error = %source, "diff aborted");
        self.finish(kernel);
        self.stages.push(PipelineStage::Aborted);
        PipelineError::Aborted { stage, source }
    }
}

impl DiffPipeline {
    pub fn new(config: DiffConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Pick the first two qualifying containers and diff them.
    #[instrument(skip_all, fields(containers = containers.len()))]
    pub fn run(
        &self,
        kernel: &mut dyn SolidKernel,
        containers: &[&dyn VersionContainer],
    ) -> Result<DiffOutcome, PipelineError> {
        let selected = select_versions(&*kernel, containers, self.config.epsilon)?;
        info!(
            old = selected.old.label(),
            new = selected.new.label(),
            old_index = selected.old_index,
            new_index = selected.new_index,
            "versions selected"
        );
        self.run_pair(kernel, selected.old, selected.new)
    }

    /// Diff `old` against `new`.
    ///
    /// On success only the result shapes survive; on any error the kernel
    /// holds nothing the run created. Either way the kernel's tolerance is
    /// what it was before the run.
    #[instrument(skip_all, fields(run_id = tracing::field::Empty, old = old.label(), new = new.label()))]
    pub fn run_pair(
        &self,
        kernel: &mut dyn SolidKernel,
        old: &dyn VersionContainer,
        new: &dyn VersionContainer,
    ) -> Result<DiffOutcome, PipelineError> {
        let run_id = Uuid::new_v4();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));
        let config = &self.config;
        let mut run = Run::new();

        run.enter(PipelineStage::CollectOld);
        let (old_solids, old_collection) = collect_detailed(&*kernel, old, config.epsilon);
        run.enter(PipelineStage::CollectNew);
        let (new_solids, new_collection) = collect_detailed(&*kernel, new, config.epsilon);

        if old_solids.is_empty() || new_solids.is_empty() {
            return Err(empty_input(old_solids.is_empty(), new_solids.is_empty()));
        }

        if let Some(tolerance) = config.boolean_tolerance {
            run.apply_tolerance(kernel, tolerance);
        }

        let aggregator = ShapeAggregator::new(config.mode).with_seam_cleanup(config.clean_seams);

        run.enter(PipelineStage::AggregateOld);
        let old_agg = match aggregator.aggregate(kernel, &old_solids) {
            Ok(Some(agg)) => agg,
            Ok(None) => {
                run.finish(kernel);
                return Err(empty_input(true, false));
            }
            Err(e) => return Err(run.abort(kernel, e)),
        };
        run.aggregates.push(old_agg.handle.clone());

        run.enter(PipelineStage::AggregateNew);
        let new_agg = match aggregator.aggregate(kernel, &new_solids) {
            Ok(Some(agg)) => agg,
            Ok(None) => {
                run.finish(kernel);
                return Err(empty_input(false, true));
            }
            Err(e) => return Err(run.abort(kernel, e)),
        };
        run.aggregates.push(new_agg.handle.clone());

        let engine = BooleanDiffEngine::new(config.epsilon, config.fault_policy.clone())
            .with_seam_cleanup(config.clean_seams);
        let computed = engine.compute_with(
            kernel,
            Some(&old_agg.handle),
            Some(&new_agg.handle),
            |category| run.enter(PipelineStage::compute(category)),
        );
        let DiffComputation { result, recovered } = match computed {
            Ok(computed) => computed,
            Err(e) => return Err(run.abort(kernel, e)),
        };

        run.enter(PipelineStage::Filter);
        let [unchanged, added, removed] = DiffCategory::ALL
            .map(|category| keep_significant(kernel, &result, category, config.epsilon));
        let result = DiffResult::new(unchanged, added, removed);

        run.enter(PipelineStage::Report);
        let old_total = aggregate_volume(&*kernel, &old_agg.handle);
        let new_total = aggregate_volume(&*kernel, &new_agg.handle);
        let report = build_report(&*kernel, old_total, new_total, &result);
        run.finish(kernel);

        run.enter(PipelineStage::Done);
        info!(
            unchanged = report.volumes.unchanged,
            added = report.volumes.added,
            removed = report.volumes.removed,
            net_change = report.net_change,
            recovered = recovered.len(),
            "diff complete"
        );

        Ok(DiffOutcome {
            run_id,
            old_label: old.label().to_string(),
            new_label: new.label().to_string(),
            result,
            report,
            recovered,
            old_collection,
            new_collection,
            old_origin: old_agg.origin,
            new_origin: new_agg.origin,
            stages: run.stages,
        })
    }
}

impl Default for DiffPipeline {
    fn default() -> Self {
        Self {
            config: DiffConfig::default(),
        }
    }
}

fn empty_input(old_empty: bool, new_empty: bool) -> PipelineError {
    warn!(old_empty, new_empty, "no solids to compare");
    PipelineError::EmptyInput {
        old_empty,
        new_empty,
    }
}

/// The category's result if it is still significant; released otherwise.
fn keep_significant(
    kernel: &mut dyn SolidKernel,
    result: &DiffResult,
    category: DiffCategory,
    epsilon: f64,
) -> Option<SolidHandle> {
    let solid = result.get(category)?.clone();
    let kept = filter(&*kernel, Some(solid.clone()), epsilon);
    if kept.is_none() {
        kernel.release(&solid);
    }
    kept
}

fn aggregate_volume(kernel: &dyn SolidKernel, aggregate: &SolidHandle) -> f64 {
    match kernel.volume(aggregate) {
        Ok(volume) => volume.abs(),
        Err(fault) => {
            warn!(%fault, "aggregate volume unavailable, reporting 0");
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use solid_kernel::{KernelOp, MockKernel, VersionDocument};
    use solid_types::{AggregateOrigin, FaultKind};

    fn versions(kernel: &mut MockKernel) -> (VersionDocument, VersionDocument) {
        let a = kernel.make_box([0.0, 0.0, 0.0], [10.0, 10.0, 10.0]);
        let b = kernel.make_box([0.0, 0.0, 0.0], [10.0, 10.0, 15.0]);
        (
            VersionDocument::new("v1").with_solid("Pad", a),
            VersionDocument::new("v2").with_solid("Pad", b),
        )
    }

    #[test]
    fn test_stage_trail_of_successful_run() {
        let mut kernel = MockKernel::new();
        let (v1, v2) = versions(&mut kernel);
        let outcome = DiffPipeline::default().run(&mut kernel, &[&v1, &v2]).unwrap();
        assert_eq!(
            outcome.stages,
            vec![
                PipelineStage::Start,
                PipelineStage::CollectOld,
                PipelineStage::CollectNew,
                PipelineStage::AggregateOld,
                PipelineStage::AggregateNew,
                PipelineStage::ComputeUnchanged,
                PipelineStage::ComputeAdded,
                PipelineStage::ComputeRemoved,
                PipelineStage::Filter,
                PipelineStage::Report,
                PipelineStage::Done,
            ]
        );
        assert_eq!(outcome.old_origin, AggregateOrigin::Single);
    }

    #[test]
    fn test_only_results_survive() {
        let mut kernel = MockKernel::new();
        let (v1, v2) = versions(&mut kernel);
        let outcome = DiffPipeline::default().run(&mut kernel, &[&v1, &v2]).unwrap();
        // two inputs, unchanged and added
        assert_eq!(kernel.live_count(), 4);
        outcome.release(&mut kernel);
        assert_eq!(kernel.live_count(), 2);
    }

    #[test]
    fn test_tolerance_applies_to_booleans_and_is_restored() {
        let mut kernel = MockKernel::new();
        let (v1, v2) = versions(&mut kernel);
        DiffPipeline::default().run(&mut kernel, &[&v1, &v2]).unwrap();
        assert_eq!(kernel.boolean_tolerance(), Some(1e-3));
        assert_eq!(kernel.tolerance(), None);
    }

    #[test]
    fn test_tolerance_does_not_leak_into_next_run() {
        let mut kernel = MockKernel::new();
        let (v1, v2) = versions(&mut kernel);
        let first = DiffPipeline::default().run(&mut kernel, &[&v1, &v2]).unwrap();
        first.release(&mut kernel);

        let config = DiffConfig {
            boolean_tolerance: None,
            ..DiffConfig::default()
        };
        DiffPipeline::new(config)
            .unwrap()
            .run(&mut kernel, &[&v1, &v2])
            .unwrap();
        assert_eq!(kernel.boolean_tolerance(), None);
        assert_eq!(kernel.tolerance(), None);
    }

    #[test]
    fn test_tolerance_restored_after_abort() {
        let mut kernel = MockKernel::new();
        kernel.set_tolerance(Some(0.01));
        let (v1, v2) = versions(&mut kernel);
        kernel.fail_on(KernelOp::Intersect, FaultKind::Other);

        DiffPipeline::default().run(&mut kernel, &[&v1, &v2]).unwrap_err();
        assert_eq!(kernel.boolean_tolerance(), Some(1e-3));
        assert_eq!(kernel.tolerance(), Some(0.01));
    }

    #[test]
    fn test_abort_releases_everything() {
        let mut kernel = MockKernel::new();
        let (v1, v2) = versions(&mut kernel);
        kernel.fail_on(KernelOp::Subtract, FaultKind::Other);

        let err = DiffPipeline::default().run(&mut kernel, &[&v1, &v2]).unwrap_err();
        match err {
            PipelineError::Aborted { stage, .. } => assert_eq!(stage, PipelineStage::ComputeAdded),
            other => panic!("unexpected error {other}"),
        }
        assert_eq!(kernel.live_count(), 2);
    }

    #[test]
    fn test_empty_input_makes_no_kernel_calls() {
        let mut kernel = MockKernel::new();
        let a = kernel.make_cube([0.0, 0.0, 0.0], 1.0);
        let v1 = VersionDocument::new("v1").with_solid("Pad", a);
        let v2 = VersionDocument::new("v2").with_empty("Sketch");

        let err = DiffPipeline::default()
            .run_pair(&mut kernel, &v1, &v2)
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::EmptyInput {
                old_empty: false,
                new_empty: true
            }
        ));
        assert!(kernel.calls().is_empty());
        assert_eq!(kernel.tolerance(), None);
    }

    #[test]
    fn test_report_totals_use_aggregates() {
        let mut kernel = MockKernel::new();
        let (v1, v2) = versions(&mut kernel);
        let outcome = DiffPipeline::default().run(&mut kernel, &[&v1, &v2]).unwrap();
        assert_relative_eq!(outcome.report.old_total, 1000.0);
        assert_relative_eq!(outcome.report.new_total, 1500.0);
        assert_relative_eq!(outcome.report.unchanged_pct_of_old, 100.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = DiffPipeline::new(DiffConfig::default().with_epsilon(f64::NAN)).unwrap_err();
        assert!(matches!(err, ConfigurationError::Invalid { .. }));
    }
}
