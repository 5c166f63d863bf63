//! DiffScenario — fluent API for scripting version diffs in tests.
//!
//! Versions are built entry by entry on a chosen kernel backend, then run
//! through the real `DiffPipeline`.

use diff_engine::{DiffConfig, DiffOutcome, DiffPipeline, PipelineError};
use solid_kernel::primitives::make_box;
use solid_kernel::{
    KernelFault, KernelOp, MockKernel, SolidHandle, SolidKernel, TruckKernel, VersionContainer,
    VersionDocument,
};
use solid_types::{DiffCategory, FaultKind};

use crate::helpers::HarnessError;
use crate::oracle::{self, OracleVerdict};
use crate::report::ScenarioReport;

enum Backend {
    Mock(MockKernel),
    Truck(TruckKernel),
}

impl Backend {
    fn name(&self) -> &'static str {
        match self {
            Backend::Mock(_) => "mock",
            Backend::Truck(_) => "truck",
        }
    }

    fn kernel(&self) -> &dyn SolidKernel {
        match self {
            Backend::Mock(k) => k,
            Backend::Truck(k) => k,
        }
    }

    fn kernel_mut(&mut self) -> &mut dyn SolidKernel {
        match self {
            Backend::Mock(k) => k,
            Backend::Truck(k) => k,
        }
    }

    fn make_box(&mut self, min: [f64; 3], max: [f64; 3]) -> SolidHandle {
        match self {
            Backend::Mock(k) => k.make_box(min, max),
            Backend::Truck(k) => {
                let size = [max[0] - min[0], max[1] - min[1], max[2] - min[2]];
                k.insert(make_box(min, size))
            }
        }
    }
}

/// A fluent builder for constructing versions and checking their diff.
pub struct DiffScenario {
    backend: Backend,
    config: DiffConfig,
    versions: Vec<VersionDocument>,
    /// Shapes created by the builder itself.
    input_shapes: usize,
    outcome: Option<DiffOutcome>,
}

impl DiffScenario {
    /// A scenario on MockKernel (deterministic, exact volumes).
    pub fn mock() -> Self {
        Self::with_backend(Backend::Mock(MockKernel::new()))
    }

    /// A scenario on TruckKernel (real geometry).
    pub fn truck() -> Self {
        Self::with_backend(Backend::Truck(TruckKernel::new()))
    }

    fn with_backend(backend: Backend) -> Self {
        Self {
            backend,
            config: DiffConfig::default(),
            versions: Vec::new(),
            input_shapes: 0,
            outcome: None,
        }
    }

    pub fn with_config(mut self, config: DiffConfig) -> Self {
        self.config = config;
        self
    }

    // ── Version Building ────────────────────────────────────────────────

    /// Open a new version; following entries go into it.
    pub fn version(&mut self, name: &str) -> Result<&mut Self, HarnessError> {
        if self.versions.iter().any(|v| v.label() == name) {
            return Err(HarnessError::DuplicateName {
                name: name.to_string(),
            });
        }
        self.versions.push(VersionDocument::new(name));
        Ok(self)
    }

    fn current(&mut self) -> &mut VersionDocument {
        if self.versions.is_empty() {
            let label = format!("v{}", self.versions.len() + 1);
            self.versions.push(VersionDocument::new(label));
        }
        let last = self.versions.len() - 1;
        &mut self.versions[last]
    }

    fn add_solid(&mut self, name: &str, solid: SolidHandle) -> &mut Self {
        self.input_shapes += 1;
        self.current().push(name, Ok(Some(solid)));
        self
    }

    /// Add an axis-aligned box spanning `min`..`max`.
    pub fn box_solid(&mut self, name: &str, min: [f64; 3], max: [f64; 3]) -> &mut Self {
        let solid = self.backend.make_box(min, max);
        self.add_solid(name, solid)
    }

    /// Add a cube with its min corner at `origin`.
    pub fn cube(&mut self, name: &str, origin: [f64; 3], side: f64) -> &mut Self {
        let max = [origin[0] + side, origin[1] + side, origin[2] + side];
        self.box_solid(name, origin, max)
    }

    /// Add an entry without geometry.
    pub fn empty(&mut self, name: &str) -> &mut Self {
        self.current().push(name, Ok(None));
        self
    }

    /// Add an entry whose geometry cannot be read.
    pub fn unreadable(&mut self, name: &str, kind: FaultKind) -> &mut Self {
        let fault = KernelFault::new(kind, format!("cannot read {name}"));
        self.current().push(name, Err(fault));
        self
    }

    /// Add a box the kernel reports as invalid. Mock only.
    pub fn invalid_box(
        &mut self,
        name: &str,
        min: [f64; 3],
        max: [f64; 3],
    ) -> Result<&mut Self, HarnessError> {
        let solid = self.mock_kernel("invalid shapes")?.make_invalid_box(min, max);
        Ok(self.add_solid(name, solid))
    }

    /// Add a box with negative reported volume. Mock only.
    pub fn reversed_box(
        &mut self,
        name: &str,
        min: [f64; 3],
        max: [f64; 3],
    ) -> Result<&mut Self, HarnessError> {
        let solid = self.mock_kernel("reversed shapes")?.make_reversed_box(min, max);
        Ok(self.add_solid(name, solid))
    }

    // ── Kernel Access ───────────────────────────────────────────────────

    fn mock_kernel(&mut self, what: &str) -> Result<&mut MockKernel, HarnessError> {
        match &mut self.backend {
            Backend::Mock(k) => Ok(k),
            other => Err(HarnessError::Unsupported {
                backend: other.name(),
                what: what.to_string(),
            }),
        }
    }

    /// Make every subsequent `op` fail with `kind`. Mock only.
    pub fn fail_on(&mut self, op: KernelOp, kind: FaultKind) -> Result<&mut Self, HarnessError> {
        self.mock_kernel("fault injection")?.fail_on(op, kind);
        Ok(self)
    }

    /// Make the next `times` calls of `op` fail with `kind`. Mock only.
    pub fn fail_times(
        &mut self,
        op: KernelOp,
        kind: FaultKind,
        times: usize,
    ) -> Result<&mut Self, HarnessError> {
        self.mock_kernel("fault injection")?.fail_times(op, kind, times);
        Ok(self)
    }

    pub fn kernel(&self) -> &dyn SolidKernel {
        self.backend.kernel()
    }

    /// The mock kernel's call log and shape count, if on the mock backend.
    pub fn as_mock(&self) -> Option<&MockKernel> {
        match &self.backend {
            Backend::Mock(k) => Some(k),
            Backend::Truck(_) => None,
        }
    }

    /// Shapes held by the kernel beyond the builder's own inputs. Mock only.
    pub fn extra_shapes(&self) -> Option<usize> {
        self.as_mock()
            .map(|k| k.live_count().saturating_sub(self.input_shapes))
    }

    // ── Running ─────────────────────────────────────────────────────────

    /// Run the pipeline over all versions, in order.
    pub fn run(&mut self) -> Result<&DiffOutcome, HarnessError> {
        self.release_outcome();
        let pipeline = DiffPipeline::new(self.config.clone()).map_err(PipelineError::from)?;
        let containers: Vec<&dyn VersionContainer> = self
            .versions
            .iter()
            .map(|v| v as &dyn VersionContainer)
            .collect();
        let outcome = pipeline.run(self.backend.kernel_mut(), &containers)?;
        let outcome = self.outcome.insert(outcome);
        Ok(&*outcome)
    }

    /// Diff two specific versions by position, skipping selection.
    pub fn run_pair(&mut self, old: usize, new: usize) -> Result<&DiffOutcome, HarnessError> {
        self.release_outcome();
        let pipeline = DiffPipeline::new(self.config.clone()).map_err(PipelineError::from)?;
        let (Some(old_doc), Some(new_doc)) = (self.versions.get(old), self.versions.get(new)) else {
            return Err(HarnessError::AssertionFailed {
                detail: format!("version index out of range ({old}, {new})"),
            });
        };
        let outcome = pipeline.run_pair(self.backend.kernel_mut(), old_doc, new_doc)?;
        let outcome = self.outcome.insert(outcome);
        Ok(&*outcome)
    }

    fn release_outcome(&mut self) {
        if let Some(previous) = self.outcome.take() {
            previous.release(self.backend.kernel_mut());
        }
    }

    pub fn outcome(&self) -> Result<&DiffOutcome, HarnessError> {
        self.outcome.as_ref().ok_or(HarnessError::NotRun)
    }

    /// Absolute volume of a category in the last run; 0 when absent.
    pub fn volume(&self, category: DiffCategory) -> Result<f64, HarnessError> {
        Ok(self.outcome()?.report.volumes.get(category))
    }

    // ── Assertions ──────────────────────────────────────────────────────

    pub fn assert_volume(
        &self,
        category: DiffCategory,
        expected: f64,
        tol: f64,
    ) -> Result<(), HarnessError> {
        let outcome = self.outcome()?;
        crate::assertions::assert_category_volume(
            self.kernel(),
            &outcome.result,
            category,
            expected,
            tol,
            &outcome.new_label,
        )
    }

    pub fn assert_absent(&self, category: DiffCategory) -> Result<(), HarnessError> {
        let outcome = self.outcome()?;
        crate::assertions::assert_category_absent(&outcome.result, category, &outcome.new_label)
    }

    /// The standard oracles over the last run.
    pub fn check_oracles(&self, tol: f64) -> Result<Vec<OracleVerdict>, HarnessError> {
        let outcome = self.outcome()?;
        Ok(oracle::run_all_oracles(
            self.kernel(),
            outcome,
            self.config.epsilon,
            tol,
        ))
    }

    pub fn report(&self) -> Result<ScenarioReport, HarnessError> {
        let verdicts = self.check_oracles(1e-6)?;
        Ok(ScenarioReport::from_outcome(self.outcome()?, verdicts))
    }
}
