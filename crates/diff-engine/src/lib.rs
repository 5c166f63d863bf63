pub mod config;
pub mod pipeline;
pub mod select;
pub mod types;

pub use config::DiffConfig;
pub use pipeline::DiffPipeline;
pub use select::{select_versions, SelectedVersions};
pub use types::*;

use solid_kernel::{SolidKernel, VersionContainer};

/// Diff the first two qualifying containers under `config`.
pub fn diff_versions(
    kernel: &mut dyn SolidKernel,
    containers: &[&dyn VersionContainer],
    config: DiffConfig,
) -> Result<DiffOutcome, PipelineError> {
    DiffPipeline::new(config)?.run(kernel, containers)
}
