use approx::assert_relative_eq;

use diff_engine::{
    diff_versions, ConfigurationError, DiffConfig, DiffPipeline, PipelineError, PipelineStage,
};
use diff_ops::FaultPolicy;
use solid_kernel::{
    KernelFault, KernelOp, MockKernel, SolidKernel, VersionContainer, VersionDocument,
};
use solid_types::{AggregateOrigin, DiffCategory, FaultKind};

/// Old version: a 10mm cube plus a detached 2mm block. New version: the cube
/// grown to 15mm high, block gone.
fn revision_pair(kernel: &mut MockKernel) -> (VersionDocument, VersionDocument) {
    let cube = kernel.make_box([0.0, 0.0, 0.0], [10.0, 10.0, 10.0]);
    let block = kernel.make_box([20.0, 0.0, 0.0], [22.0, 2.0, 2.0]);
    let taller = kernel.make_box([0.0, 0.0, 0.0], [10.0, 10.0, 15.0]);
    (
        VersionDocument::new("rev-a")
            .with_solid("Body", cube)
            .with_solid("Block", block)
            .with_empty("Sketch"),
        VersionDocument::new("rev-b").with_solid("Body", taller),
    )
}

#[test]
fn diff_versions_reports_all_three_categories() {
    let mut kernel = MockKernel::new();
    let (a, b) = revision_pair(&mut kernel);
    let outcome = diff_versions(&mut kernel, &[&a, &b], DiffConfig::union()).unwrap();

    assert_eq!(outcome.old_label, "rev-a");
    assert_eq!(outcome.new_label, "rev-b");
    assert_eq!(outcome.old_origin, AggregateOrigin::Fused);
    assert_eq!(outcome.old_collection.accepted, 2);
    assert_eq!(outcome.old_collection.empty, 1);
    assert_eq!(outcome.result.present(), DiffCategory::ALL.to_vec());
    assert_relative_eq!(outcome.report.volumes.unchanged, 1000.0, epsilon = 1e-9);
    assert_relative_eq!(outcome.report.volumes.added, 500.0, epsilon = 1e-9);
    assert_relative_eq!(outcome.report.volumes.removed, 8.0, epsilon = 1e-9);
    assert_relative_eq!(outcome.report.net_change, 492.0, epsilon = 1e-9);
}

#[test]
fn preservation_gives_same_volumes_for_disjoint_members() {
    let mut kernel = MockKernel::new();
    let (a, b) = revision_pair(&mut kernel);
    let union = diff_versions(&mut kernel, &[&a, &b], DiffConfig::union()).unwrap();
    let preserved = diff_versions(&mut kernel, &[&a, &b], DiffConfig::preservation()).unwrap();

    assert_eq!(preserved.old_origin, AggregateOrigin::Compound);
    assert_relative_eq!(
        union.report.volumes.removed,
        preserved.report.volumes.removed,
        epsilon = 1e-9
    );
    assert_relative_eq!(union.report.old_total, preserved.report.old_total, epsilon = 1e-9);
}

#[test]
fn unreadable_entries_do_not_stop_the_run() {
    let mut kernel = MockKernel::new();
    let (a, b) = revision_pair(&mut kernel);
    let mut b = b;
    b.push("Corrupt", Err(KernelFault::new(FaultKind::Other, "brep read error")));

    let outcome = diff_versions(&mut kernel, &[&a, &b], DiffConfig::default()).unwrap();
    assert_eq!(outcome.new_collection.unreadable, 1);
    assert_eq!(outcome.new_collection.accepted, 1);
}

#[test]
fn configuration_errors_come_before_kernel_calls() {
    let mut kernel = MockKernel::new();
    let (a, _) = revision_pair(&mut kernel);
    let empty = VersionDocument::new("empty");

    let err = diff_versions(&mut kernel, &[&a], DiffConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Configuration(ConfigurationError::TooFewContainers { found: 1 })
    ));

    let err = diff_versions(&mut kernel, &[&a, &empty], DiffConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Configuration(ConfigurationError::TooFewQualifying { .. })
    ));
    assert!(kernel.calls().is_empty());
    assert_eq!(kernel.tolerance(), None);
}

#[test]
fn fatal_fault_aborts_with_stage() {
    let mut kernel = MockKernel::new();
    let (a, b) = revision_pair(&mut kernel);
    let live_before = kernel.live_count();
    kernel.fail_on(KernelOp::Intersect, FaultKind::EntityNotFound);

    let err = diff_versions(&mut kernel, &[&a, &b], DiffConfig::default()).unwrap_err();
    match &err {
        PipelineError::Aborted { stage, .. } => assert_eq!(*stage, PipelineStage::ComputeUnchanged),
        other => panic!("unexpected error {other}"),
    }
    assert!(err.to_string().contains("compute unchanged"));
    assert_eq!(kernel.live_count(), live_before);
}

#[test]
fn configured_policy_controls_recovery() {
    let mut kernel = MockKernel::new();
    let (a, b) = revision_pair(&mut kernel);
    kernel.fail_times(KernelOp::Intersect, FaultKind::BooleanFailed, 1);

    let config = DiffConfig::default()
        .with_fault_policy(FaultPolicy::default().allow(FaultKind::BooleanFailed));
    let outcome = DiffPipeline::new(config)
        .unwrap()
        .run(&mut kernel, &[&a, &b])
        .unwrap();
    assert!(outcome.result.unchanged().is_none());
    assert_eq!(outcome.recovered.len(), 1);
    assert_eq!(outcome.report.volumes.unchanged, 0.0);
}

#[test]
fn outcome_summary_serializes_without_handles() {
    let mut kernel = MockKernel::new();
    let (a, b) = revision_pair(&mut kernel);
    let outcome = diff_versions(&mut kernel, &[&a, &b], DiffConfig::default()).unwrap();

    let json = outcome.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["old_label"], "rev-a");
    assert_eq!(value["present"].as_array().unwrap().len(), 3);
    assert_eq!(value["run_id"].as_str().unwrap(), outcome.run_id.to_string());
    assert!(value["report"]["net_change"].as_f64().unwrap() > 0.0);
}

#[test]
fn labels_come_from_containers() {
    let mut kernel = MockKernel::new();
    let (a, b) = revision_pair(&mut kernel);
    let outcome = DiffPipeline::default()
        .run_pair(&mut kernel, &b, &a)
        .unwrap();
    assert_eq!(outcome.old_label, b.label());
    assert_relative_eq!(outcome.report.volumes.added, 8.0, epsilon = 1e-9);
}

#[test]
fn both_versions_empty_reports_both_sides() {
    let mut kernel = MockKernel::new();
    let old = VersionDocument::new("rev-a").with_empty("Sketch");
    let new = VersionDocument::new("rev-b")
        .with_empty("Datum")
        .with_unreadable("Broken", KernelFault::new(FaultKind::Other, "unreadable"));

    let err = DiffPipeline::default()
        .run_pair(&mut kernel, &old, &new)
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::EmptyInput {
            old_empty: true,
            new_empty: true
        }
    ));
    assert!(kernel.calls().is_empty());
}

#[test]
fn runs_leave_kernel_tolerance_untouched() {
    let mut kernel = MockKernel::new();
    let (a, b) = revision_pair(&mut kernel);

    let first = diff_versions(&mut kernel, &[&a, &b], DiffConfig::default()).unwrap();
    assert_eq!(kernel.boolean_tolerance(), Some(1e-3));
    assert_eq!(kernel.tolerance(), None);
    first.release(&mut kernel);

    let config = DiffConfig {
        boolean_tolerance: None,
        ..DiffConfig::default()
    };
    diff_versions(&mut kernel, &[&a, &b], config).unwrap();
    assert_eq!(kernel.boolean_tolerance(), None);
    assert_eq!(kernel.tolerance(), None);
}
