//! Reporting E2E tests: output directory, event logs, index.html.

use std::sync::Arc;

use tempfile::TempDir;

use crate::helpers::fixtures::*;

use stackrun_core::StackrunError;
use stackrun_core::error::ProviderError;
use stackrun_core::provider::{
    BoxFuture, ProgressReporter, ProviderResult, ProvisioningHandle, Toolchain,
};
use stackrun_core::types::{StackFilter, StackStatus};
use stackrun_runner::{CloudCall, INDEX_FILE, SimulatedCloud, TestRun};

use crate::helpers::assertions::*;

/// Progress reporter whose output channel is gone.
struct ClosedTerminal;

impl ProgressReporter for ClosedTerminal {
    fn report_test_progress<'a>(
        &'a self,
        _handle: &'a dyn ProvisioningHandle,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async { Err(ProviderError::new("progress", "terminal closed")) })
    }
}

#[tokio::test]
async fn test_e2e_report_writes_index_and_event_logs() {
    // Given: a started run and an output dir that does not exist yet
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("reports");
    let cloud = Arc::new(SimulatedCloud::new());
    let mut run = default_run(&cloud, SINGLE_TEST);
    run.start().await.unwrap();

    // When
    let index = run.report(Some(&out)).await.unwrap();

    // Then
    assert_eq!(index, out.join(INDEX_FILE));
    let html = std::fs::read_to_string(&index).unwrap();
    for stack in run.result() {
        assert!(html.contains(&stack.name));
        let log = out.join(format!("{}-{}-events.txt", stack.name, stack.region));
        let body = std::fs::read_to_string(&log).unwrap();
        assert!(body.contains("CREATE_COMPLETE"), "{body}");
    }
}

#[tokio::test]
async fn test_e2e_report_reflects_final_state_after_end() {
    let tmp = TempDir::new().unwrap();
    let cloud = Arc::new(SimulatedCloud::new());
    let mut run = default_run(&cloud, SINGLE_TEST);
    run.start().await.unwrap();
    run.end().await.unwrap();

    let index = run.report(Some(tmp.path())).await.unwrap();

    let html = std::fs::read_to_string(index).unwrap();
    assert!(html.contains("DELETE_COMPLETE"));
    assert!(!html.contains("CREATE_COMPLETE"));
}

#[tokio::test]
async fn test_e2e_report_does_not_change_outcome() {
    let tmp = TempDir::new().unwrap();
    let cloud = Arc::new(SimulatedCloud::new().with_failing_test("one"));
    let mut run = default_run(&cloud, SINGLE_TEST);
    run.start().await.unwrap();

    run.report(Some(tmp.path())).await.unwrap();

    assert!(run.passed());
}

#[tokio::test]
async fn test_e2e_report_before_start_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let cloud = Arc::new(SimulatedCloud::new());
    let run = default_run(&cloud, SINGLE_TEST);

    let err = run.report(Some(tmp.path())).await.unwrap_err();

    assert!(matches!(err, StackrunError::RunState(_)));
}

#[tokio::test]
async fn test_e2e_execute_runs_full_lifecycle() {
    let tmp = TempDir::new().unwrap();
    let cloud = Arc::new(SimulatedCloud::new());
    let mut run = default_run(&cloud, SINGLE_TEST);

    let index = run.execute(Some(tmp.path())).await.unwrap();

    assert!(index.is_file());
    assert!(run.passed());
    assert!(
        run.handle()
            .unwrap()
            .stacks()
            .await
            .unwrap()
            .iter()
            .all(|s| s.status.to_string() == "DELETE_COMPLETE")
    );
}

#[tokio::test]
async fn test_e2e_execute_reports_stack_failure_after_cleanup() {
    let tmp = TempDir::new().unwrap();
    let cloud = Arc::new(SimulatedCloud::new().with_failing_delete("one"));
    let mut run = default_run(&cloud, SINGLE_TEST);

    let err = run.execute(Some(tmp.path())).await.unwrap_err();

    assert!(matches!(err, StackrunError::StacksFailed { .. }));
    // report was still written before teardown
    assert!(tmp.path().join(INDEX_FILE).is_file());
}

#[tokio::test]
async fn test_e2e_execute_tears_down_when_start_fails_after_create() {
    // Given: stacks get created, then progress reporting fails
    let tmp = TempDir::new().unwrap();
    let cloud = Arc::new(SimulatedCloud::new());
    let toolchain = Toolchain {
        progress: Arc::new(ClosedTerminal),
        ..cloud.toolchain()
    };
    let mut run = TestRun::builder()
        .config(config(SINGLE_TEST))
        .project_root("/work/project")
        .toolchain(toolchain)
        .build()
        .unwrap();

    // When
    let err = run.execute(Some(tmp.path())).await.unwrap_err();

    // Then: the start error is returned, but stacks and buckets are torn down
    assert!(matches!(err, StackrunError::Provider(_)), "{err:?}");
    let calls = cloud.calls();
    assert_eq!(count(&calls, |c| *c == CloudCall::Delete(StackFilter::All)), 1);
    assert_eq!(deleted_buckets(&calls).len(), 1);
    let stacks = run.handle().unwrap().stacks().await.unwrap();
    assert!(!stacks.is_empty());
    assert!(stacks.iter().all(|s| s.status == StackStatus::DeleteComplete));
    // no report for a run that never finished starting
    assert!(!tmp.path().join(INDEX_FILE).exists());
}

#[tokio::test]
async fn test_e2e_execute_without_handle_skips_teardown() {
    // Given: skip_upload without a bucket fails before anything is provisioned
    let cloud = Arc::new(SimulatedCloud::new());
    let mut run = build_run(
        &cloud,
        config(SINGLE_TEST),
        stackrun_runner::StartOptions {
            skip_upload: true,
            ..Default::default()
        },
        stackrun_runner::EndOptions::default(),
    );

    let err = run.execute(None).await.unwrap_err();

    assert!(matches!(err, StackrunError::Config(_)));
    assert!(cloud.calls().is_empty());
}
