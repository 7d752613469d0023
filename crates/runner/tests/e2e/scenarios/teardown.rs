//! Teardown E2E tests: delete policy, bucket dedup, post-deletion failure check.

use std::sync::Arc;

use crate::helpers::assertions::*;
use crate::helpers::fixtures::*;

use stackrun_core::types::{Bucket, StackFilter, StackStatus};
use stackrun_core::StackrunError;
use stackrun_runner::{CloudCall, EndOptions, SimulatedCloud, StartOptions, TestRun};

async fn started(cloud: &Arc<SimulatedCloud>, toml_str: &str, end: EndOptions) -> TestRun {
    let mut run = build_run(cloud, config(toml_str), StartOptions::default(), end);
    run.start().await.expect("start should succeed");
    run
}

fn end_options(no_delete: bool, keep_failed: bool) -> EndOptions {
    EndOptions {
        no_delete,
        keep_failed,
        ..EndOptions::default()
    }
}

// ---------------------------------------------------------------------------
// Stack delete policy
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_e2e_no_delete_issues_no_stack_delete() {
    for keep_failed in [false, true] {
        // Given: no_delete regardless of keep_failed
        let cloud = Arc::new(SimulatedCloud::new());
        let mut run = started(&cloud, SINGLE_TEST, end_options(true, keep_failed)).await;

        // When
        run.end().await.unwrap();

        // Then
        assert_no_stack_delete(&cloud.calls());
    }
}

#[tokio::test]
async fn test_e2e_delete_all_targets_every_stack() {
    let cloud = Arc::new(SimulatedCloud::new());
    let mut run = started(&cloud, SINGLE_TEST, end_options(false, false)).await;

    run.end().await.unwrap();

    let calls = cloud.calls();
    assert_eq!(
        count(&calls, |c| *c == CloudCall::Delete(StackFilter::All)),
        1
    );
    assert!(run.passed());
}

#[tokio::test]
async fn test_e2e_keep_failed_deletes_only_complete_stacks() {
    // Given: status {COMPLETE: [a], FAILED: []} and keep_failed
    let cloud = Arc::new(SimulatedCloud::new());
    let mut run = started(&cloud, THREE_TESTS, end_options(false, true)).await;

    // When
    run.end().await.unwrap();

    // Then: only CREATE_COMPLETE stacks targeted, re-check clean → success
    let calls = cloud.calls();
    assert_eq!(
        count(&calls, |c| matches!(c, CloudCall::Delete(_))),
        1
    );
    assert_eq!(
        count(&calls, |c| *c
            == CloudCall::Delete(StackFilter::Status(StackStatus::CreateComplete))),
        1
    );
    assert!(run.passed());
}

#[tokio::test]
async fn test_e2e_keep_failed_leaves_failed_stacks_and_fails_run() {
    // Given: one test fails to create
    let cloud = Arc::new(SimulatedCloud::new().with_failing_test("beta"));
    let mut run = started(&cloud, THREE_TESTS, end_options(false, true)).await;

    // When
    let err = run.end().await.unwrap_err();

    // Then: beta stacks are kept in FAILED, and the run fails listing them
    let stacks = run.handle().unwrap().stacks().await.unwrap();
    for stack in &stacks {
        let expected = if stack.test == "beta" {
            StackStatus::CreateFailed
        } else {
            StackStatus::DeleteComplete
        };
        assert_eq!(stack.status, expected, "{}", stack.name);
    }
    assert_eq!(err.failed_stacks().len(), 2);
    assert!(
        err.failed_stacks()
            .iter()
            .all(|id| stacks.iter().any(|s| &s.id == id && s.test == "beta"))
    );
    assert!(!run.passed());
}

#[tokio::test]
async fn test_e2e_keep_failed_without_complete_stacks_issues_no_delete() {
    let cloud = Arc::new(SimulatedCloud::new().with_failing_test("one"));
    let mut run = started(&cloud, SINGLE_TEST, end_options(false, true)).await;

    let err = run.end().await.unwrap_err();

    assert!(matches!(err, StackrunError::StacksFailed { .. }));
    assert_no_stack_delete(&cloud.calls());
}

#[tokio::test]
async fn test_e2e_wait_for_delete_reports_progress_after_delete() {
    let cloud = Arc::new(SimulatedCloud::new());
    let mut run = started(
        &cloud,
        SINGLE_TEST,
        EndOptions {
            dont_wait_for_delete: false,
            ..EndOptions::default()
        },
    )
    .await;

    run.end().await.unwrap();

    let calls = cloud.calls();
    assert_eq!(count(&calls, |c| *c == CloudCall::Progress), 2);
    let delete = position(&calls, "delete", |c| matches!(c, CloudCall::Delete(_)));
    let progress = last_position(&calls, "progress", |c| *c == CloudCall::Progress);
    assert!(delete < progress);
}

#[tokio::test]
async fn test_e2e_dont_wait_for_delete_skips_progress() {
    let cloud = Arc::new(SimulatedCloud::new());
    let mut run = started(&cloud, SINGLE_TEST, EndOptions::default()).await;

    run.end().await.unwrap();

    // only the report right after create
    assert_eq!(count(&cloud.calls(), |c| *c == CloudCall::Progress), 1);
}

// ---------------------------------------------------------------------------
// Bucket teardown
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_e2e_shared_bucket_deleted_exactly_once() {
    // Given: three tests across two regions all referencing bucket B1
    let buckets = shared_bucket(
        &["alpha", "beta", "gamma"],
        &["us-east-1", "eu-west-1"],
        "B1",
        false,
    );
    let cloud = Arc::new(SimulatedCloud::new().with_buckets(buckets));
    let mut run = started(&cloud, THREE_TESTS, EndOptions::default()).await;

    // When
    run.end().await.unwrap();

    // Then: exactly one delete for B1, with contents purged
    let calls = cloud.calls();
    assert_eq!(deleted_buckets(&calls), vec!["B1"]);
    assert_eq!(
        count(&calls, |c| *c
            == CloudCall::DeleteBucket {
                name: "B1".to_owned(),
                delete_objects: true
            }),
        1
    );
}

#[tokio::test]
async fn test_e2e_regional_alias_is_never_deleted() {
    let mut buckets = shared_bucket(&["alpha", "beta", "gamma"], &["us-east-1"], "owned", false);
    for test in ["alpha", "beta", "gamma"] {
        buckets.insert(
            test,
            "eu-west-1",
            Bucket {
                name: "owned-eu-west-1".to_owned(),
                region: "eu-west-1".to_owned(),
                regional_buckets: true,
            },
        );
    }
    let cloud = Arc::new(SimulatedCloud::new().with_buckets(buckets));
    let mut run = started(&cloud, THREE_TESTS, EndOptions::default()).await;

    run.end().await.unwrap();

    assert_eq!(deleted_buckets(&cloud.calls()), vec!["owned"]);
}

#[tokio::test]
async fn test_e2e_generated_regional_buckets_are_all_aliases() {
    let cloud = Arc::new(SimulatedCloud::new());
    let mut cfg = config(THREE_TESTS);
    cfg.project.s3_regional_buckets = true;
    let mut run = build_run(&cloud, cfg, StartOptions::default(), EndOptions::default());
    run.start().await.unwrap();

    run.end().await.unwrap();

    assert!(deleted_buckets(&cloud.calls()).is_empty());
}

#[tokio::test]
async fn test_e2e_filtered_out_tests_keep_their_buckets() {
    // Given: each test has its own bucket, but only alpha runs
    let mut buckets = shared_bucket(&["alpha"], &["us-east-1", "eu-west-1"], "bucket-alpha", false);
    for test in ["beta", "gamma"] {
        buckets.insert(
            test,
            "us-east-1",
            Bucket {
                name: format!("bucket-{test}"),
                region: "us-east-1".to_owned(),
                regional_buckets: false,
            },
        );
    }
    let cloud = Arc::new(SimulatedCloud::new().with_buckets(buckets));
    let mut run = build_run(
        &cloud,
        config(THREE_TESTS),
        StartOptions {
            test_names: stackrun_core::Selection::parse("alpha"),
            ..StartOptions::default()
        },
        EndOptions::default(),
    );
    run.start().await.unwrap();

    // When
    run.end().await.unwrap();

    // Then
    assert_eq!(deleted_buckets(&cloud.calls()), vec!["bucket-alpha"]);
}

#[tokio::test]
async fn test_e2e_no_delete_keeps_buckets_unless_keep_failed_and_clean() {
    // no_delete alone: buckets stay
    let cloud = Arc::new(SimulatedCloud::new());
    let mut run = started(&cloud, SINGLE_TEST, end_options(true, false)).await;
    run.end().await.unwrap();
    assert!(deleted_buckets(&cloud.calls()).is_empty());

    // no_delete + keep_failed with no failed stacks: buckets are cleaned
    let cloud = Arc::new(SimulatedCloud::new());
    let mut run = started(&cloud, SINGLE_TEST, end_options(true, true)).await;
    run.end().await.unwrap();
    assert_eq!(deleted_buckets(&cloud.calls()).len(), 1);
    assert_no_stack_delete(&cloud.calls());

    // no_delete + keep_failed with a failed stack: buckets stay
    let cloud = Arc::new(SimulatedCloud::new().with_failing_test("one"));
    let mut run = started(&cloud, SINGLE_TEST, end_options(true, true)).await;
    let err = run.end().await.unwrap_err();
    assert!(matches!(err, StackrunError::StacksFailed { .. }));
    assert!(deleted_buckets(&cloud.calls()).is_empty());
}

// ---------------------------------------------------------------------------
// Final failure check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_e2e_final_check_uses_post_deletion_snapshot() {
    // Given: every stack created fine, but deletion fails
    let cloud = Arc::new(SimulatedCloud::new().with_failing_delete("one"));
    let mut run = started(&cloud, SINGLE_TEST, EndOptions::default()).await;

    // When
    let err = run.end().await.unwrap_err();

    // Then: the failure only shows up in the fresh snapshot
    assert_eq!(err.failed_stacks().len(), 2);
    let calls = cloud.calls();
    let delete = position(&calls, "delete", |c| matches!(c, CloudCall::Delete(_)));
    let bucket = position(&calls, "bucket delete", |c| {
        matches!(c, CloudCall::DeleteBucket { .. })
    });
    let last_status = last_position(&calls, "status", |c| *c == CloudCall::Status);
    assert!(last_status > delete);
    assert!(last_status > bucket);
    assert_eq!(count(&calls, |c| *c == CloudCall::Status), 2);
    assert!(!run.passed());
}

#[tokio::test]
async fn test_e2e_failed_creates_resolved_by_delete_pass() {
    // Given: a create failure, and default delete-all teardown
    let cloud = Arc::new(SimulatedCloud::new().with_failing_test("one"));
    let mut run = started(&cloud, SINGLE_TEST, EndOptions::default()).await;

    // When
    let result = run.end().await;

    // Then: pre-deletion FAILED does not decide the outcome
    assert!(result.is_ok(), "{result:?}");
    assert!(run.passed());
}
