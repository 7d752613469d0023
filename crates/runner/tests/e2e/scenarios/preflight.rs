//! Preflight E2E tests: upload guard, lint gating, packaging and staging order.

use std::sync::Arc;

use crate::helpers::assertions::*;
use crate::helpers::fixtures::*;

use stackrun_core::types::{LintFinding, LintReport};
use stackrun_core::{ConfigError, StackrunError};
use stackrun_runner::{CloudCall, EndOptions, SimulatedCloud, StartOptions};

fn finding(message: &str) -> LintFinding {
    LintFinding {
        test: "one".to_owned(),
        template: "/work/project/templates/main.yaml".into(),
        message: message.to_owned(),
    }
}

#[tokio::test]
async fn test_e2e_skip_upload_without_bucket_fails_before_any_work() {
    // Given: skip_upload requested and no s3_bucket configured
    let cloud = Arc::new(SimulatedCloud::new());
    let mut run = build_run(
        &cloud,
        config(SINGLE_TEST),
        StartOptions {
            skip_upload: true,
            ..StartOptions::default()
        },
        EndOptions::default(),
    );

    // When: starting the run
    let err = run.start().await.unwrap_err();

    // Then: configuration error, nothing touched the cloud (not even lint)
    assert!(matches!(
        err,
        StackrunError::Config(ConfigError::MissingBucket)
    ));
    assert!(cloud.calls().is_empty(), "calls: {:?}", cloud.calls());
    assert!(run.handle().is_none());
    assert!(!run.passed());
}

#[tokio::test]
async fn test_e2e_skip_upload_with_bucket_skips_preflight() {
    let cloud = Arc::new(SimulatedCloud::new());
    let mut cfg = config(SINGLE_TEST);
    cfg.project.s3_bucket = "existing-bucket".to_owned();
    cfg.project.package_lambda = true;
    let mut run = build_run(
        &cloud,
        cfg,
        StartOptions {
            skip_upload: true,
            ..StartOptions::default()
        },
        EndOptions::default(),
    );

    run.start().await.unwrap();

    let calls = cloud.calls();
    assert_eq!(
        count(&calls, |c| matches!(
            c,
            CloudCall::Lint { .. } | CloudCall::Package | CloudCall::Stage { .. }
        )),
        0
    );
    assert_eq!(count(&calls, |c| *c == CloudCall::Create), 1);
}

#[tokio::test]
async fn test_e2e_lint_errors_block_provisioning() {
    // Given: linter reports two errors
    let cloud = Arc::new(SimulatedCloud::new().with_lint_report(LintReport {
        warnings: vec![finding("deprecated runtime")],
        errors: vec![finding("missing property"), finding("bad ref")],
        passed: false,
    }));
    let mut run = default_run(&cloud, SINGLE_TEST);

    // When
    let err = run.start().await.unwrap_err();

    // Then: validation error, results were printed, create never invoked
    assert!(matches!(
        err,
        StackrunError::LintFailed {
            errors: 2,
            warnings: 1
        }
    ));
    assert!(err.to_string().contains("lint failed with errors"));
    let calls = cloud.calls();
    assert_eq!(count(&calls, |c| *c == CloudCall::LintOutput), 1);
    assert_eq!(
        count(&calls, |c| matches!(
            c,
            CloudCall::Provision { .. } | CloudCall::Create | CloudCall::Stage { .. }
        )),
        0
    );
}

#[tokio::test]
async fn test_e2e_lint_reported_failure_without_errors_blocks() {
    let cloud = Arc::new(SimulatedCloud::new().with_lint_report(LintReport {
        warnings: Vec::new(),
        errors: Vec::new(),
        passed: false,
    }));
    let mut run = default_run(&cloud, SINGLE_TEST);

    let err = run.start().await.unwrap_err();

    assert!(matches!(
        err,
        StackrunError::LintFailed { errors: 0, .. }
    ));
    assert_eq!(count(&cloud.calls(), |c| *c == CloudCall::Create), 0);
}

#[tokio::test]
async fn test_e2e_lint_warnings_only_pass() {
    let cloud = Arc::new(SimulatedCloud::new().with_lint_report(LintReport {
        warnings: vec![finding("style")],
        errors: Vec::new(),
        passed: true,
    }));
    let mut run = default_run(&cloud, SINGLE_TEST);

    run.start().await.unwrap();

    assert!(run.passed());
}

#[tokio::test]
async fn test_e2e_lint_disable_skips_linter_but_stages() {
    let cloud = Arc::new(SimulatedCloud::new());
    let mut run = build_run(
        &cloud,
        config(SINGLE_TEST),
        StartOptions {
            lint_disable: true,
            ..StartOptions::default()
        },
        EndOptions::default(),
    );

    run.start().await.unwrap();

    let calls = cloud.calls();
    assert_eq!(
        count(&calls, |c| matches!(c, CloudCall::Lint { .. } | CloudCall::LintOutput)),
        0
    );
    assert_eq!(
        count(&calls, |c| *c
            == CloudCall::Stage {
                project: "demo".to_owned()
            }),
        1
    );
}

#[tokio::test]
async fn test_e2e_preflight_runs_in_fixed_order() {
    // Given: lambda packaging enabled
    let cloud = Arc::new(SimulatedCloud::new());
    let mut cfg = config(SINGLE_TEST);
    cfg.project.package_lambda = true;
    let mut run = build_run(&cloud, cfg, StartOptions::default(), EndOptions::default());

    // When
    run.start().await.unwrap();

    // Then: resolve → lint → output → package → stage → provision → create → progress
    assert_eq!(
        cloud.calls(),
        vec![
            CloudCall::ResolveBuckets,
            CloudCall::Lint { templates: 1 },
            CloudCall::LintOutput,
            CloudCall::Package,
            CloudCall::Stage {
                project: "demo".to_owned()
            },
            CloudCall::Provision { tests: 1 },
            CloudCall::Create,
            CloudCall::Progress,
        ]
    );
}

#[tokio::test]
async fn test_e2e_package_failure_propagates() {
    let cloud = Arc::new(SimulatedCloud::new().with_failing_package());
    let mut cfg = config(SINGLE_TEST);
    cfg.project.package_lambda = true;
    let mut run = build_run(&cloud, cfg, StartOptions::default(), EndOptions::default());

    let err = run.start().await.unwrap_err();

    match err {
        StackrunError::Provider(e) => assert_eq!(e.component, "packager"),
        other => panic!("expected provider error, got {other:?}"),
    }
    let calls = cloud.calls();
    assert_eq!(
        count(&calls, |c| matches!(
            c,
            CloudCall::Stage { .. } | CloudCall::Create
        )),
        0
    );
}

#[tokio::test]
async fn test_e2e_package_skipped_when_not_requested() {
    let cloud = Arc::new(SimulatedCloud::new().with_failing_package());
    let mut run = default_run(&cloud, SINGLE_TEST);

    run.start().await.unwrap();

    assert_eq!(count(&cloud.calls(), |c| *c == CloudCall::Package), 0);
}
