//! 사전 점검 파이프라인: lint → package → stage
//!
//! 업로드를 건너뛰지 않을 때만 실행됩니다. 각 단계는 고정된 순서로 실행되며,
//! lint 에러가 있으면 클라우드 변경 전에 즉시 실패합니다.

use metrics::counter;
use tracing::{debug, info, warn};

use stackrun_core::metrics as m;
use stackrun_core::provider::Toolchain;
use stackrun_core::types::{BucketRegistry, Template};
use stackrun_core::{ConfigError, RunConfig, StackrunError};

/// 업로드 생략 조건을 검사합니다.
///
/// 업로드를 건너뛰려면 설정에 버킷이 지정되어 있어야 합니다.
/// 버킷 해석, lint, package, stage보다 먼저 호출되어야 합니다.
pub fn check_upload_guard(config: &RunConfig, skip_upload: bool) -> Result<(), StackrunError> {
    if skip_upload && !config.config().has_s3_bucket() {
        return Err(ConfigError::MissingBucket.into());
    }
    Ok(())
}

/// 사전 점검 단계 토글
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreflightOptions {
    /// 사전 점검 전체 생략 (기존 버킷의 템플릿 사용)
    pub skip_upload: bool,
    /// lint 생략
    pub lint_disable: bool,
}

/// 사전 점검 파이프라인을 실행합니다.
pub async fn run(
    toolchain: &Toolchain,
    config: &RunConfig,
    templates: &[Template],
    buckets: &BucketRegistry,
    options: PreflightOptions,
) -> Result<(), StackrunError> {
    if options.skip_upload {
        info!("skipping lint, packaging and staging, using existing bucket");
        return Ok(());
    }

    // 1. lint
    if options.lint_disable {
        debug!("lint disabled");
    } else {
        let report = toolchain.linter.lint(config, templates).await?;
        toolchain.linter.output_results(&report);

        counter!(m::LINT_FINDINGS_TOTAL, m::LABEL_SEVERITY => "warning")
            .increment(report.warnings.len() as u64);
        counter!(m::LINT_FINDINGS_TOTAL, m::LABEL_SEVERITY => "error")
            .increment(report.errors.len() as u64);

        if report.is_blocking() {
            warn!(
                errors = report.errors.len(),
                warnings = report.warnings.len(),
                passed = report.passed,
                "lint failed"
            );
            return Err(StackrunError::LintFailed {
                warnings: report.warnings.len(),
                errors: report.errors.len(),
            });
        }
        info!(warnings = report.warnings.len(), "lint passed");
    }

    // 2. lambda 패키징
    if config.project().package_lambda {
        info!("packaging lambda functions");
        toolchain
            .packager
            .package(config, config.project_root())
            .await?;
    }

    // 3. 스테이징
    toolchain
        .stager
        .stage(buckets, config.project_name(), config.project_root())
        .await?;
    info!(project = config.project_name(), "staged project artifacts");

    Ok(())
}
