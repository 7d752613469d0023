//! 테스트 실행 오케스트레이터: 실행 하나의 전체 생명주기 관리
//!
//! [`TestRun`]은 필터링, 사전 점검, 프로비저닝, 정리, 리포트를 순서대로 실행합니다.
//! 각 단계는 이전 단계가 끝난 뒤에 시작하며, 오케스트레이터 자체는 재시도하지 않습니다.
//!
//! # 실행 순서
//! ```text
//! start:  filter → upload guard → templates → buckets → preflight
//!         → regions → parameters → provision → create → progress
//! end:    status(pre) → stack teardown → [progress] → bucket teardown
//!         → status(post) → fail if FAILED
//! report: output dir → event logs → index.html
//! ```
//!
//! # 사용 예시
//! ```ignore
//! use stackrun_runner::{TestRun, StartOptions, EndOptions};
//!
//! let mut run = TestRun::builder()
//!     .config(config)
//!     .project_root("./project")
//!     .toolchain(toolchain)
//!     .build()?;
//!
//! run.start().await?;
//! run.report(None).await?;
//! run.end().await?;
//! ```

use std::path::{Path, PathBuf};

use metrics::counter;
use tracing::{debug, info, warn};
use uuid::Uuid;

use stackrun_core::client::ClientCache;
use stackrun_core::config::{ConfigOverrides, StackrunConfig};
use stackrun_core::error::{ConfigError, StackrunError};
use stackrun_core::filter::Selection;
use stackrun_core::metrics as m;
use stackrun_core::provider::{ProvisionOptions, ProvisioningHandle, Toolchain};
use stackrun_core::resolve::RunConfig;
use stackrun_core::types::{BucketRegistry, StackRecord};

use crate::preflight::{self, PreflightOptions};
use crate::report;
use crate::teardown::{self, StackTeardown};

/// `start` 단계 옵션
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartOptions {
    /// 실행할 테스트 (`ALL`이면 전체)
    pub test_names: Selection,
    /// 실행할 리전 (`ALL`이면 전체)
    pub regions: Selection,
    /// lint/package/stage 생략, 기존 버킷 사용
    pub skip_upload: bool,
    /// lint 생략
    pub lint_disable: bool,
}

/// `end` 단계 옵션
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndOptions {
    /// 스택과 버킷을 삭제하지 않음
    pub no_delete: bool,
    /// 실패한 스택은 남기고 완료된 스택만 삭제
    pub keep_failed: bool,
    /// 삭제 요청 후 완료를 기다리지 않음
    pub dont_wait_for_delete: bool,
}

impl Default for EndOptions {
    fn default() -> Self {
        Self {
            no_delete: false,
            keep_failed: false,
            dont_wait_for_delete: true,
        }
    }
}

/// 테스트 실행 하나
///
/// 프로비저닝 핸들은 `start`에서 한 번만 만들어지며 다시 만들지 않습니다.
pub struct TestRun {
    config: RunConfig,
    toolchain: Toolchain,
    start_options: StartOptions,
    end_options: EndOptions,
    handle: Option<Box<dyn ProvisioningHandle>>,
    buckets: BucketRegistry,
    passed: bool,
    result: Vec<StackRecord>,
}

impl TestRun {
    /// 빌더를 생성합니다.
    pub fn builder() -> TestRunBuilder {
        TestRunBuilder::new()
    }

    /// 설정 파일에서 실행을 만듭니다.
    ///
    /// `input_file`은 `project_root` 기준 경로입니다. 환경변수 오버라이드를 적용한 뒤
    /// `overrides`를 최고 우선순위로 적용합니다.
    pub async fn from_file(
        project_root: impl Into<PathBuf>,
        input_file: impl AsRef<Path>,
        overrides: ConfigOverrides,
        toolchain: Toolchain,
    ) -> Result<Self, StackrunError> {
        let project_root = project_root.into();
        let mut config = StackrunConfig::from_file(project_root.join(input_file)).await?;
        config.apply_env_overrides();
        TestRunBuilder::new()
            .config(config)
            .project_root(project_root)
            .overrides(overrides)
            .toolchain(toolchain)
            .build()
    }

    /// 이미 구성된 TOML 테이블에서 실행을 만듭니다.
    ///
    /// 환경변수 오버라이드는 적용하지 않습니다.
    pub fn from_table(
        table: toml::Table,
        project_root: impl Into<PathBuf>,
        overrides: ConfigOverrides,
        toolchain: Toolchain,
    ) -> Result<Self, StackrunError> {
        let config = StackrunConfig::from_table(table)?;
        TestRunBuilder::new()
            .config(config)
            .project_root(project_root)
            .overrides(overrides)
            .toolchain(toolchain)
            .build()
    }

    /// 실행 설정 (필터 적용 후)
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// 실행 고유 ID
    pub fn uid(&self) -> Uuid {
        self.config.uid()
    }

    /// `start` 옵션
    pub fn start_options(&self) -> &StartOptions {
        &self.start_options
    }

    /// `end` 옵션
    pub fn end_options(&self) -> &EndOptions {
        &self.end_options
    }

    /// 프로비저닝 핸들 (`start` 이후에만 존재)
    pub fn handle(&self) -> Option<&dyn ProvisioningHandle> {
        self.handle.as_deref()
    }

    /// 실행 통과 여부
    ///
    /// `start`가 성공하면 true가 되고, `end`의 재확인에서 실패 스택이 있으면 false가 됩니다.
    pub fn passed(&self) -> bool {
        self.passed
    }

    /// `start` 직후의 스택 레코드
    pub fn result(&self) -> &[StackRecord] {
        &self.result
    }

    /// 리소스를 생성하여 실행을 시작합니다.
    pub async fn start(&mut self) -> Result<(), StackrunError> {
        if self.handle.is_some() {
            return Err(StackrunError::RunState(
                "run already started, provisioning handle exists".to_owned(),
            ));
        }

        let options = self.start_options.clone();
        self.config.filter(&options.test_names, &options.regions);
        preflight::check_upload_guard(&self.config, options.skip_upload)?;

        let clients = ClientCache::with_sig_v2(self.config.project().s3_enable_sig_v2);
        let templates = self.config.templates();
        let buckets = self
            .toolchain
            .buckets
            .resolve(&self.config, &clients)
            .await?;
        self.buckets = self.config.scope_buckets(&buckets);

        preflight::run(
            &self.toolchain,
            &self.config,
            &templates,
            &self.buckets,
            PreflightOptions {
                skip_upload: options.skip_upload,
                lint_disable: options.lint_disable,
            },
        )
        .await?;

        let regions = self.config.regions(&clients);
        let parameters = self
            .config
            .rendered_parameters(&self.buckets, &regions, &templates);
        let tests = self
            .config
            .test_definitions(&templates, &regions, &self.buckets, &parameters);
        let stack_count: usize = tests.iter().map(|t| t.regions.len()).sum();
        debug!(tests = tests.len(), stacks = stack_count, "resolved test definitions");

        let project = self.config.project();
        let handle = self.toolchain.provisioner.provision(
            project.name.as_str(),
            tests,
            ProvisionOptions {
                shorten_stack_name: project.shorten_stack_name,
                enable_sig_v2: project.s3_enable_sig_v2,
            },
        )?;
        let handle = self.handle.insert(handle);

        handle.create().await?;
        counter!(m::STACKS_PROVISIONED_TOTAL).increment(stack_count as u64);
        info!(
            uid = %self.config.uid(),
            project = self.config.project_name(),
            stacks = stack_count,
            "stack creation issued"
        );

        self.toolchain
            .progress
            .report_test_progress(&**handle)
            .await?;

        self.passed = true;
        self.result = handle.stacks().await?;
        Ok(())
    }

    /// 테스트 리소스를 삭제하여 실행을 끝냅니다.
    ///
    /// 삭제 이후 새로 가져온 상태에 실패한 스택이 남아 있으면
    /// [`StackrunError::StacksFailed`]를 반환합니다.
    pub async fn end(&mut self) -> Result<(), StackrunError> {
        let Some(handle) = self.handle.as_mut() else {
            return Err(StackrunError::RunState(
                "run has not been started".to_owned(),
            ));
        };
        let options = self.end_options;

        let pre = handle.status().await?;

        // 스택 정리
        let policy = StackTeardown::decide(options.no_delete, options.keep_failed);
        match policy.delete_filter(&pre) {
            Some(filter) => {
                info!(policy = %policy, "deleting stacks");
                handle.delete(filter).await?;
                counter!(m::STACK_DELETE_REQUESTS_TOTAL, m::LABEL_POLICY => policy.as_str())
                    .increment(1);
            }
            None if policy == StackTeardown::Skip => {
                info!("skipping stack delete, no_delete is set");
            }
            None => debug!("no completed stacks to delete"),
        }

        if !options.dont_wait_for_delete {
            self.toolchain
                .progress
                .report_test_progress(&**handle)
                .await?;
        }

        // 버킷 정리
        if teardown::should_delete_buckets(options.no_delete, options.keep_failed, &pre) {
            let buckets = self.config.scope_buckets(&self.buckets);
            let ledger =
                teardown::delete_buckets(self.toolchain.buckets.as_ref(), &buckets).await?;
            debug!(deleted = ledger.len(), "bucket teardown finished");
        }

        // 삭제 이후 상태 재확인
        let post = handle.status().await?;
        if !post.failed().is_empty() {
            self.passed = false;
            counter!(m::RUNS_TOTAL, m::LABEL_RESULT => "failed").increment(1);
            warn!(failed = ?post.failed(), "stacks failed");
            return Err(StackrunError::StacksFailed {
                stacks: post.failed().to_vec(),
            });
        }

        counter!(m::RUNS_TOTAL, m::LABEL_RESULT => "passed").increment(1);
        info!(uid = %self.config.uid(), "test run finished");
        Ok(())
    }

    /// 스택 상태 리포트를 생성합니다.
    ///
    /// `output_dir`이 없으면 `./stackrun_outputs`를 사용합니다. pass/fail 판정에는
    /// 영향을 주지 않습니다.
    pub async fn report(&self, output_dir: Option<&Path>) -> Result<PathBuf, StackrunError> {
        let handle = self.handle.as_deref().ok_or_else(|| {
            StackrunError::RunState("no provisioning handle to report on".to_owned())
        })?;

        let dir = report::prepare_output_dir(output_dir).await?;
        self.toolchain.event_logs.export(handle, &dir).await?;
        let index = dir.join(report::INDEX_FILE);
        self.toolchain.reporter.generate_report(handle, &index).await?;
        Ok(index)
    }

    /// 시작, 리포트, 정리를 한 번에 실행합니다.
    ///
    /// 스택 생성 이후에 `start`가 실패하면 정리를 실행한 뒤 `start` 에러를 반환합니다.
    /// 리포트가 실패해도 정리는 실행되며, 정리 에러가 리포트 에러보다 우선합니다.
    pub async fn execute(&mut self, output_dir: Option<&Path>) -> Result<PathBuf, StackrunError> {
        if let Err(e) = self.start().await {
            if self.handle.is_some() {
                warn!(error = %e, "start failed after provisioning, tearing down");
                if let Err(teardown) = self.end().await {
                    warn!(error = %teardown, "teardown after failed start also failed");
                }
            }
            return Err(e);
        }
        let reported = self.report(output_dir).await;
        self.end().await?;
        reported
    }
}

/// 테스트 실행 빌더
pub struct TestRunBuilder {
    config: Option<StackrunConfig>,
    project_root: PathBuf,
    overrides: ConfigOverrides,
    toolchain: Option<Toolchain>,
    start_options: StartOptions,
    end_options: EndOptions,
    uid: Option<Uuid>,
}

impl TestRunBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: None,
            project_root: PathBuf::from("."),
            overrides: ConfigOverrides::default(),
            toolchain: None,
            start_options: StartOptions::default(),
            end_options: EndOptions::default(),
            uid: None,
        }
    }

    /// 프로젝트 설정을 지정합니다.
    pub fn config(mut self, config: StackrunConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// 프로젝트 루트를 지정합니다 (기본값 `.`). `build` 시 절대 경로로 바뀝니다.
    pub fn project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = root.into();
        self
    }

    /// 최고 우선순위 오버라이드를 지정합니다.
    pub fn overrides(mut self, overrides: ConfigOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// 협력자 묶음을 지정합니다.
    pub fn toolchain(mut self, toolchain: Toolchain) -> Self {
        self.toolchain = Some(toolchain);
        self
    }

    /// `start` 옵션을 지정합니다.
    pub fn start_options(mut self, options: StartOptions) -> Self {
        self.start_options = options;
        self
    }

    /// `end` 옵션을 지정합니다.
    pub fn end_options(mut self, options: EndOptions) -> Self {
        self.end_options = options;
        self
    }

    /// 실행 uid를 고정합니다. 지정하지 않으면 새로 생성합니다.
    pub fn uid(mut self, uid: Uuid) -> Self {
        self.uid = Some(uid);
        self
    }

    /// 실행을 빌드합니다.
    ///
    /// 오버라이드를 적용한 뒤 설정을 검증합니다.
    pub fn build(self) -> Result<TestRun, StackrunError> {
        let mut config = self.config.ok_or_else(|| ConfigError::InvalidValue {
            field: "config".to_owned(),
            reason: "project config must be provided".to_owned(),
        })?;
        let toolchain = self.toolchain.ok_or_else(|| ConfigError::InvalidValue {
            field: "toolchain".to_owned(),
            reason: "toolchain must be provided".to_owned(),
        })?;

        config.apply_overrides(&self.overrides);
        config.validate()?;

        // 템플릿 경로가 현재 디렉토리에 의존하지 않도록 절대 경로로 고정
        let project_root = std::path::absolute(&self.project_root)?;
        let config = match self.uid {
            Some(uid) => RunConfig::with_uid(config, project_root, uid),
            None => RunConfig::new(config, project_root),
        };
        debug!(uid = %config.uid(), tests = config.tests().len(), "built test run");

        Ok(TestRun {
            config,
            toolchain,
            start_options: self.start_options,
            end_options: self.end_options,
            handle: None,
            buckets: BucketRegistry::new(),
            passed: false,
            result: Vec::new(),
        })
    }
}

impl Default for TestRunBuilder {
    fn default() -> Self {
        Self::new()
    }
}
