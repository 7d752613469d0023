//! 시뮬레이션 클라우드: 모든 협력자 trait의 프로세스 내 구현
//!
//! 실제 클라우드 없이 전체 실행 생명주기를 돌려볼 수 있습니다.
//! 모든 호출은 공유 [`CallLog`]에 순서대로 기록되어 테스트에서 검증할 수 있고,
//! lint 결과, 패키징 실패, 생성/삭제 실패 테스트를 설정할 수 있습니다.
//!
//! # 사용 예시
//! ```
//! use std::sync::Arc;
//! use stackrun_runner::simulated::SimulatedCloud;
//!
//! let cloud = Arc::new(SimulatedCloud::new().with_failing_test("broken"));
//! let toolchain = cloud.toolchain();
//! assert!(cloud.calls().is_empty());
//! # let _ = toolchain;
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use tracing::{debug, info, warn};
use uuid::Uuid;

use stackrun_core::client::ClientCache;
use stackrun_core::error::ProviderError;
use stackrun_core::provider::{
    BoxFuture, BucketStore, Linter, Packager, ProgressReporter, ProviderResult, ProvisionOptions,
    Provisioner, ProvisioningHandle, Stager, Toolchain,
};
use stackrun_core::resolve::{self, RunConfig};
use stackrun_core::types::{
    Bucket, BucketRegistry, LintReport, StackEvent, StackFilter, StackRecord, StackStatus,
    StatusSnapshot, Template, TestDefinition,
};

use crate::report::{FileEventLogs, IndexReporter};

/// 시뮬레이션 클라우드에 기록되는 호출
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloudCall {
    /// `Linter::lint`
    Lint { templates: usize },
    /// `Linter::output_results`
    LintOutput,
    /// `Packager::package`
    Package,
    /// `Stager::stage`
    Stage { project: String },
    /// `BucketStore::resolve`
    ResolveBuckets,
    /// `BucketStore::delete`
    DeleteBucket { name: String, delete_objects: bool },
    /// `Provisioner::provision`
    Provision { tests: usize },
    /// `ProvisioningHandle::create`
    Create,
    /// `ProvisioningHandle::status`
    Status,
    /// `ProvisioningHandle::delete`
    Delete(StackFilter),
    /// `ProgressReporter::report_test_progress`
    Progress,
}

/// 공유 호출 기록
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<CloudCall>>>);

impl CallLog {
    fn push(&self, call: CloudCall) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    /// 지금까지 기록된 호출 목록
    pub fn snapshot(&self) -> Vec<CloudCall> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// 시뮬레이션 클라우드
#[derive(Debug, Default)]
pub struct SimulatedCloud {
    log: CallLog,
    lint_report: Option<LintReport>,
    fail_package: bool,
    failing_tests: HashSet<String>,
    failing_deletes: HashSet<String>,
    buckets: Option<BucketRegistry>,
}

impl SimulatedCloud {
    /// 모든 단계가 성공하는 클라우드를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// linter가 반환할 결과를 설정합니다.
    pub fn with_lint_report(mut self, report: LintReport) -> Self {
        self.lint_report = Some(report);
        self
    }

    /// 패키징이 실패하도록 설정합니다.
    pub fn with_failing_package(mut self) -> Self {
        self.fail_package = true;
        self
    }

    /// 테스트의 스택 생성이 실패하도록 설정합니다.
    pub fn with_failing_test(mut self, test: impl Into<String>) -> Self {
        self.failing_tests.insert(test.into());
        self
    }

    /// 테스트의 스택 삭제가 실패하도록 설정합니다.
    pub fn with_failing_delete(mut self, test: impl Into<String>) -> Self {
        self.failing_deletes.insert(test.into());
        self
    }

    /// 설정 대신 사용할 버킷 레지스트리를 지정합니다.
    pub fn with_buckets(mut self, buckets: BucketRegistry) -> Self {
        self.buckets = Some(buckets);
        self
    }

    /// 공유 호출 기록
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    /// 지금까지 기록된 호출 목록
    pub fn calls(&self) -> Vec<CloudCall> {
        self.log.snapshot()
    }

    /// 모든 협력자를 이 클라우드로 채운 toolchain을 만듭니다.
    ///
    /// 이벤트 로그와 리포트는 로컬 파일 구현([`FileEventLogs`], [`IndexReporter`])을 씁니다.
    pub fn toolchain(self: &Arc<Self>) -> Toolchain {
        Toolchain {
            linter: self.clone(),
            packager: self.clone(),
            stager: self.clone(),
            buckets: self.clone(),
            provisioner: self.clone(),
            progress: self.clone(),
            event_logs: Arc::new(FileEventLogs),
            reporter: Arc::new(IndexReporter),
        }
    }
}

impl Linter for SimulatedCloud {
    fn lint<'a>(
        &'a self,
        _config: &'a RunConfig,
        templates: &'a [Template],
    ) -> BoxFuture<'a, ProviderResult<LintReport>> {
        Box::pin(async move {
            self.log.push(CloudCall::Lint {
                templates: templates.len(),
            });
            Ok(self.lint_report.clone().unwrap_or_else(LintReport::clean))
        })
    }

    fn output_results(&self, report: &LintReport) {
        self.log.push(CloudCall::LintOutput);
        for finding in &report.warnings {
            warn!(test = %finding.test, template = %finding.template.display(), "{}", finding.message);
        }
        for finding in &report.errors {
            warn!(test = %finding.test, template = %finding.template.display(), error = true, "{}", finding.message);
        }
    }
}

impl Packager for SimulatedCloud {
    fn package<'a>(
        &'a self,
        _config: &'a RunConfig,
        project_root: &'a Path,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async move {
            self.log.push(CloudCall::Package);
            if self.fail_package {
                return Err(ProviderError::new(
                    "packager",
                    format!("failed to build artifacts in {}", project_root.display()),
                ));
            }
            Ok(())
        })
    }
}

impl Stager for SimulatedCloud {
    fn stage<'a>(
        &'a self,
        buckets: &'a BucketRegistry,
        project_name: &'a str,
        _project_root: &'a Path,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async move {
            self.log.push(CloudCall::Stage {
                project: project_name.to_owned(),
            });
            debug!(buckets = buckets.len(), "simulated staging");
            Ok(())
        })
    }
}

impl BucketStore for SimulatedCloud {
    fn resolve<'a>(
        &'a self,
        config: &'a RunConfig,
        _clients: &'a ClientCache,
    ) -> BoxFuture<'a, ProviderResult<BucketRegistry>> {
        Box::pin(async move {
            self.log.push(CloudCall::ResolveBuckets);
            Ok(self
                .buckets
                .clone()
                .unwrap_or_else(|| config.bucket_layout()))
        })
    }

    fn delete<'a>(
        &'a self,
        bucket: &'a Bucket,
        delete_objects: bool,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async move {
            self.log.push(CloudCall::DeleteBucket {
                name: bucket.name.clone(),
                delete_objects,
            });
            Ok(())
        })
    }
}

impl Provisioner for SimulatedCloud {
    fn provision(
        &self,
        project_name: &str,
        tests: Vec<TestDefinition>,
        options: ProvisionOptions,
    ) -> ProviderResult<Box<dyn ProvisioningHandle>> {
        self.log.push(CloudCall::Provision { tests: tests.len() });

        let suffix = Uuid::new_v4().simple().to_string()[..5].to_owned();
        let mut records = Vec::new();
        for test in &tests {
            let name = resolve::stack_name(
                project_name,
                &test.name,
                &suffix,
                options.shorten_stack_name,
            );
            for region in &test.regions {
                records.push(StackRecord {
                    id: format!("arn:sim:{}:stack/{name}", region.name),
                    name: name.clone(),
                    test: test.name.clone(),
                    region: region.name.clone(),
                    status: StackStatus::CreateInProgress,
                });
            }
        }
        info!(
            project = project_name,
            stacks = records.len(),
            "provisioned simulated stacks"
        );

        Ok(Box::new(SimulatedStacks {
            log: self.log.clone(),
            records,
            events: BTreeMap::new(),
            failing_tests: self.failing_tests.clone(),
            failing_deletes: self.failing_deletes.clone(),
        }))
    }
}

impl ProgressReporter for SimulatedCloud {
    fn report_test_progress<'a>(
        &'a self,
        _handle: &'a dyn ProvisioningHandle,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async move {
            self.log.push(CloudCall::Progress);
            Ok(())
        })
    }
}

/// 시뮬레이션 스택 핸들
///
/// 생성과 삭제는 요청 즉시 최종 상태로 전이합니다.
struct SimulatedStacks {
    log: CallLog,
    records: Vec<StackRecord>,
    events: BTreeMap<String, Vec<StackEvent>>,
    failing_tests: HashSet<String>,
    failing_deletes: HashSet<String>,
}

impl SimulatedStacks {
    fn transition(&mut self, index: usize, status: StackStatus, reason: &str) {
        let record = &mut self.records[index];
        record.status = status;
        self.events
            .entry(record.id.clone())
            .or_default()
            .push(StackEvent {
                timestamp: SystemTime::now(),
                resource: record.name.clone(),
                status,
                reason: reason.to_owned(),
            });
    }
}

impl ProvisioningHandle for SimulatedStacks {
    fn create(&mut self) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(async move {
            self.log.push(CloudCall::Create);
            for index in 0..self.records.len() {
                if self.records[index].status != StackStatus::CreateInProgress {
                    continue;
                }
                self.transition(index, StackStatus::CreateInProgress, "User Initiated");
                if self.failing_tests.contains(&self.records[index].test) {
                    self.transition(index, StackStatus::CreateFailed, "simulated create failure");
                } else {
                    self.transition(index, StackStatus::CreateComplete, "");
                }
            }
            Ok(())
        })
    }

    fn status(&self) -> BoxFuture<'_, ProviderResult<StatusSnapshot>> {
        Box::pin(async move {
            self.log.push(CloudCall::Status);
            Ok(StatusSnapshot::from_records(&self.records))
        })
    }

    fn delete(&mut self, filter: StackFilter) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(async move {
            self.log.push(CloudCall::Delete(filter));
            for index in 0..self.records.len() {
                let status = self.records[index].status;
                if !filter.matches(status) || status == StackStatus::DeleteComplete {
                    continue;
                }
                self.transition(index, StackStatus::DeleteInProgress, "User Initiated");
                if self.failing_deletes.contains(&self.records[index].test) {
                    self.transition(index, StackStatus::DeleteFailed, "simulated delete failure");
                } else {
                    self.transition(index, StackStatus::DeleteComplete, "");
                }
            }
            Ok(())
        })
    }

    fn stacks(&self) -> BoxFuture<'_, ProviderResult<Vec<StackRecord>>> {
        Box::pin(async move { Ok(self.records.clone()) })
    }

    fn events<'a>(
        &'a self,
        stack: &'a StackRecord,
    ) -> BoxFuture<'a, ProviderResult<Vec<StackEvent>>> {
        Box::pin(async move { Ok(self.events.get(&stack.id).cloned().unwrap_or_default()) })
    }
}
