//! 협력자 trait: 오케스트레이터가 사용하는 외부 구성 요소의 계약
//!
//! 모든 trait은 `BoxFuture`를 반환하여 dyn-compatible하게 정의합니다.
//! 오케스트레이터는 [`Toolchain`]에 `Arc<dyn …>`으로 협력자를 보관합니다.
//!
//! # 구성 요소
//! ```text
//! Linter ─> Packager ─> Stager        (preflight)
//! BucketStore                          (버킷 해석/삭제)
//! Provisioner ─> ProvisioningHandle    (스택 생성/상태/삭제)
//! ProgressReporter                     (진행 상황 출력, 블로킹)
//! EventLogExporter, Reporter           (리포트)
//! ```

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::client::ClientCache;
use crate::error::ProviderError;
use crate::resolve::RunConfig;
use crate::types::{
    Bucket, BucketRegistry, LintReport, StackEvent, StackFilter, StackRecord, StatusSnapshot,
    Template, TestDefinition,
};

/// `Send` 가능한 boxed future
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// 협력자 호출 결과
pub type ProviderResult<T> = Result<T, ProviderError>;

/// 템플릿 linter
pub trait Linter: Send + Sync {
    /// 해석된 모든 템플릿을 검사합니다.
    fn lint<'a>(
        &'a self,
        config: &'a RunConfig,
        templates: &'a [Template],
    ) -> BoxFuture<'a, ProviderResult<LintReport>>;

    /// 사람이 읽을 수 있는 형태로 결과를 출력합니다.
    fn output_results(&self, report: &LintReport);
}

/// 배포 아티팩트 패키저 (lambda 등)
pub trait Packager: Send + Sync {
    /// 프로젝트 루트에서 아티팩트를 빌드합니다. 실패는 그대로 전파됩니다.
    fn package<'a>(
        &'a self,
        config: &'a RunConfig,
        project_root: &'a Path,
    ) -> BoxFuture<'a, ProviderResult<()>>;
}

/// 프로젝트 아티팩트 스테이징 (버킷 동기화)
pub trait Stager: Send + Sync {
    /// 프로젝트 루트를 버킷의 `project_name` prefix 아래로 동기화합니다.
    fn stage<'a>(
        &'a self,
        buckets: &'a BucketRegistry,
        project_name: &'a str,
        project_root: &'a Path,
    ) -> BoxFuture<'a, ProviderResult<()>>;
}

/// 스테이징 버킷 저장소
pub trait BucketStore: Send + Sync {
    /// 설정으로부터 테스트/리전별 버킷을 해석합니다.
    fn resolve<'a>(
        &'a self,
        config: &'a RunConfig,
        clients: &'a ClientCache,
    ) -> BoxFuture<'a, ProviderResult<BucketRegistry>>;

    /// 버킷을 삭제합니다. `delete_objects`가 true면 내용물도 함께 비웁니다.
    fn delete<'a>(&'a self, bucket: &'a Bucket, delete_objects: bool)
    -> BoxFuture<'a, ProviderResult<()>>;
}

/// 프로비저닝 옵션
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionOptions {
    /// 짧은 스택 이름 사용
    pub shorten_stack_name: bool,
    /// S3 SigV2 서명 사용
    pub enable_sig_v2: bool,
}

/// 프로비저너: 테스트 정의로부터 프로비저닝 핸들을 만듭니다.
pub trait Provisioner: Send + Sync {
    /// 실행당 한 번 호출되어 핸들을 생성합니다. 스택은 아직 만들지 않습니다.
    fn provision(
        &self,
        project_name: &str,
        tests: Vec<TestDefinition>,
        options: ProvisionOptions,
    ) -> ProviderResult<Box<dyn ProvisioningHandle>>;
}

/// 실행 하나의 모든 스택을 추적하는 핸들
pub trait ProvisioningHandle: Send + Sync {
    /// 모든 스택 생성을 요청합니다.
    fn create(&mut self) -> BoxFuture<'_, ProviderResult<()>>;

    /// 현재 상태 스냅샷을 반환합니다.
    fn status(&self) -> BoxFuture<'_, ProviderResult<StatusSnapshot>>;

    /// 필터에 해당하는 스택 삭제를 요청합니다.
    fn delete(&mut self, filter: StackFilter) -> BoxFuture<'_, ProviderResult<()>>;

    /// 스택 레코드 목록
    fn stacks(&self) -> BoxFuture<'_, ProviderResult<Vec<StackRecord>>>;

    /// 스택의 이벤트 로그
    fn events<'a>(&'a self, stack: &'a StackRecord)
    -> BoxFuture<'a, ProviderResult<Vec<StackEvent>>>;
}

/// 진행 상황 출력 (블로킹)
pub trait ProgressReporter: Send + Sync {
    /// 스택이 안정될 때까지 진행 상황을 출력합니다.
    fn report_test_progress<'a>(
        &'a self,
        handle: &'a dyn ProvisioningHandle,
    ) -> BoxFuture<'a, ProviderResult<()>>;
}

/// 스택 이벤트 로그 내보내기
pub trait EventLogExporter: Send + Sync {
    /// 핸들의 모든 스택 이벤트 로그를 디렉토리에 기록합니다.
    fn export<'a>(
        &'a self,
        handle: &'a dyn ProvisioningHandle,
        output_dir: &'a Path,
    ) -> BoxFuture<'a, ProviderResult<()>>;
}

/// 최종 리포트 렌더러
pub trait Reporter: Send + Sync {
    /// 핸들의 최종 상태로 리포트를 생성합니다.
    fn generate_report<'a>(
        &'a self,
        handle: &'a dyn ProvisioningHandle,
        output_path: &'a Path,
    ) -> BoxFuture<'a, ProviderResult<()>>;
}

/// 실행에 필요한 협력자 묶음
#[derive(Clone)]
pub struct Toolchain {
    pub linter: Arc<dyn Linter>,
    pub packager: Arc<dyn Packager>,
    pub stager: Arc<dyn Stager>,
    pub buckets: Arc<dyn BucketStore>,
    pub provisioner: Arc<dyn Provisioner>,
    pub progress: Arc<dyn ProgressReporter>,
    pub event_logs: Arc<dyn EventLogExporter>,
    pub reporter: Arc<dyn Reporter>,
}
