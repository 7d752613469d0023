//! 메트릭 상수
//!
//! 모든 메트릭의 이름을 중앙에서 정의합니다.
//! 오케스트레이터는 이 상수로 `metrics::counter!()` 매크로를 호출합니다.
//! 레코더는 설치하지 않으며, 라이브러리를 사용하는 쪽에서 설치할 수 있습니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `stackrun_`
//! - 접미어: `_total` (counter)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(stackrun_core::metrics::STACKS_PROVISIONED_TOTAL).increment(3);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 결과 레이블 키 (passed, failed)
pub const LABEL_RESULT: &str = "result";

/// 심각도 레이블 키 (warning, error)
pub const LABEL_SEVERITY: &str = "severity";

/// 삭제 정책 레이블 키 (all, complete)
pub const LABEL_POLICY: &str = "policy";

// ─── 실행 메트릭 ───────────────────────────────────────────────────

/// 생성 요청된 스택 수 (counter)
pub const STACKS_PROVISIONED_TOTAL: &str = "stackrun_stacks_provisioned_total";

/// 스택 삭제 요청 수 (counter, label: policy)
pub const STACK_DELETE_REQUESTS_TOTAL: &str = "stackrun_stack_delete_requests_total";

/// 삭제된 버킷 수 (counter)
pub const BUCKETS_DELETED_TOTAL: &str = "stackrun_buckets_deleted_total";

/// lint 결과 항목 수 (counter, label: severity)
pub const LINT_FINDINGS_TOTAL: &str = "stackrun_lint_findings_total";

/// 완료된 실행 수 (counter, label: result)
pub const RUNS_TOTAL: &str = "stackrun_runs_total";

/// 모든 메트릭의 설명을 등록합니다.
///
/// 레코더를 설치한 직후 한 번 호출합니다. 레코더가 없으면 아무 일도 하지 않습니다.
pub fn describe_all() {
    use metrics::describe_counter;

    describe_counter!(
        STACKS_PROVISIONED_TOTAL,
        "Total stacks requested for creation"
    );
    describe_counter!(
        STACK_DELETE_REQUESTS_TOTAL,
        "Total stack delete requests issued during teardown"
    );
    describe_counter!(
        BUCKETS_DELETED_TOTAL,
        "Total staging buckets deleted during teardown"
    );
    describe_counter!(LINT_FINDINGS_TOTAL, "Total lint warnings and errors");
    describe_counter!(RUNS_TOTAL, "Total finished test runs by result");
}
