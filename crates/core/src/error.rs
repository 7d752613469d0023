//! 에러 타입: 실행 단계별 에러 정의
//!
//! 오케스트레이터가 밖으로 내보내는 최종 에러는 [`StackrunError`] 하나입니다.
//! 분류는 세 가지입니다.
//! - 설정 에러: 부수효과가 일어나기 전에 감지
//! - 검증 에러: lint 실패, 스택 생성 전에 감지
//! - 프로비저닝 결과 에러: teardown 이후 재확인한 상태에 실패한 스택이 남아 있음

/// stackrun 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum StackrunError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// lint 결과에 에러가 있거나 linter가 실패를 보고함
    #[error("lint failed with errors: {errors} error(s), {warnings} warning(s)")]
    LintFailed { warnings: usize, errors: usize },

    /// teardown 이후에도 FAILED 상태로 남은 스택이 있음
    #[error("one or more stacks failed: [{}]", .stacks.join(", "))]
    StacksFailed { stacks: Vec<String> },

    /// 외부 협력자(linter, packager, provisioner 등) 실패
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// 실행 순서 위반 (start 이전 end 호출 등)
    #[error("run state error: {0}")]
    RunState(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StackrunError {
    /// 실패한 스택 ID 목록을 반환합니다. 다른 에러 종류면 빈 슬라이스입니다.
    pub fn failed_stacks(&self) -> &[String] {
        match self {
            Self::StacksFailed { stacks } => stacks,
            _ => &[],
        }
    }
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// 업로드를 건너뛰려면 버킷이 지정되어 있어야 함
    #[error("cannot skip upload without specifying project.s3_bucket in config")]
    MissingBucket,
}

/// 외부 협력자 에러
///
/// 어느 협력자에서 실패했는지(`component`)와 사유를 담습니다.
/// 오케스트레이터는 이 에러를 재시도하지 않고 그대로 전파합니다.
#[derive(Debug, thiserror::Error)]
#[error("{component}: {reason}")]
pub struct ProviderError {
    /// 실패한 협력자 이름 (예: `"packager"`)
    pub component: String,
    /// 실패 사유
    pub reason: String,
}

impl ProviderError {
    /// 새 협력자 에러를 생성합니다.
    pub fn new(component: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            reason: reason.into(),
        }
    }
}
