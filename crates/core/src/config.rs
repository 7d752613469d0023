//! 설정 관리: .stackrun.toml 파싱 및 런타임 설정
//!
//! [`StackrunConfig`]는 프로젝트 정보와 테스트 목록을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. 호출자 오버라이드 ([`ConfigOverrides`], 최고 우선)
//! 2. 환경변수 (`STACKRUN_PROJECT_S3_BUCKET=my-bucket` 형식)
//! 3. 설정 파일 (`.stackrun.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), stackrun_core::error::StackrunError> {
//! use stackrun_core::config::StackrunConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = StackrunConfig::load(".stackrun.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = StackrunConfig::parse("[project]\nname = \"demo\"")?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, StackrunError};
use crate::filter::Selection;

/// stackrun 통합 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StackrunConfig {
    /// 일반 설정 (로깅)
    #[serde(default)]
    pub general: GeneralConfig,
    /// 프로젝트 설정
    #[serde(default)]
    pub project: ProjectConfig,
    /// 테스트 목록 (선언 순서 유지)
    #[serde(default)]
    pub tests: Vec<TestConfig>,
}

impl StackrunConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용한 뒤 검증합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, StackrunError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드, 검증 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, StackrunError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StackrunError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                StackrunError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, StackrunError> {
        toml::from_str(toml_str).map_err(|e| {
            StackrunError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 이미 구성된 TOML 테이블에서 설정을 만듭니다.
    ///
    /// 파일 없이 코드에서 설정을 조립할 때 사용합니다.
    pub fn from_table(table: toml::Table) -> Result<Self, StackrunError> {
        toml::Value::Table(table).try_into().map_err(|e: toml::de::Error| {
            StackrunError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `STACKRUN_{SECTION}_{FIELD}`
    /// 예: `STACKRUN_PROJECT_S3_BUCKET=my-bucket`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "STACKRUN_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "STACKRUN_GENERAL_LOG_FORMAT");

        // Project
        override_string(&mut self.project.name, "STACKRUN_PROJECT_NAME");
        override_csv(&mut self.project.regions, "STACKRUN_PROJECT_REGIONS");
        override_string(&mut self.project.template, "STACKRUN_PROJECT_TEMPLATE");
        override_string(&mut self.project.s3_bucket, "STACKRUN_PROJECT_S3_BUCKET");
        override_bool(
            &mut self.project.s3_regional_buckets,
            "STACKRUN_PROJECT_S3_REGIONAL_BUCKETS",
        );
        override_bool(
            &mut self.project.s3_enable_sig_v2,
            "STACKRUN_PROJECT_S3_ENABLE_SIG_V2",
        );
        override_bool(
            &mut self.project.package_lambda,
            "STACKRUN_PROJECT_PACKAGE_LAMBDA",
        );
        override_bool(
            &mut self.project.shorten_stack_name,
            "STACKRUN_PROJECT_SHORTEN_STACK_NAME",
        );
        override_string(
            &mut self.project.auth.default,
            "STACKRUN_PROJECT_AUTH_DEFAULT",
        );
    }

    /// 호출자 오버라이드를 최고 우선순위로 적용합니다.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if overrides.enable_sig_v2 {
            self.project.s3_enable_sig_v2 = true;
        }
        if let Selection::Only(regions) = &overrides.regions {
            self.project.regions = regions.clone();
        }
        if let Some(profile) = &overrides.default_profile {
            self.project.auth.default = profile.clone();
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), StackrunError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        // 프로젝트 이름은 버킷/스택 이름에 들어가므로 소문자, 숫자, '-'만 허용
        let name = &self.project.name;
        if name.is_empty() {
            return Err(invalid("project.name", "must not be empty".to_owned()));
        }
        let valid_chars = name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !valid_chars || name.starts_with('-') || name.ends_with('-') {
            return Err(invalid(
                "project.name",
                "must contain only lowercase letters, digits and '-', and must not start or end with '-'"
                    .to_owned(),
            ));
        }

        // 테스트 검증
        let mut seen = HashSet::new();
        for test in &self.tests {
            if test.name.is_empty() {
                return Err(invalid("tests.name", "must not be empty".to_owned()));
            }
            if !seen.insert(test.name.as_str()) {
                return Err(invalid(
                    "tests.name",
                    format!("duplicate test name '{}'", test.name),
                ));
            }
            if self.template_for(test).is_empty() {
                return Err(invalid(
                    &format!("tests.{}.template", test.name),
                    "no template set on the test or the project".to_owned(),
                ));
            }
            if self.regions_for(test).is_empty() {
                return Err(invalid(
                    &format!("tests.{}.regions", test.name),
                    "no regions set on the test or the project".to_owned(),
                ));
            }
        }

        Ok(())
    }

    /// 테스트에 적용되는 템플릿 경로 (테스트 값 우선, 없으면 프로젝트 값)
    pub fn template_for<'a>(&'a self, test: &'a TestConfig) -> &'a str {
        if test.template.is_empty() {
            &self.project.template
        } else {
            &test.template
        }
    }

    /// 테스트에 적용되는 리전 목록 (테스트 값 우선, 없으면 프로젝트 값)
    pub fn regions_for<'a>(&'a self, test: &'a TestConfig) -> &'a [String] {
        if test.regions.is_empty() {
            &self.project.regions
        } else {
            &test.regions
        }
    }

    /// 업로드를 건너뛸 때 사용할 버킷이 지정되어 있는지 확인합니다.
    ///
    /// 공백뿐인 값은 지정되지 않은 것으로 봅니다.
    pub fn has_s3_bucket(&self) -> bool {
        !self.project.s3_bucket.trim().is_empty()
    }

    /// 이름으로 테스트를 찾습니다.
    pub fn test(&self, name: &str) -> Option<&TestConfig> {
        self.tests.iter().find(|t| t.name == name)
    }
}

fn invalid(field: &str, reason: String) -> StackrunError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

/// 호출자가 전달하는 최상위 오버라이드
///
/// 기본 프로파일은 전역 상태가 아니라 이 구조체의 필드로 명시적으로 전달합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// S3 SigV2 서명 활성화
    pub enable_sig_v2: bool,
    /// 프로젝트 리전 목록 교체 (`ALL`이면 유지)
    pub regions: Selection,
    /// 기본 인증 프로파일
    pub default_profile: Option<String>,
}

/// 일반 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 프로젝트 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// 프로젝트 이름 (스테이징 prefix, 버킷/스택 이름에 사용)
    pub name: String,
    /// 기본 리전 목록
    pub regions: Vec<String>,
    /// 기본 템플릿 경로 (프로젝트 루트 기준)
    pub template: String,
    /// 프로젝트 공통 파라미터 (테스트 파라미터가 우선)
    pub parameters: BTreeMap<String, ParameterValue>,
    /// 기존 버킷 이름 (비어 있으면 자동 생성)
    pub s3_bucket: String,
    /// 리전별 버킷 사용 여부
    pub s3_regional_buckets: bool,
    /// S3 SigV2 서명 사용 여부
    pub s3_enable_sig_v2: bool,
    /// lambda 패키징 여부
    pub package_lambda: bool,
    /// 짧은 스택 이름 사용 여부
    pub shorten_stack_name: bool,
    /// 인증 프로파일 설정
    pub auth: AuthConfig,
}

/// 인증 프로파일 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// 기본 프로파일 (비어 있으면 `"default"`)
    pub default: String,
    /// 리전별 프로파일
    pub regions: BTreeMap<String, String>,
}

impl AuthConfig {
    /// 리전에 적용되는 프로파일을 반환합니다.
    pub fn profile_for(&self, region: &str) -> &str {
        if let Some(profile) = self.regions.get(region) {
            return profile;
        }
        if self.default.is_empty() {
            "default"
        } else {
            &self.default
        }
    }
}

/// 테스트 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestConfig {
    /// 테스트 이름
    pub name: String,
    /// 템플릿 경로 (비어 있으면 프로젝트 값)
    pub template: String,
    /// 리전 목록 (비어 있으면 프로젝트 값)
    pub regions: Vec<String>,
    /// 테스트 파라미터
    pub parameters: BTreeMap<String, ParameterValue>,
}

/// 템플릿 파라미터 값
///
/// 렌더링 시 모두 문자열로 변환됩니다. 목록은 쉼표로 이어 붙입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    /// 문자열 (의사 파라미터 치환 대상)
    Text(String),
    /// 정수
    Integer(i64),
    /// 불리언
    Boolean(bool),
    /// 문자열 목록
    List(Vec<String>),
}

impl ParameterValue {
    /// 치환 전 원시 문자열 표현
    pub fn as_raw(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Integer(n) => n.to_string(),
            Self::Boolean(b) => b.to_string(),
            Self::List(items) => items.join(","),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}
