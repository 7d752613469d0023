//! 이름 필터: 요청된 테스트/리전 부분집합으로 레지스트리를 축소
//!
//! 허용 목록은 쉼표로 구분된 이름 문자열이거나 센티널 `ALL`입니다.
//! `ALL`은 항등 변환이며, 그 외에는 허용 목록과의 교집합만 원래 순서대로 남깁니다.
//!
//! 필터는 기존 컨테이너를 제자리에서 지우지 않고 새 컨테이너를 만들어 반환합니다.
//!
//! # 사용 예시
//! ```
//! use stackrun_core::filter::Selection;
//!
//! let selection = Selection::parse("us-east-1, eu-west-1");
//! assert!(selection.allows("eu-west-1"));
//! assert!(!selection.allows("ap-south-1"));
//! assert!(Selection::parse("ALL").is_all());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::TestConfig;

/// 전체 선택을 뜻하는 센티널 값
pub const ALL: &str = "ALL";

/// 테스트 이름 또는 리전 허용 목록
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    /// 모든 항목 허용 (항등 변환)
    #[default]
    All,
    /// 나열된 이름만 허용
    Only(Vec<String>),
}

impl Selection {
    /// 허용 목록 문자열을 파싱합니다.
    ///
    /// 정확히 `"ALL"`이면 [`Selection::All`], 아니면 쉼표로 분리합니다.
    /// 각 이름의 앞뒤 공백은 제거하고 빈 조각은 버립니다.
    pub fn parse(raw: &str) -> Self {
        if raw.trim() == ALL {
            return Self::All;
        }
        Self::Only(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect(),
        )
    }

    /// `ALL` 여부
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// 이름이 허용 목록에 포함되는지 확인합니다.
    pub fn allows(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(names) => names.iter().any(|n| n == name),
        }
    }

    /// 허용된 이름만 원래 순서대로 복사합니다.
    pub fn retain_names(&self, names: &[String]) -> Vec<String> {
        names
            .iter()
            .filter(|name| self.allows(name))
            .cloned()
            .collect()
    }

    /// `Only` 목록을 반환합니다. `ALL`이면 `None`.
    pub fn names(&self) -> Option<&[String]> {
        match self {
            Self::All => None,
            Self::Only(names) => Some(names),
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "{ALL}"),
            Self::Only(names) => write!(f, "{}", names.join(",")),
        }
    }
}

/// 테스트 이름 축으로 필터링합니다.
///
/// 허용되지 않은 테스트를 제외한 새 목록을 반환합니다.
pub fn trim_tests(selection: &Selection, tests: &[TestConfig]) -> Vec<TestConfig> {
    if selection.is_all() {
        return tests.to_vec();
    }
    let kept: Vec<TestConfig> = tests
        .iter()
        .filter(|test| selection.allows(&test.name))
        .cloned()
        .collect();
    debug!(
        before = tests.len(),
        after = kept.len(),
        selection = %selection,
        "trimmed tests"
    );
    kept
}

/// 테스트별 리전 축으로 필터링합니다.
///
/// 각 테스트의 리전 목록에서 허용되지 않은 리전을 제외합니다.
/// 리전이 모두 제거된 테스트도 목록에 남으며, 스택을 만들지 않습니다.
pub fn trim_regions(selection: &Selection, tests: &[TestConfig]) -> Vec<TestConfig> {
    if selection.is_all() {
        return tests.to_vec();
    }
    tests
        .iter()
        .map(|test| {
            let mut trimmed = test.clone();
            if !test.regions.is_empty() {
                trimmed.regions = selection.retain_names(&test.regions);
                if trimmed.regions.is_empty() {
                    warn!(
                        test = %test.name,
                        selection = %selection,
                        "all regions of test were filtered out"
                    );
                }
            }
            trimmed
        })
        .collect()
}
