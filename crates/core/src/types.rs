//! 도메인 타입: 테스트 정의, 스택 상태, 버킷
//!
//! 오케스트레이터와 협력자들이 주고받는 데이터 구조를 정의합니다.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// 리전 단위 배포 대상
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionTarget {
    /// 리전 식별자 (예: `"us-east-1"`)
    pub name: String,
    /// 이 리전에 사용할 인증 프로파일
    pub profile: String,
}

/// 테스트의 템플릿 참조
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// 템플릿을 사용하는 테스트 이름
    pub test: String,
    /// 프로젝트 루트 기준으로 해석된 템플릿 경로
    pub path: PathBuf,
}

/// 완전히 해석된 테스트 정의
///
/// 필터링과 설정 해석이 끝난 뒤 만들어지며, 프로비저닝 시작 이후에는 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestDefinition {
    /// 테스트 이름
    pub name: String,
    /// 배포 리전 (순서 유지)
    pub regions: Vec<RegionTarget>,
    /// 리전별로 렌더링된 파라미터
    pub parameters: BTreeMap<String, BTreeMap<String, String>>,
    /// 해석된 템플릿
    pub template: Template,
    /// 리전별 스테이징 버킷 이름
    pub buckets: BTreeMap<String, String>,
}

impl TestDefinition {
    /// 리전에 렌더링된 파라미터를 반환합니다.
    pub fn parameters_for(&self, region: &str) -> Option<&BTreeMap<String, String>> {
        self.parameters.get(region)
    }
}

/// 스택 상태 분류
///
/// 프로비저너가 보고하는 상태를 닫힌 열거형으로 다룹니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCategory {
    /// 생성 또는 삭제 완료
    Complete,
    /// 진행 중
    InProgress,
    /// 실패
    Failed,
}

impl fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complete => write!(f, "COMPLETE"),
            Self::InProgress => write!(f, "IN_PROGRESS"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// 개별 스택의 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StackStatus {
    CreateInProgress,
    CreateComplete,
    CreateFailed,
    DeleteInProgress,
    DeleteComplete,
    DeleteFailed,
}

impl StackStatus {
    /// 상태가 속한 분류를 반환합니다.
    pub fn category(self) -> StatusCategory {
        match self {
            Self::CreateComplete | Self::DeleteComplete => StatusCategory::Complete,
            Self::CreateInProgress | Self::DeleteInProgress => StatusCategory::InProgress,
            Self::CreateFailed | Self::DeleteFailed => StatusCategory::Failed,
        }
    }
}

impl fmt::Display for StackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CreateInProgress => "CREATE_IN_PROGRESS",
            Self::CreateComplete => "CREATE_COMPLETE",
            Self::CreateFailed => "CREATE_FAILED",
            Self::DeleteInProgress => "DELETE_IN_PROGRESS",
            Self::DeleteComplete => "DELETE_COMPLETE",
            Self::DeleteFailed => "DELETE_FAILED",
        };
        f.pad(s)
    }
}

/// 스택 삭제 대상 필터
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StackFilter {
    /// 모든 스택
    All,
    /// 지정한 상태의 스택만
    Status(StackStatus),
}

impl StackFilter {
    /// 스택 상태가 필터에 해당하는지 확인합니다.
    pub fn matches(&self, status: StackStatus) -> bool {
        match self {
            Self::All => true,
            Self::Status(wanted) => *wanted == status,
        }
    }
}

/// 프로비저닝된 스택 레코드
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackRecord {
    /// 스택 ID
    pub id: String,
    /// 스택 이름
    pub name: String,
    /// 소속 테스트
    pub test: String,
    /// 리전
    pub region: String,
    /// 현재 상태
    pub status: StackStatus,
}

/// 스택 이벤트 (리포트용 로그)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackEvent {
    /// 발생 시각
    pub timestamp: SystemTime,
    /// 이벤트 대상 리소스 (논리 ID)
    pub resource: String,
    /// 이벤트 시점 상태
    pub status: StackStatus,
    /// 상태 사유
    pub reason: String,
}

/// 상태 스냅샷
///
/// `status()` 호출 시점의 분류별 스택 ID 목록입니다.
/// `Complete`와 `Failed` 분류는 항상 존재합니다 (비어 있을 수 있음).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    categories: BTreeMap<StatusCategory, Vec<String>>,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        let mut categories = BTreeMap::new();
        categories.insert(StatusCategory::Complete, Vec::new());
        categories.insert(StatusCategory::Failed, Vec::new());
        Self { categories }
    }
}

impl StatusSnapshot {
    /// 빈 스냅샷을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 스택 레코드 목록에서 스냅샷을 만듭니다.
    pub fn from_records(records: &[StackRecord]) -> Self {
        let mut snapshot = Self::new();
        for record in records {
            snapshot.push(record.status.category(), record.id.clone());
        }
        snapshot
    }

    /// 분류에 스택 ID를 추가합니다.
    pub fn push(&mut self, category: StatusCategory, stack_id: impl Into<String>) {
        self.categories
            .entry(category)
            .or_default()
            .push(stack_id.into());
    }

    /// 분류에 속한 스택 ID 목록
    pub fn get(&self, category: StatusCategory) -> &[String] {
        self.categories
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// 완료된 스택 ID 목록
    pub fn complete(&self) -> &[String] {
        self.get(StatusCategory::Complete)
    }

    /// 실패한 스택 ID 목록
    pub fn failed(&self) -> &[String] {
        self.get(StatusCategory::Failed)
    }

    /// 진행 중인 스택 ID 목록
    pub fn in_progress(&self) -> &[String] {
        self.get(StatusCategory::InProgress)
    }
}

/// 스테이징 버킷 핸들
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    /// 버킷 이름
    pub name: String,
    /// 버킷 리전
    pub region: String,
    /// 다른 곳에서 소유한 버킷을 가리키는 리전별 별칭이면 true.
    /// 별칭은 독립적으로 삭제하지 않습니다.
    pub regional_buckets: bool,
}

/// 버킷 레지스트리: 테스트 이름 → 리전 → 버킷
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketRegistry {
    entries: BTreeMap<String, BTreeMap<String, Bucket>>,
}

impl BucketRegistry {
    /// 빈 레지스트리를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 테스트/리전에 버킷을 등록합니다.
    pub fn insert(&mut self, test: impl Into<String>, region: impl Into<String>, bucket: Bucket) {
        self.entries
            .entry(test.into())
            .or_default()
            .insert(region.into(), bucket);
    }

    /// 테스트/리전의 버킷을 조회합니다.
    pub fn get(&self, test: &str, region: &str) -> Option<&Bucket> {
        self.entries.get(test).and_then(|r| r.get(region))
    }

    /// 테스트별 버킷 맵을 순회합니다.
    pub fn tests(&self) -> impl Iterator<Item = (&String, &BTreeMap<String, Bucket>)> {
        self.entries.iter()
    }

    /// 모든 (테스트, 리전, 버킷) 항목을 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &Bucket)> {
        self.entries.iter().flat_map(|(test, regions)| {
            regions
                .iter()
                .map(move |(region, bucket)| (test.as_str(), region.as_str(), bucket))
        })
    }

    /// 허용된 테스트만 남긴 새 레지스트리를 반환합니다.
    pub fn retain_tests(&self, keep: &HashSet<&str>) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|(test, _)| keep.contains(test.as_str()))
                .map(|(test, regions)| (test.clone(), regions.clone()))
                .collect(),
        }
    }

    /// 등록된 항목 수 (테스트 × 리전)
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    /// 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// lint 결과 항목
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintFinding {
    /// 대상 테스트
    pub test: String,
    /// 템플릿 경로
    pub template: PathBuf,
    /// 메시지
    pub message: String,
}

/// linter 실행 결과: `(warnings, errors)`와 전체 통과 여부
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintReport {
    /// 경고
    pub warnings: Vec<LintFinding>,
    /// 에러
    pub errors: Vec<LintFinding>,
    /// linter가 판단한 전체 통과 여부
    pub passed: bool,
}

impl LintReport {
    /// 통과한 빈 결과
    pub fn clean() -> Self {
        Self {
            passed: true,
            ..Self::default()
        }
    }

    /// 프로비저닝을 막아야 하는 결과인지 확인합니다.
    pub fn is_blocking(&self) -> bool {
        !self.errors.is_empty() || !self.passed
    }
}
