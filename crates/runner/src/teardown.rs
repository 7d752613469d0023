//! 정리 정책: 스택 삭제 결정과 버킷 정리
//!
//! 정리는 실행당 한 번 평가되는 작은 상태 기계입니다.
//!
//! | no_delete | keep_failed | 동작 |
//! |---|---|---|
//! | true | - | 스택 삭제 없음 (로그만) |
//! | false | true | `CREATE_COMPLETE` 스택만 삭제 |
//! | false | false | 모든 스택 삭제 |
//!
//! 버킷 정리는 스택 정리 뒤에 실행되며, 같은 버킷은 한 번만 삭제하고
//! 리전 별칭 버킷은 삭제하지 않습니다.

use std::collections::HashSet;
use std::fmt;

use metrics::counter;
use tracing::{debug, info};

use stackrun_core::metrics as m;
use stackrun_core::provider::BucketStore;
use stackrun_core::types::{BucketRegistry, StackFilter, StackStatus, StatusSnapshot};
use stackrun_core::StackrunError;

/// 스택 삭제 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackTeardown {
    /// 삭제하지 않음
    Skip,
    /// 생성 완료된 스택만 삭제 (실패한 스택은 조사용으로 남김)
    DeleteComplete,
    /// 모든 스택 삭제
    DeleteAll,
}

impl StackTeardown {
    /// 두 플래그로 정책을 결정합니다. `no_delete`가 `keep_failed`보다 우선합니다.
    pub fn decide(no_delete: bool, keep_failed: bool) -> Self {
        match (no_delete, keep_failed) {
            (true, _) => Self::Skip,
            (false, true) => Self::DeleteComplete,
            (false, false) => Self::DeleteAll,
        }
    }

    /// 삭제 전 스냅샷을 기준으로 발행할 삭제 필터를 반환합니다.
    ///
    /// `DeleteComplete`는 완료된 스택이 하나도 없으면 삭제를 발행하지 않습니다.
    pub fn delete_filter(self, pre: &StatusSnapshot) -> Option<StackFilter> {
        match self {
            Self::Skip => None,
            Self::DeleteComplete if pre.complete().is_empty() => None,
            Self::DeleteComplete => Some(StackFilter::Status(StackStatus::CreateComplete)),
            Self::DeleteAll => Some(StackFilter::All),
        }
    }

    /// 메트릭 레이블 값
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::DeleteComplete => "complete",
            Self::DeleteAll => "all",
        }
    }
}

impl fmt::Display for StackTeardown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 버킷 정리 실행 여부
///
/// `!no_delete || (keep_failed && 삭제 전 실패 스택 없음)`
pub fn should_delete_buckets(no_delete: bool, keep_failed: bool, pre: &StatusSnapshot) -> bool {
    !no_delete || (keep_failed && pre.failed().is_empty())
}

/// 정리 한 번 동안 삭제한 버킷 이름 집합
#[derive(Debug, Default)]
pub struct DeletionLedger {
    deleted: HashSet<String>,
}

impl DeletionLedger {
    /// 빈 장부를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 처음 보는 이름이면 기록하고 true를 반환합니다.
    pub fn record(&mut self, name: &str) -> bool {
        self.deleted.insert(name.to_owned())
    }

    /// 이미 삭제한 버킷인지 확인합니다.
    pub fn contains(&self, name: &str) -> bool {
        self.deleted.contains(name)
    }

    /// 삭제한 버킷 수
    pub fn len(&self) -> usize {
        self.deleted.len()
    }

    /// 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty()
    }
}

/// 레지스트리의 모든 버킷을 훑으며 고유한 비별칭 버킷을 한 번씩 삭제합니다.
///
/// 버킷 내용물도 항상 함께 삭제합니다. 삭제 실패는 즉시 전파됩니다.
pub async fn delete_buckets(
    store: &dyn BucketStore,
    registry: &BucketRegistry,
) -> Result<DeletionLedger, StackrunError> {
    let mut ledger = DeletionLedger::new();
    for (test, region, bucket) in registry.iter() {
        if bucket.regional_buckets {
            debug!(test, region, bucket = %bucket.name, "skipping regional bucket alias");
            continue;
        }
        if ledger.contains(&bucket.name) {
            continue;
        }
        store.delete(bucket, true).await?;
        ledger.record(&bucket.name);
        counter!(m::BUCKETS_DELETED_TOTAL).increment(1);
        info!(bucket = %bucket.name, region = %bucket.region, "deleted staging bucket");
    }
    Ok(ledger)
}
