//! 클라이언트 캐시: (프로파일, 리전)별 세션 재사용
//!
//! 인자 없이 생성할 수 있으며, 요청 시 세션을 만들어 캐시합니다.
//! 실제 클라우드 클라이언트 구성은 각 협력자의 몫이고,
//! 여기서는 어떤 자격 증명과 서명 방식을 쓸지만 결정합니다.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tracing::debug;

/// 프로바이더 세션
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    /// 인증 프로파일
    pub profile: String,
    /// 리전
    pub region: String,
    /// S3 SigV2 서명 사용 여부
    pub sig_v2: bool,
}

/// 세션 캐시
#[derive(Debug, Default)]
pub struct ClientCache {
    sessions: Mutex<HashMap<(String, String), Arc<Session>>>,
    sig_v2: bool,
}

impl ClientCache {
    /// 빈 캐시를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// S3 SigV2 서명을 사용하는 캐시를 생성합니다.
    pub fn with_sig_v2(sig_v2: bool) -> Self {
        Self {
            sig_v2,
            ..Self::default()
        }
    }

    /// (프로파일, 리전) 세션을 반환합니다. 없으면 새로 만들어 캐시합니다.
    pub fn session(&self, profile: &str, region: &str) -> Arc<Session> {
        // 락 안에서 패닉이 나도 캐시 내용은 여전히 유효함
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let key = (profile.to_owned(), region.to_owned());
        Arc::clone(sessions.entry(key).or_insert_with(|| {
            debug!(profile, region, "creating provider session");
            Arc::new(Session {
                profile: profile.to_owned(),
                region: region.to_owned(),
                sig_v2: self.sig_v2,
            })
        }))
    }

    /// 캐시된 세션 수
    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// 캐시가 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
