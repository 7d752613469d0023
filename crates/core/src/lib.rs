//! stackrun 코어: 공통 타입, 설정, 에러, 이름 필터, 협력자 trait
//!
//! 오케스트레이터(`stackrun-runner`)와 CLI가 공유하는 정의를 모읍니다.

pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod metrics;
pub mod provider;
pub mod resolve;
pub mod types;

// --- 주요 타입 re-export ---
// 각 모듈의 핵심 타입을 크레이트 루트에서 바로 사용할 수 있도록 합니다.

// 에러
pub use error::{ConfigError, ProviderError, StackrunError};

// 설정
pub use config::{ConfigOverrides, StackrunConfig, TestConfig};

// 필터
pub use filter::Selection;

// 실행 설정
pub use client::ClientCache;
pub use resolve::RunConfig;

// 협력자 trait
pub use provider::{
    BoxFuture, BucketStore, EventLogExporter, Linter, Packager, ProgressReporter,
    ProvisionOptions, Provisioner, ProvisioningHandle, Reporter, Stager, Toolchain,
};

// 도메인 타입
pub use types::{
    Bucket, BucketRegistry, LintFinding, LintReport, RegionTarget, StackEvent, StackFilter,
    StackRecord, StackStatus, StatusCategory, StatusSnapshot, Template, TestDefinition,
};
