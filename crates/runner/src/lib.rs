//! stackrun 실행기: 테스트 실행 생명주기 오케스트레이션
//!
//! # 모듈 구조
//!
//! - [`orchestrator`]: 실행 생명주기 (`TestRun`, `TestRunBuilder`)
//! - [`preflight`]: lint → package → stage 사전 점검
//! - [`teardown`]: 스택 삭제 정책 (`StackTeardown`), 버킷 정리 (`DeletionLedger`)
//! - [`report`]: 출력 디렉토리, 이벤트 로그 (`FileEventLogs`), 리포트 (`IndexReporter`)
//! - [`progress`]: 터미널 진행 상황 출력 (`TerminalPrinter`)
//! - [`simulated`]: 프로세스 내 시뮬레이션 클라우드 (`SimulatedCloud`)
//!
//! # 아키텍처
//!
//! ```text
//! TestRun ──> Toolchain (Arc<dyn …>)
//!   │           ├─ Linter / Packager / Stager
//!   │           ├─ BucketStore
//!   │           ├─ Provisioner ──> ProvisioningHandle
//!   │           ├─ ProgressReporter
//!   │           └─ EventLogExporter / Reporter
//!   └─ StackTeardown + DeletionLedger
//! ```

pub mod orchestrator;
pub mod preflight;
pub mod progress;
pub mod report;
pub mod simulated;
pub mod teardown;

// --- Public API Re-exports ---

// 오케스트레이터
pub use orchestrator::{EndOptions, StartOptions, TestRun, TestRunBuilder};

// 정리 정책
pub use teardown::{DeletionLedger, StackTeardown};

// 리포트
pub use report::{DEFAULT_OUTPUT_DIR, FileEventLogs, INDEX_FILE, IndexReporter};

// 진행 상황
pub use progress::TerminalPrinter;

// 시뮬레이션
pub use simulated::{CallLog, CloudCall, SimulatedCloud};
