//! 터미널 진행 상황 출력
//!
//! [`TerminalPrinter`]는 진행 중인 스택이 없어질 때까지 상태를 폴링하며
//! 스택별 한 줄씩 출력합니다.

use std::io::Write;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tracing::debug;

use stackrun_core::error::ProviderError;
use stackrun_core::provider::{BoxFuture, ProgressReporter, ProviderResult, ProvisioningHandle};
use stackrun_core::types::{StackRecord, StatusCategory};

/// 기본 폴링 간격
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// 진행 상황 출력기
pub struct TerminalPrinter {
    out: Mutex<Box<dyn Write + Send>>,
    poll_interval: Duration,
    minimalist: bool,
}

impl TerminalPrinter {
    /// stdout에 출력하는 간결한 출력기를 생성합니다.
    pub fn new() -> Self {
        Self::with_writer(Box::new(std::io::stdout()))
    }

    /// 지정한 writer로 출력하는 출력기를 생성합니다.
    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
            poll_interval: DEFAULT_POLL_INTERVAL,
            minimalist: true,
        }
    }

    /// 폴링 간격을 설정합니다.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// false면 스택 ID도 함께 출력합니다.
    pub fn minimalist(mut self, minimalist: bool) -> Self {
        self.minimalist = minimalist;
        self
    }

    fn print(&self, stacks: &[StackRecord]) -> ProviderResult<()> {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        for stack in stacks {
            let line = if self.minimalist {
                format!("{:<12} {:<20} {}", stack.region, stack.status, stack.name)
            } else {
                format!(
                    "{:<12} {:<20} {} ({})",
                    stack.region, stack.status, stack.name, stack.id
                )
            };
            writeln!(out, "{line}").map_err(|e| ProviderError::new("progress", e.to_string()))?;
        }
        out.flush()
            .map_err(|e| ProviderError::new("progress", e.to_string()))
    }
}

impl Default for TerminalPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for TerminalPrinter {
    fn report_test_progress<'a>(
        &'a self,
        handle: &'a dyn ProvisioningHandle,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async move {
            loop {
                let stacks = handle.stacks().await?;
                self.print(&stacks)?;
                let pending = stacks
                    .iter()
                    .filter(|s| s.status.category() == StatusCategory::InProgress)
                    .count();
                if pending == 0 {
                    return Ok(());
                }
                debug!(pending, "waiting for stacks to settle");
                tokio::time::sleep(self.poll_interval).await;
            }
        })
    }
}
