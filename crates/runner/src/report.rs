//! 리포트: 출력 디렉토리 해석, 스택 이벤트 로그, index.html
//!
//! 리포트는 pass/fail 판정에 영향을 주지 않는 순수한 내보내기입니다.
//!
//! # 출력 구조
//! ```text
//! stackrun_outputs/
//! ├── index.html
//! ├── stackrun-demo-default-1a2b3-us-east-1-events.txt
//! └── stackrun-demo-default-1a2b3-eu-west-1-events.txt
//! ```

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use tracing::{debug, info};

use stackrun_core::error::ProviderError;
use stackrun_core::provider::{
    BoxFuture, EventLogExporter, ProviderResult, ProvisioningHandle, Reporter,
};
use stackrun_core::types::{StackEvent, StackRecord};

/// 기본 출력 디렉토리
pub const DEFAULT_OUTPUT_DIR: &str = "./stackrun_outputs";

/// 리포트 파일 이름
pub const INDEX_FILE: &str = "index.html";

/// 출력 디렉토리를 절대 경로로 해석하고 없으면 생성합니다.
pub async fn prepare_output_dir(output_dir: Option<&Path>) -> std::io::Result<PathBuf> {
    let dir = output_dir.unwrap_or_else(|| Path::new(DEFAULT_OUTPUT_DIR));
    let dir = std::path::absolute(dir)?;
    tokio::fs::create_dir_all(&dir).await?;
    debug!(path = %dir.display(), "prepared report directory");
    Ok(dir)
}

/// 스택 이벤트 로그 파일 이름: `<stack-name>-<region>-events.txt`
pub fn event_log_file_name(stack: &StackRecord) -> String {
    format!("{}-{}-events.txt", stack.name, stack.region)
}

fn format_event(event: &StackEvent) -> String {
    let secs = event
        .timestamp
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format!(
        "{secs}\t{}\t{}\t{}",
        event.resource, event.status, event.reason
    )
}

/// 스택별 이벤트 로그를 텍스트 파일로 기록합니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileEventLogs;

impl EventLogExporter for FileEventLogs {
    fn export<'a>(
        &'a self,
        handle: &'a dyn ProvisioningHandle,
        output_dir: &'a Path,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async move {
            for stack in handle.stacks().await? {
                let events = handle.events(&stack).await?;
                let mut body = String::new();
                for event in &events {
                    body.push_str(&format_event(event));
                    body.push('\n');
                }
                let path = output_dir.join(event_log_file_name(&stack));
                tokio::fs::write(&path, body)
                    .await
                    .map_err(|e| ProviderError::new("event-logs", e.to_string()))?;
                debug!(stack = %stack.name, events = events.len(), path = %path.display(), "wrote stack events");
            }
            Ok(())
        })
    }
}

/// 최종 상태를 최소한의 HTML 표로 렌더링합니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexReporter;

impl IndexReporter {
    /// 스택 레코드 목록으로 HTML 문서를 만듭니다.
    pub fn render(stacks: &[StackRecord]) -> String {
        let mut html = String::from(
            "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>stackrun report</title></head>\n<body>\n<table>\n<tr><th>Test</th><th>Region</th><th>Stack</th><th>Status</th><th>Log</th></tr>\n",
        );
        for stack in stacks {
            let log = escape_html(&event_log_file_name(stack));
            let _ = writeln!(
                html,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td><a href=\"{log}\">{log}</a></td></tr>",
                escape_html(&stack.test),
                escape_html(&stack.region),
                escape_html(&stack.name),
                stack.status,
            );
        }
        html.push_str("</table>\n</body>\n</html>\n");
        html
    }
}

impl Reporter for IndexReporter {
    fn generate_report<'a>(
        &'a self,
        handle: &'a dyn ProvisioningHandle,
        output_path: &'a Path,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async move {
            let stacks = handle.stacks().await?;
            tokio::fs::write(output_path, Self::render(&stacks))
                .await
                .map_err(|e| ProviderError::new("reporter", e.to_string()))?;
            info!(path = %output_path.display(), stacks = stacks.len(), "generated report");
            Ok(())
        })
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
