//! `stackrun dry-run` command handler
//!
//! Builds a [`TestRun`] from the project config, wires it to the in-process
//! [`SimulatedCloud`] and walks start, report and end. Stack progress is
//! printed by a [`TerminalPrinter`]; it goes to stderr when `--output json` is
//! selected so stdout carries only the summary.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use stackrun_core::config::{ConfigOverrides, StackrunConfig};
use stackrun_core::error::StackrunError;
use stackrun_core::filter::Selection;
use stackrun_core::provider::Toolchain;
use stackrun_core::types::StackRecord;
use stackrun_runner::{
    DEFAULT_OUTPUT_DIR, EndOptions, INDEX_FILE, SimulatedCloud, StartOptions, TerminalPrinter,
    TestRun,
};

use crate::cli::{DryRunArgs, OutputFormat};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Simulated stacks settle on creation, so a short poll interval is enough.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Execute the `dry-run` command.
///
/// The summary is rendered even when the run fails; the run error then
/// decides the exit code.
pub async fn execute(
    args: DryRunArgs,
    project_root: &Path,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let progress_out: Box<dyn Write + Send> = match writer.format() {
        OutputFormat::Text => Box::new(std::io::stdout()),
        OutputFormat::Json => Box::new(std::io::stderr()),
    };

    let (report, outcome) = run_lifecycle(args, project_root, config_path, progress_out).await?;
    writer.render(&report)?;
    outcome.map_err(CliError::from)
}

/// Run the lifecycle and collect a summary.
///
/// The outer error covers failures before a run exists (config loading and
/// validation). The inner result is the run outcome.
async fn run_lifecycle(
    args: DryRunArgs,
    project_root: &Path,
    config_path: &Path,
    progress_out: Box<dyn Write + Send>,
) -> Result<(DryRunReport, Result<(), StackrunError>), CliError> {
    let mut config = StackrunConfig::from_file(config_path).await?;
    config.apply_env_overrides();

    let cloud = Arc::new(
        args.fail_tests
            .iter()
            .fold(SimulatedCloud::new(), |cloud, test| {
                cloud.with_failing_test(test.as_str())
            }),
    );
    let toolchain = Toolchain {
        progress: Arc::new(
            TerminalPrinter::with_writer(progress_out).poll_interval(POLL_INTERVAL),
        ),
        ..cloud.toolchain()
    };

    let mut run = TestRun::builder()
        .config(config)
        .project_root(project_root)
        .overrides(ConfigOverrides {
            enable_sig_v2: args.enable_sig_v2,
            regions: Selection::All,
            default_profile: args.profile.clone(),
        })
        .toolchain(toolchain)
        .start_options(StartOptions {
            test_names: Selection::parse(&args.tests),
            regions: Selection::parse(&args.regions),
            skip_upload: args.skip_upload,
            lint_disable: args.lint_disable,
        })
        .end_options(EndOptions {
            no_delete: args.no_delete,
            keep_failed: args.keep_failed,
            dont_wait_for_delete: !args.wait_for_delete,
        })
        .build()?;

    info!(uid = %run.uid(), project = run.config().project_name(), "starting dry run");
    let outcome = run.execute(args.output_directory.as_deref()).await;
    if let Err(e) = &outcome {
        warn!(error = %e, "dry run failed");
    }

    let stacks = match run.handle() {
        Some(handle) => handle.stacks().await.unwrap_or_else(|e| {
            warn!(error = %e, "could not fetch final stack states");
            run.result().to_vec()
        }),
        None => Vec::new(),
    };
    let index = args
        .output_directory
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
        .join(INDEX_FILE);

    let report = DryRunReport {
        uid: run.uid().to_string(),
        project: run.config().project_name().to_owned(),
        passed: outcome.is_ok() && run.passed(),
        stacks,
        report: index.is_file().then(|| index.display().to_string()),
        error: outcome.as_ref().err().map(ToString::to_string),
    };
    Ok((report, outcome.map(|_| ())))
}

/// Dry run summary.
#[derive(Serialize)]
pub struct DryRunReport {
    pub uid: String,
    pub project: String,
    pub passed: bool,
    /// Final stack states after teardown.
    pub stacks: Vec<StackRecord>,
    /// Path of the generated index, if one was written.
    pub report: Option<String>,
    pub error: Option<String>,
}

impl Render for DryRunReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let result = if self.passed {
            "PASSED".green().bold()
        } else {
            "FAILED".red().bold()
        };
        writeln!(w)?;
        writeln!(w, "Dry run {} (project {}): {}", self.uid, self.project.bold(), result)?;

        for stack in &self.stacks {
            writeln!(
                w,
                "  {:<12} {:<20} {:<10} {}",
                stack.region, stack.status, stack.test, stack.name
            )?;
        }
        if let Some(ref report) = self.report {
            writeln!(w, "  Report: {}", report)?;
        }
        if let Some(ref error) = self.error {
            writeln!(w, "  Error: {}", error.red())?;
        }

        Ok(())
    }
}
