//! stackrun -- ephemeral infrastructure test runner.
//!
//! Parses arguments, initializes logging from the `[general]` config section,
//! dispatches to a command handler and maps errors to exit codes.

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use anyhow::Result;
use clap::Parser;

use stackrun_core::config::{GeneralConfig, StackrunConfig};

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let general = logging_config(&cli).await;
    logging::init_tracing(&general)?;
    stackrun_core::metrics::describe_all();

    let writer = OutputWriter::new(cli.output);
    if let Err(e) = run(cli, &writer).await {
        tracing::debug!(error = %e, exit_code = e.exit_code(), "command failed");
        eprintln!("error: {}", e);
        std::process::exit(e.exit_code());
    }

    Ok(())
}

/// Logging settings: config file values when it parses, `--log-level` on top.
///
/// A broken config file is reported by the command itself, so logging falls
/// back to defaults here.
async fn logging_config(cli: &Cli) -> GeneralConfig {
    let mut general = match StackrunConfig::from_file(cli.config_path()).await {
        Ok(mut config) => {
            config.apply_env_overrides();
            config.general
        }
        Err(_) => GeneralConfig::default(),
    };
    if let Some(ref level) = cli.log_level {
        general.log_level = level.clone();
    }
    general
}

async fn run(cli: Cli, writer: &OutputWriter) -> Result<(), CliError> {
    let config_path = cli.config_path();
    tracing::debug!(config = %config_path.display(), "stackrun starting");

    match cli.command {
        Commands::List(args) => {
            commands::list::execute(args, &cli.project_root, &config_path, writer).await
        }
        Commands::DryRun(args) => {
            commands::dry_run::execute(args, &cli.project_root, &config_path, writer).await
        }
        Commands::Config(args) => commands::config::execute(args, &config_path, writer).await,
    }
}
