//! CLI argument parsing using clap derive API
//!
//! Purely declarative: no side effects or I/O happen here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// stackrun -- ephemeral infrastructure test runner.
///
/// Use `stackrun <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "stackrun", version, about, long_about = None)]
pub struct Cli {
    /// Project root; the config file and templates are resolved against it.
    #[arg(long, global = true, default_value = ".")]
    pub project_root: PathBuf,

    /// Path to the config file, relative to the project root.
    #[arg(short, long, global = true, default_value = ".stackrun.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Config file path as seen from the current directory.
    pub fn config_path(&self) -> PathBuf {
        self.project_root.join(&self.config)
    }
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the tests and regions a run would cover.
    List(ListArgs),

    /// Walk the full run lifecycle against the simulated cloud.
    DryRun(DryRunArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- list ----

/// Show the filtered test registry.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Comma separated test names, or ALL.
    #[arg(long, default_value = "ALL")]
    pub tests: String,

    /// Comma separated regions, or ALL.
    #[arg(long, default_value = "ALL")]
    pub regions: String,
}

// ---- dry-run ----

/// Run start, report and end against an in-process cloud.
#[derive(Args, Debug)]
pub struct DryRunArgs {
    /// Comma separated test names, or ALL.
    #[arg(long, default_value = "ALL")]
    pub tests: String,

    /// Comma separated regions, or ALL.
    #[arg(long, default_value = "ALL")]
    pub regions: String,

    /// Skip lint, package and stage. Requires project.s3_bucket.
    #[arg(long)]
    pub skip_upload: bool,

    /// Do not lint templates.
    #[arg(long)]
    pub lint_disable: bool,

    /// Leave stacks in place after the run.
    #[arg(long)]
    pub no_delete: bool,

    /// Only delete stacks that completed successfully.
    #[arg(long)]
    pub keep_failed: bool,

    /// Block until stack deletion settles.
    #[arg(long)]
    pub wait_for_delete: bool,

    /// Directory for the index report and event logs.
    #[arg(long)]
    pub output_directory: Option<PathBuf>,

    /// Sign storage requests with SigV2.
    #[arg(long)]
    pub enable_sig_v2: bool,

    /// Default auth profile.
    #[arg(long)]
    pub profile: Option<String>,

    /// Make every stack of this test fail to create (repeatable).
    #[arg(long = "fail-test", value_name = "NAME")]
    pub fail_tests: Vec<String>,
}

// ---- config ----

/// Manage stackrun configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only one section (general, project, tests).
        #[arg(long)]
        section: Option<String>,
    },
}
