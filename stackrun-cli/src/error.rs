//! CLI-specific error types and exit code mapping

use stackrun_core::error::StackrunError;

/// CLI-specific error type.
///
/// `exit_code()` maps each variant to the process exit status.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from the run lifecycle.
    #[error("{0}")]
    Run(#[from] StackrunError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                              |
    /// |------|--------------------------------------|
    /// | 0    | Success                              |
    /// | 1    | General / command / provider error   |
    /// | 2    | Configuration error                  |
    /// | 3    | Lint failed                          |
    /// | 4    | One or more stacks failed            |
    /// | 10   | IO error                             |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Run(StackrunError::Config(_)) => 2,
            Self::Run(StackrunError::LintFailed { .. }) => 3,
            Self::Run(StackrunError::StacksFailed { .. }) => 4,
            Self::Io(_) | Self::Run(StackrunError::Io(_)) => 10,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Run(_) => 1,
        }
    }
}
