//! Error types for buildnis-cli

use buildnis_core::ExitCode;

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] buildnis_core::Error),

    /// The log file could not be opened or removed
    #[error("log file {path}: {source}")]
    LogFile {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CliError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Core(e) => ExitCode::from(e),
            CliError::LogFile { .. } => ExitCode::Write,
        }
    }
}
