//! Error types for buildnis-check

use std::path::PathBuf;

/// Result type for buildnis-check operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Filesystem error: {0}")]
    Fs(#[from] buildnis_fs::Error),

    #[error(transparent)]
    Config(#[from] buildnis_config::Error),

    #[error("\"{path}\" does not exist or is not a directory")]
    MissingDirectory { path: PathBuf },

    #[error("Failed to run \"{program}\": {source}")]
    Process {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("\"{program}\" did not finish within {seconds} seconds")]
    Timeout { program: String, seconds: u64 },

    #[error("Malformed record \"{record}\": {message}")]
    MalformedRecord { record: String, message: String },

    #[error("Invalid regex \"{pattern}\": {message}")]
    InvalidRegex { pattern: String, message: String },

    #[error("Cannot import {path}: {message}")]
    Import { path: PathBuf, message: String },
}
