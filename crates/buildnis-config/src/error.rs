//! Error types for buildnis-config

use std::path::PathBuf;

/// Result type for buildnis-config operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading, validating or saving configuration documents
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Filesystem error: {0}")]
    Fs(#[from] buildnis_fs::Error),

    #[error("Configuration file {path} does not exist or is not a file")]
    NotFound { path: PathBuf },

    #[error("Failed to read configuration {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: buildnis_fs::Error,
    },

    #[error("Failed to parse JSON configuration {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("{path} is not a valid configuration: expected file_name \"{expected}\", found \"{actual}\"")]
    SchemaMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("Configuration {path} has version {found}, at least {required} is required")]
    VersionTooOld {
        path: PathBuf,
        found: String,
        required: String,
    },

    #[error("Configuration {path} has an invalid file_version \"{value}\"")]
    InvalidVersion { path: PathBuf, value: String },

    #[error("Invalid field \"{field}\" in {path}: {message}")]
    InvalidField {
        path: PathBuf,
        field: String,
        message: String,
    },

    #[error("Failed to write configuration {path}: {message}")]
    Write { path: PathBuf, message: String },
}
