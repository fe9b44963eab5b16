//! Error types for buildnis-core

use std::path::PathBuf;

/// Result type for buildnis-core operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Project configuration {path} not found or is not a file")]
    ProjectNotFound { path: PathBuf },

    #[error(transparent)]
    Fs(#[from] buildnis_fs::Error),

    #[error(transparent)]
    Config(#[from] buildnis_config::Error),

    #[error(transparent)]
    Check(#[from] buildnis_check::Error),
}
