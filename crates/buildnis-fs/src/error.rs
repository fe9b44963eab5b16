//! Error types for buildnis-fs

use std::path::PathBuf;

/// Result type for buildnis-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in buildnis-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File {path} does not exist or is not a regular file")]
    NotFound { path: PathBuf },

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
