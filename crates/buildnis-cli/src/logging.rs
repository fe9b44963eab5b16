//! Tracing setup

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::{CliError, Result};

/// Filter directive for the `-q` / `-v` flags.
pub fn level_directive(quiet: bool, verbose: u8) -> &'static str {
    match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    }
}

/// Install the subscriber for this thread.
///
/// `RUST_LOG` overrides the flags. With `log_file` every event is written
/// to stderr and to the file. Dropping the guard closes the file.
pub fn init(quiet: bool, verbose: u8, log_file: Option<&Path>) -> Result<DefaultGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(quiet, verbose)));

    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(path).map_err(|source| CliError::LogFile {
                path: path.to_path_buf(),
                source,
            })?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    let guard = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .set_default();
    Ok(guard)
}
