//! Filesystem primitives for Buildnis
//!
//! Provides normalized path handling, atomic I/O for generated configuration
//! artifacts, and content fingerprints used for change detection.

pub mod error;
pub mod fingerprint;
pub mod io;
pub mod path;

pub use error::{Error, Result};
pub use fingerprint::{Fingerprint, same_content};
pub use path::NormalizedPath;
