//! `file_version` parsing and the engine's minimum version
//!
//! Versions are written as `major.minor` and compare component-wise, so
//! `1.10` is newer than `1.9` and `1.05` is the same as `1.5`.

use std::fmt;

/// The document format version this engine writes and the minimum it reads.
pub const ENGINE_VERSION: FileVersion = FileVersion { major: 1, minor: 0 };

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FileVersion {
    pub major: u64,
    pub minor: u64,
}

impl FileVersion {
    /// Parse a `major.minor` string. Anything else is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let (major, minor) = raw.trim().split_once('.')?;
        Some(Self {
            major: component(major)?,
            minor: component(minor)?,
        })
    }

    /// Whether the engine can read documents of this version.
    pub fn is_supported(&self) -> bool {
        *self >= ENGINE_VERSION
    }
}

/// A non-empty run of ASCII digits; signs and inner dots are rejected.
fn component(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

impl fmt::Display for FileVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
