//! Content fingerprints for change detection
//!
//! A [`Fingerprint`] pairs a file's byte size with its SHA-256 digest in the
//! canonical `sha256:<hex>` format. Two fingerprints describe the same content
//! iff both size and digest are equal; the path is never compared, so a copy
//! of a file has the same content as the original.
//!
//! Fingerprints are computed on demand and are not meant to be persisted.

use sha2::{Digest, Sha256};
use std::path::Path;

use crate::{Error, NormalizedPath, Result, io};

/// Prefix for all digests produced by this module
const PREFIX: &str = "sha256:";

/// Size and digest of a file's content at the time it was computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    path: NormalizedPath,
    size: u64,
    digest: String,
}

impl Fingerprint {
    /// Fingerprint the current content of the file at `path`.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if `path` is not a regular file, [`Error::Io`] if
    /// it cannot be read.
    pub fn compute(path: impl AsRef<Path>) -> Result<Self> {
        let path = NormalizedPath::absolute(path.as_ref())
            .map_err(|e| Error::io(path.as_ref(), e))?;
        let content = io::read_bytes(&path)?;
        Ok(Self::from_bytes(path, &content))
    }

    /// Fingerprint in-memory content as if it were stored at `path`.
    pub fn from_bytes(path: NormalizedPath, content: &[u8]) -> Self {
        Self {
            path,
            size: content.len() as u64,
            digest: compute_digest(content),
        }
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// The digest as `sha256:<hex>`.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// True if `other` describes the same bytes.
    pub fn same_content(&self, other: &Fingerprint) -> bool {
        same_content(self, other)
    }

    /// Check whether the file at `path` currently holds this content.
    ///
    /// The size is compared first so differently sized files are never hashed.
    pub fn matches_file(&self, path: impl AsRef<Path>) -> Result<bool> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                Error::io(path, e)
            }
        })?;
        if !metadata.is_file() {
            return Err(Error::NotFound {
                path: path.to_path_buf(),
            });
        }
        if metadata.len() != self.size {
            return Ok(false);
        }
        Ok(Self::compute(path)?.digest == self.digest)
    }
}

/// Two fingerprints describe the same content iff size and digest match.
pub fn same_content(a: &Fingerprint, b: &Fingerprint) -> bool {
    a.size == b.size && a.digest == b.digest
}

/// Compute the digest of raw bytes as `sha256:<hex>`.
pub fn compute_digest(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{}{:x}", PREFIX, hasher.finalize())
}
