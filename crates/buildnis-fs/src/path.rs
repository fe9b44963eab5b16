//! Normalized path handling for cross-platform compatibility

use std::path::{Path, PathBuf};

/// A path normalized to use forward slashes internally.
///
/// Generated configuration documents store paths as strings, so every path
/// that ends up in a JSON artifact goes through this type first. Construction
/// converts backslashes to forward slashes and lexically removes `.`, `..` and
/// duplicate separators. The filesystem is never consulted; symlinks are kept
/// as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path_str = path.as_ref().to_string_lossy();
        Self {
            inner: clean(&path_str),
        }
    }

    /// Make the path absolute against the process working directory.
    pub fn absolute(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let candidate = Self::new(path);
        if candidate.is_absolute() {
            return Ok(candidate);
        }
        let cwd = std::env::current_dir()?;
        Ok(candidate.absolutize(&Self::new(cwd)))
    }

    /// Resolve the filesystem path, following symlinks.
    ///
    /// Unlike `std::fs::canonicalize` this never yields `\\?\` verbatim
    /// paths on Windows.
    pub fn canonical(&self) -> std::io::Result<Self> {
        dunce::canonicalize(self.to_native()).map(Self::new)
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Whether the path starts at a filesystem root (or a drive root).
    pub fn is_absolute(&self) -> bool {
        let (root, _) = split_root(&self.inner);
        root.ends_with('/')
    }

    /// Join relative paths onto `base`; absolute paths are returned unchanged.
    pub fn absolutize(&self, base: &NormalizedPath) -> Self {
        if self.is_absolute() {
            self.clone()
        } else {
            base.join(&self.inner)
        }
    }

    /// Join this path with a segment.
    pub fn join(&self, segment: &str) -> Self {
        Self {
            inner: clean(&format!("{}/{}", self.inner, segment)),
        }
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        let (root, rest) = split_root(&self.inner);
        if rest.is_empty() || self.inner == "." {
            return None;
        }
        match rest.rfind('/') {
            Some(idx) => Some(Self {
                inner: format!("{}{}", root, &rest[..idx]),
            }),
            None if root.is_empty() => Some(Self {
                inner: ".".to_string(),
            }),
            None => Some(Self {
                inner: root.to_string(),
            }),
        }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        let (_, rest) = split_root(&self.inner);
        match rest.rsplit('/').next() {
            Some("") | Some(".") | Some("..") | None => None,
            Some(name) => Some(name),
        }
    }

    /// Check if this path exists on the filesystem.
    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.to_native().is_dir()
    }

    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        self.to_native().is_file()
    }
}

/// Split a forward-slash path into its root prefix and the remainder.
///
/// Roots are `//` (UNC), `/`, `C:/` and the drive-relative `C:`.
fn split_root(path: &str) -> (&str, &str) {
    let bytes = path.as_bytes();
    if path.starts_with("//") {
        (&path[..2], &path[2..])
    } else if path.starts_with('/') {
        (&path[..1], &path[1..])
    } else if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        if bytes.len() >= 3 && bytes[2] == b'/' {
            (&path[..3], &path[3..])
        } else {
            (&path[..2], &path[2..])
        }
    } else {
        ("", path)
    }
}

fn clean(raw: &str) -> String {
    let unified = raw.replace('\\', "/");
    let (root, rest) = split_root(&unified);

    let mut parts: Vec<&str> = Vec::new();
    for component in rest.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if root.is_empty() {
                    parts.push("..");
                }
                // `..` above a root stays at the root
            }
            other => parts.push(other),
        }
    }

    let body = parts.join("/");
    if root.is_empty() && body.is_empty() {
        ".".to_string()
    } else {
        format!("{}{}", root, body)
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

impl From<NormalizedPath> for String {
    fn from(p: NormalizedPath) -> Self {
        p.inner
    }
}
