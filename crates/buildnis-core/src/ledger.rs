//! Generated-files ledger
//!
//! Every file and directory a run creates, or finds from an earlier run, is
//! recorded here so that `--clean` can remove exactly those. The ledger only
//! grows during a run and is owned by the orchestrator.

use buildnis_fs::{NormalizedPath, io};

use crate::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedFiles {
    files: Vec<NormalizedPath>,
    dirs: Vec<NormalizedPath>,
}

/// What [`GeneratedFiles::clean`] removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub removed_files: Vec<NormalizedPath>,
    pub removed_dirs: Vec<NormalizedPath>,
    /// Tracked directories left in place because they were not empty.
    pub kept_dirs: Vec<NormalizedPath>,
}

impl GeneratedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a generated file; recording it twice has no effect.
    pub fn track_file(&mut self, path: &NormalizedPath) {
        if !self.files.contains(path) {
            tracing::trace!(path = %path, "Tracking generated file");
            self.files.push(path.clone());
        }
    }

    /// Record a generated directory; recording it twice has no effect.
    pub fn track_dir(&mut self, path: &NormalizedPath) {
        if !self.dirs.contains(path) {
            tracing::trace!(path = %path, "Tracking generated directory");
            self.dirs.push(path.clone());
        }
    }

    pub fn files(&self) -> &[NormalizedPath] {
        &self.files
    }

    pub fn dirs(&self) -> &[NormalizedPath] {
        &self.dirs
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.dirs.is_empty()
    }

    /// Delete every tracked file, then every tracked directory that is empty.
    ///
    /// Directories are tried in reverse tracking order so nested ones go
    /// before their parents. Missing entries are skipped.
    pub fn clean(&self) -> Result<CleanReport> {
        let mut report = CleanReport::default();
        for file in &self.files {
            if io::remove_file(file)? {
                tracing::info!(path = %file, "Deleted generated file");
                report.removed_files.push(file.clone());
            }
        }
        for dir in self.dirs.iter().rev() {
            if !dir.is_dir() {
                continue;
            }
            let empty = std::fs::read_dir(dir.to_native())
                .map(|mut entries| entries.next().is_none())
                .unwrap_or(false);
            if empty && io::remove_empty_dir(dir)? {
                tracing::info!(path = %dir, "Deleted generated directory");
                report.removed_dirs.push(dir.clone());
            } else {
                tracing::warn!(path = %dir, "Generated directory is not empty, keeping it");
                report.kept_dirs.push(dir.clone());
            }
        }
        Ok(report)
    }
}
