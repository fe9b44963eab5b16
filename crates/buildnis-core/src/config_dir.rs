//! The configuration directory document
//!
//! `config_dir.json` next to the project file remembers the directory chosen
//! with `--generated-conf-dir`, so later runs without the option write to
//! the same place.

use std::path::Path;

use buildnis_config::{ConfigNode, DocumentStore, Error as ConfigError, SaveOutcome, Schema};
use buildnis_fs::NormalizedPath;

use crate::Result;

pub const CONFIG_DIR_FILE: &str = "config_dir.json";
pub const CFG_PATH: &str = "cfg_path";

/// Location of `config_dir.json` for a project directory.
pub fn config_dir_file(project_dir: &NormalizedPath) -> NormalizedPath {
    project_dir.join(CONFIG_DIR_FILE)
}

/// Decide where generated documents go.
///
/// An explicit directory (relative paths are taken from the project
/// directory) wins over a stored `config_dir.json`, which wins over the
/// project directory itself.
pub fn settle(
    store: &DocumentStore,
    project_dir: &NormalizedPath,
    explicit: Option<&Path>,
) -> Result<NormalizedPath> {
    if let Some(explicit) = explicit {
        let dir = NormalizedPath::new(explicit).absolutize(project_dir);
        tracing::debug!(dir = %dir, "Using configuration directory from command line");
        return Ok(dir);
    }

    let stored = config_dir_file(project_dir);
    if !stored.is_file() {
        return Ok(project_dir.clone());
    }
    let node = store.load(&stored, Schema::ConfigDir)?;
    let cfg_path = node
        .get_str(CFG_PATH)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ConfigError::InvalidField {
            path: stored.to_native(),
            field: CFG_PATH.to_string(),
            message: "missing configuration directory".to_string(),
        })?;
    let dir = NormalizedPath::new(cfg_path).absolutize(project_dir);
    tracing::debug!(dir = %dir, stored = %stored, "Using stored configuration directory");
    Ok(dir)
}

/// Remember `config_dir` for later runs.
pub fn store_config_dir(
    store: &DocumentStore,
    project_dir: &NormalizedPath,
    config_dir: &NormalizedPath,
) -> Result<SaveOutcome> {
    let mut node = ConfigNode::new();
    node.set(CFG_PATH, config_dir.as_str());
    store.stamp(&mut node, Schema::ConfigDir);
    Ok(store.save_if_changed(&mut node, &config_dir_file(project_dir))?)
}
