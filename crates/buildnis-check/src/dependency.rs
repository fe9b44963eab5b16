//! Project dependency records and their verification
//!
//! A dependency is fulfilled if its `ok_if_exists` path exists, or else if
//! running `ok_if_executable` with `executable_argument` prints something
//! matching `executable_check_regex`. Unfulfilled dependencies are handed to
//! an [`InstallHook`] and tested once more.

use std::path::Path;

use buildnis_config::{ConfigNode, Error as ConfigError, Map, Value};
use buildnis_fs::NormalizedPath;
use serde::{Deserialize, Deserializer, Serialize};

use crate::probe::{ExternalProbe, ProbeRequest, match_version};
use crate::{Error, Result};

/// Field of the dependency document holding the records.
pub const DEPENDENCIES: &str = "dependencies";

/// Accepts a JSON boolean or the strings `"true"` / `"false"`.
pub(crate) fn bool_or_string<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => Ok(value),
        Flag::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected a boolean, found \"{}\"",
                other
            ))),
        },
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub website_url: String,
    #[serde(default)]
    pub download_url: String,
    #[serde(default)]
    pub download_dir: String,
    #[serde(default)]
    pub install_cmd: String,
    #[serde(default)]
    pub ok_if_exists: String,
    #[serde(default)]
    pub ok_if_executable: String,
    #[serde(default)]
    pub executable_argument: String,
    #[serde(default)]
    pub executable_check_regex: String,
    #[serde(default, deserialize_with = "bool_or_string")]
    pub is_checked: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DependencyRecord {
    /// Parse and normalise one record.
    pub fn from_value(value: &Value) -> Result<Self> {
        let mut record: Self =
            serde_json::from_value(value.clone()).map_err(|e| Error::MalformedRecord {
                record: value
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or("<unnamed>")
                    .to_string(),
                message: e.to_string(),
            })?;
        record.normalize();
        Ok(record)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Without an executable there is nothing to run the argument and regex with.
    pub fn normalize(&mut self) {
        if self.ok_if_executable.is_empty() {
            self.executable_argument.clear();
            self.executable_check_regex.clear();
        }
    }
}

/// Read the records of a dependency document, in declaration order.
///
/// Malformed records are logged and left out.
pub fn dependencies_from_node(
    node: &ConfigNode,
    path: &NormalizedPath,
) -> Result<Vec<DependencyRecord>> {
    let Some(value) = node.get(DEPENDENCIES) else {
        return Ok(Vec::new());
    };
    let values = value.as_array().ok_or_else(|| ConfigError::InvalidField {
        path: path.to_native(),
        field: DEPENDENCIES.to_string(),
        message: "expected a list of dependency records".to_string(),
    })?;
    Ok(values
        .iter()
        .filter_map(|value| match DependencyRecord::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::error!(path = %path, error = %e, "Dependency record rejected");
                None
            }
        })
        .collect())
}

/// Replace the records of a dependency document.
pub fn dependencies_into_node(node: &mut ConfigNode, records: &[DependencyRecord]) {
    node.set(
        DEPENDENCIES,
        records.iter().map(DependencyRecord::to_value).collect::<Vec<_>>(),
    );
}

/// Extension point for installing a missing dependency.
pub trait InstallHook {
    fn install(&self, record: &DependencyRecord) -> Result<()>;
}

/// The default hook: installs nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInstall;

impl InstallHook for NoInstall {
    fn install(&self, record: &DependencyRecord) -> Result<()> {
        tracing::debug!(dependency = %record.name, "No installer configured");
        Ok(())
    }
}

/// Verifies dependency records.
pub struct DependencyChecker<'a> {
    probe: &'a dyn ExternalProbe,
    installer: &'a dyn InstallHook,
    force: bool,
}

impl<'a> DependencyChecker<'a> {
    pub fn new(probe: &'a dyn ExternalProbe) -> Self {
        Self {
            probe,
            installer: &NoInstall,
            force: false,
        }
    }

    pub fn installer(mut self, installer: &'a dyn InstallHook) -> Self {
        self.installer = installer;
        self
    }

    /// With `force` on, records already checked are probed again.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Check every record in declaration order, updating `is_checked`.
    pub fn check(&self, records: &mut [DependencyRecord]) {
        for record in records.iter_mut() {
            if record.is_checked && !self.force {
                tracing::info!(dependency = %record.name, "Dependency has already been checked");
                continue;
            }
            if self.is_fulfilled(record) {
                record.is_checked = true;
                continue;
            }

            if let Err(e) = self.installer.install(record) {
                tracing::warn!(dependency = %record.name, error = %e, "Installing dependency failed");
            }
            record.is_checked = self.is_fulfilled(record);
            if !record.is_checked {
                tracing::error!(dependency = %record.name, "Dependency not found");
            }
        }
    }

    /// Whether `record` is currently satisfied.
    pub fn is_fulfilled(&self, record: &DependencyRecord) -> bool {
        if !record.ok_if_exists.is_empty() {
            let path = Path::new(&record.ok_if_exists);
            if path.is_file() || path.is_dir() {
                tracing::info!(dependency = %record.name, path = %record.ok_if_exists, "Dependency path exists");
                return true;
            }
            tracing::debug!(dependency = %record.name, path = %record.ok_if_exists, "Dependency path does not exist");
        }

        if record.ok_if_executable.is_empty() {
            return false;
        }
        let request = ProbeRequest::new(record.ok_if_executable.clone())
            .arg(record.executable_argument.clone());
        let matched = self
            .probe
            .run(&request)
            .and_then(|output| match_version(&output.stdout, &record.executable_check_regex));
        match matched {
            Ok(Some(value)) if !value.is_empty() => {
                tracing::info!(dependency = %record.name, value = %value, "Dependency executable works");
                true
            }
            Ok(_) => {
                tracing::warn!(
                    dependency = %record.name,
                    executable = %record.ok_if_executable,
                    regex = %record.executable_check_regex,
                    "Dependency executable output does not match"
                );
                false
            }
            Err(e) => {
                tracing::warn!(dependency = %record.name, error = %e, "Dependency executable check failed");
                false
            }
        }
    }
}
