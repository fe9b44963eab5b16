//! Build tool descriptors: discovery and verification

use buildnis_config::{ConfigNode, Map, Value};
use buildnis_fs::NormalizedPath;
use serde::{Deserialize, Serialize};

use crate::dependency::bool_or_string;
use crate::probe::{ExternalProbe, ProbeRequest, match_version};
use crate::{Error, Result};

/// Field of the build tools document holding the records.
pub const BUILD_TOOL_CFGS: &str = "build_tool_cfgs";

/// Field of a configure script's output holding the records.
pub const BUILD_TOOLS: &str = "build_tools";

/// One build tool as described by a configure script.
///
/// `name`, `build_tool_exe` and `version_regex` are mandatory; every other
/// field defaults to empty. Fields the engine does not know are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRecord {
    pub name: String,
    #[serde(default)]
    pub name_long: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub version_arg: String,
    pub version_regex: String,
    pub build_tool_exe: String,
    #[serde(default)]
    pub install_path: String,
    #[serde(default)]
    pub env_script: String,
    #[serde(default)]
    pub env_script_arg: String,
    #[serde(default, deserialize_with = "bool_or_string")]
    pub is_checked: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ToolRecord {
    /// Parse one descriptor.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedRecord`] if a mandatory field is missing or mistyped.
    pub fn from_value(value: &Value) -> Result<Self> {
        serde_json::from_value(value.clone()).map_err(|e| Error::MalformedRecord {
            record: value
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("<unnamed>")
                .to_string(),
            message: e.to_string(),
        })
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// The executable to probe: joined with `install_path` unless an
    /// environment script sets up the search path.
    pub fn executable(&self) -> String {
        if self.env_script.is_empty() && !self.install_path.is_empty() {
            NormalizedPath::new(&self.install_path)
                .join(&self.build_tool_exe)
                .to_native()
                .to_string_lossy()
                .into_owned()
        } else {
            self.build_tool_exe.clone()
        }
    }
}

/// Parse descriptors, dropping malformed ones with an error log.
pub fn parse_records(values: &[Value]) -> Vec<ToolRecord> {
    values
        .iter()
        .filter_map(|value| match ToolRecord::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::error!(error = %e, "Build tool descriptor rejected");
                None
            }
        })
        .collect()
}

/// Read the records of a build tools document.
///
/// The document was written by the engine, so a malformed record means the
/// file cannot be imported.
pub fn tools_from_node(node: &ConfigNode, path: &NormalizedPath) -> Result<Vec<ToolRecord>> {
    let import_error = |message: String| Error::Import {
        path: path.to_native(),
        message,
    };
    let values = node
        .get_array(BUILD_TOOL_CFGS)
        .ok_or_else(|| import_error(format!("missing \"{}\" list", BUILD_TOOL_CFGS)))?;
    values
        .iter()
        .map(|value| ToolRecord::from_value(value).map_err(|e| import_error(e.to_string())))
        .collect()
}

/// Build the body of a build tools document.
pub fn tools_to_node(records: &[ToolRecord]) -> ConfigNode {
    let mut node = ConfigNode::new();
    node.set(
        BUILD_TOOL_CFGS,
        records.iter().map(ToolRecord::to_value).collect::<Vec<_>>(),
    );
    node
}

/// Run every configure script for `os` and collect the tools they report.
///
/// Scripts are the regular files in `<scripts_dir>/<os>`, run in file name
/// order with `arch` as their only argument. Each must print
/// `{"build_tools": [...]}`. Scripts that fail or print anything else are
/// logged and skipped.
///
/// # Errors
///
/// [`Error::MissingDirectory`] if `<scripts_dir>/<os>` is not a directory.
pub fn discover_tools(
    scripts_dir: &NormalizedPath,
    os: &str,
    arch: &str,
    probe: &dyn ExternalProbe,
) -> Result<Vec<ToolRecord>> {
    let dir = scripts_dir.join(os);
    if !dir.is_dir() {
        return Err(Error::MissingDirectory {
            path: dir.to_native(),
        });
    }

    let native_dir = dir.to_native();
    let mut scripts: Vec<_> = std::fs::read_dir(&native_dir)
        .map_err(|e| buildnis_fs::Error::io(&native_dir, e))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    scripts.sort();

    let mut records = Vec::new();
    for script in scripts {
        let script = NormalizedPath::new(&script);
        tracing::info!(script = %script, arch, "Running configure script");

        let request = ProbeRequest::new(script.to_native().to_string_lossy()).arg(arch);
        let output = match probe.run(&request) {
            Ok(output) => output,
            Err(e) => {
                tracing::error!(script = %script, error = %e, "Configure script failed");
                continue;
            }
        };

        let reported: Value = match serde_json::from_str(&output.stdout) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(script = %script, error = %e, "Configure script output is not JSON");
                continue;
            }
        };
        match reported.get(BUILD_TOOLS).and_then(Value::as_array) {
            Some(values) => records.extend(parse_records(values)),
            None => {
                tracing::error!(script = %script, "Configure script output has no \"build_tools\" list")
            }
        }
    }
    Ok(records)
}

/// Probes build tools and records their versions.
pub struct ToolVerifier<'a> {
    probe: &'a dyn ExternalProbe,
    force: bool,
}

impl<'a> ToolVerifier<'a> {
    pub fn new(probe: &'a dyn ExternalProbe) -> Self {
        Self { probe, force: false }
    }

    /// With `force` on, records already checked are probed again.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Verify every record in declaration order.
    pub fn verify(&self, records: &mut [ToolRecord]) {
        for record in records.iter_mut() {
            if record.is_checked && !self.force {
                tracing::debug!(tool = %record.name, "Build tool already checked");
                continue;
            }
            self.verify_one(record);
        }
    }

    /// Probe one tool; sets `version` and `is_checked` on success.
    pub fn verify_one(&self, record: &mut ToolRecord) {
        record.is_checked = false;
        if record.build_tool_exe.is_empty() {
            tracing::error!(tool = %record.name, "Build tool has no executable configured");
            return;
        }

        let executable = record.executable();
        if !record.env_script.is_empty() {
            tracing::info!(tool = %record.name, script = %record.env_script, "Calling environment script");
        } else {
            tracing::info!(tool = %record.name, executable = %executable, "Checking build tool");
        }

        let request = ProbeRequest::new(executable.clone())
            .arg(record.version_arg.clone())
            .env_script(record.env_script.clone(), record.env_script_arg.clone());
        let version = self
            .probe
            .run(&request)
            .and_then(|output| match_version(&output.stdout, &record.version_regex));

        match version {
            Ok(Some(version)) if !version.is_empty() => {
                tracing::info!(tool = %record.name, version = %version, "Build tool works");
                record.version = version;
                record.is_checked = true;
            }
            Ok(_) => {
                tracing::warn!(
                    tool = %record.name,
                    executable = %executable,
                    regex = %record.version_regex,
                    "Build tool output does not match version regex"
                );
            }
            Err(e) => {
                tracing::warn!(tool = %record.name, executable = %executable, error = %e, "Build tool check failed");
            }
        }
    }
}
