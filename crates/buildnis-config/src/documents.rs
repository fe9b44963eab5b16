//! Typed views over the three authoring document kinds
//!
//! The views own their [`ConfigNode`] and expose only the fields the engine
//! itself reads or rewrites. Everything else stays in the node untouched.

use buildnis_fs::NormalizedPath;

use crate::{ConfigNode, Error, Result, Value};

pub const MODULES: &str = "modules";
pub const PROJECT_DEPENDENCY_CONFIG: &str = "project_dependency_config";
pub const HOST_CFG_FILE: &str = "host_cfg_file";
pub const BUILD_TOOLS_CFG_FILE: &str = "build_tools_cfg_file";
pub const PROJECT_DEPENDENCY_CONFIG_FILE: &str = "project_dependency_config_file";
pub const SUPPORTED_BUILDS: &str = "supported_builds";
pub const BUILD_CONFIG_FILE: &str = "build_config_file";
pub const MODULE_PATH: &str = "module_path";
pub const BUILD_CFG_PATH: &str = "build_cfg_path";

/// Directory containing `path`, or `.` for a bare file name.
fn directory_of(path: &NormalizedPath) -> NormalizedPath {
    path.parent().unwrap_or_else(|| NormalizedPath::new("."))
}

fn invalid_field(source: &NormalizedPath, field: &str, message: impl Into<String>) -> Error {
    Error::InvalidField {
        path: source.to_native(),
        field: field.to_string(),
        message: message.into(),
    }
}

/// The top-level `project_config` document.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDocument {
    node: ConfigNode,
    source: NormalizedPath,
}

impl ProjectDocument {
    /// Wrap a loaded project node; `source` is the file it came from.
    pub fn new(node: ConfigNode, source: NormalizedPath) -> Self {
        Self { node, source }
    }

    pub fn node(&self) -> &ConfigNode {
        &self.node
    }

    pub fn node_mut(&mut self) -> &mut ConfigNode {
        &mut self.node
    }

    pub fn source(&self) -> &NormalizedPath {
        &self.source
    }

    /// Directory of the project file; relative references are resolved here.
    pub fn project_dir(&self) -> NormalizedPath {
        directory_of(&self.source)
    }

    pub fn name(&self) -> String {
        self.node.str_or_default("name")
    }

    pub fn version(&self) -> String {
        self.node.str_or_default("version")
    }

    pub fn author(&self) -> String {
        self.node.str_or_default("author")
    }

    pub fn company(&self) -> String {
        self.node.str_or_default("company")
    }

    pub fn copyright_info(&self) -> String {
        self.node.str_or_default("copyright_info")
    }

    pub fn web_url(&self) -> String {
        self.node.str_or_default("web_url")
    }

    pub fn email(&self) -> String {
        self.node.str_or_default("email")
    }

    /// Module file references in declaration order, as written.
    ///
    /// A project without `modules` has no modules. Entries must be strings.
    pub fn module_files(&self) -> Result<Vec<String>> {
        let Some(value) = self.node.get(MODULES) else {
            return Ok(Vec::new());
        };
        let entries = value
            .as_array()
            .ok_or_else(|| invalid_field(&self.source, MODULES, "expected a list of file paths"))?;
        entries
            .iter()
            .map(|entry| {
                entry.as_str().map(str::to_string).ok_or_else(|| {
                    invalid_field(&self.source, MODULES, format!("{} is not a file path", entry))
                })
            })
            .collect()
    }

    /// Replace the module references, typically with absolute paths.
    pub fn set_module_files(&mut self, files: &[NormalizedPath]) {
        let files: Vec<Value> = files
            .iter()
            .map(|f| Value::String(f.as_str().to_string()))
            .collect();
        self.node.set(MODULES, files);
    }

    /// Rewrite every module reference to an absolute path against the
    /// project directory, returning the rewritten paths.
    pub fn absolutize_modules(&mut self) -> Result<Vec<NormalizedPath>> {
        let base = self.project_dir();
        let files: Vec<NormalizedPath> = self
            .module_files()?
            .iter()
            .map(|f| NormalizedPath::new(f).absolutize(&base))
            .collect();
        if self.node.contains(MODULES) {
            self.set_module_files(&files);
        }
        Ok(files)
    }

    /// The dependency document reference, if the project declares one.
    pub fn dependency_config(&self) -> Option<String> {
        self.node
            .get_str(PROJECT_DEPENDENCY_CONFIG)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// Rewrite `project_dependency_config` to an absolute path against the
    /// project directory.
    pub fn absolutize_dependency_config(&mut self) -> Option<NormalizedPath> {
        let path = NormalizedPath::new(self.dependency_config()?).absolutize(&self.project_dir());
        self.node.set(PROJECT_DEPENDENCY_CONFIG, path.as_str());
        Some(path)
    }

    pub fn set_host_cfg_file(&mut self, path: &NormalizedPath) {
        self.node.set(HOST_CFG_FILE, path.as_str());
    }

    pub fn set_build_tools_cfg_file(&mut self, path: &NormalizedPath) {
        self.node.set(BUILD_TOOLS_CFG_FILE, path.as_str());
    }

    pub fn set_project_dependency_config_file(&mut self, path: &NormalizedPath) {
        self.node.set(PROJECT_DEPENDENCY_CONFIG_FILE, path.as_str());
    }
}

/// A `module_config` document.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDocument {
    node: ConfigNode,
    source: NormalizedPath,
}

impl ModuleDocument {
    /// Wrap a loaded module node and record its directory as `module_path`.
    pub fn new(mut node: ConfigNode, source: NormalizedPath) -> Self {
        node.set(MODULE_PATH, directory_of(&source).as_str());
        Self { node, source }
    }

    pub fn node(&self) -> &ConfigNode {
        &self.node
    }

    pub fn node_mut(&mut self) -> &mut ConfigNode {
        &mut self.node
    }

    pub fn source(&self) -> &NormalizedPath {
        &self.source
    }

    pub fn module_path(&self) -> NormalizedPath {
        directory_of(&self.source)
    }

    /// `build_config_file` of every `supported_builds` entry, in order.
    pub fn build_files(&self) -> Result<Vec<String>> {
        let Some(value) = self.node.get(SUPPORTED_BUILDS) else {
            return Ok(Vec::new());
        };
        let entries = value.as_array().ok_or_else(|| {
            invalid_field(&self.source, SUPPORTED_BUILDS, "expected a list of build records")
        })?;
        entries
            .iter()
            .map(|entry| {
                entry
                    .get(BUILD_CONFIG_FILE)
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| {
                        invalid_field(
                            &self.source,
                            SUPPORTED_BUILDS,
                            format!("entry without a \"{}\" path", BUILD_CONFIG_FILE),
                        )
                    })
            })
            .collect()
    }

    /// Rewrite every `build_config_file` to an absolute path against the
    /// module directory, returning the rewritten paths.
    pub fn absolutize_builds(&mut self) -> Result<Vec<NormalizedPath>> {
        let base = self.module_path();
        let files: Vec<NormalizedPath> = self
            .build_files()?
            .iter()
            .map(|f| NormalizedPath::new(f).absolutize(&base))
            .collect();
        if let Some(entries) = self.node.get_array_mut(SUPPORTED_BUILDS) {
            for (entry, file) in entries.iter_mut().zip(&files) {
                if let Some(record) = entry.as_object_mut() {
                    record.insert(BUILD_CONFIG_FILE.to_string(), Value::String(file.as_str().to_string()));
                }
            }
        }
        Ok(files)
    }
}

/// A `build_config` document; its content is opaque to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildDocument {
    node: ConfigNode,
    source: NormalizedPath,
}

impl BuildDocument {
    /// Wrap a loaded build node and record its directory as `build_cfg_path`.
    pub fn new(mut node: ConfigNode, source: NormalizedPath) -> Self {
        node.set(BUILD_CFG_PATH, directory_of(&source).as_str());
        Self { node, source }
    }

    pub fn node(&self) -> &ConfigNode {
        &self.node
    }

    pub fn node_mut(&mut self) -> &mut ConfigNode {
        &mut self.node
    }

    pub fn source(&self) -> &NormalizedPath {
        &self.source
    }

    pub fn build_cfg_path(&self) -> NormalizedPath {
        directory_of(&self.source)
    }
}
