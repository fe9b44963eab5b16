//! Schema identifiers carried in every document's `file_name` field

use std::fmt;

/// The kinds of document the engine reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Schema {
    Project,
    Module,
    Build,
    Host,
    BuildTools,
    ProjectDependency,
    ConfigDir,
}

impl Schema {
    /// The identifier stored in `file_name`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Schema::Project => "project_config",
            Schema::Module => "module_config",
            Schema::Build => "build_config",
            Schema::Host => "host_config",
            Schema::BuildTools => "build_tool_config",
            Schema::ProjectDependency => "project_dependency_config",
            Schema::ConfigDir => "config_dir",
        }
    }

    /// File name of a generated artifact: `<host>_<schema>.json`.
    pub fn artifact_file_name(&self, host_name: &str) -> String {
        format!("{}_{}.json", host_name, self.as_str())
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
