//! File names of generated artifacts

use buildnis_config::Schema;
use buildnis_fs::NormalizedPath;

/// Where a run reads and writes its generated documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub host: NormalizedPath,
    pub build_tools: NormalizedPath,
    pub dependency: NormalizedPath,
    pub project: NormalizedPath,
}

impl ArtifactPaths {
    /// `<config_dir>/<host_name>_<schema>.json` for every artifact.
    pub fn plan(config_dir: &NormalizedPath, host_name: &str) -> Self {
        let path = |schema: Schema| config_dir.join(&schema.artifact_file_name(host_name));
        Self {
            host: path(Schema::Host),
            build_tools: path(Schema::BuildTools),
            dependency: path(Schema::ProjectDependency),
            project: path(Schema::Project),
        }
    }

    pub fn all(&self) -> [&NormalizedPath; 4] {
        [&self.host, &self.build_tools, &self.dependency, &self.project]
    }

    /// Artifacts already on disk.
    pub fn existing(&self) -> Vec<&NormalizedPath> {
        self.all().into_iter().filter(|p| p.is_file()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_host_and_schema() {
        let paths = ArtifactPaths::plan(&NormalizedPath::new("/work/out"), "buildbox");
        assert_eq!(paths.host.as_str(), "/work/out/buildbox_host_config.json");
        assert_eq!(paths.build_tools.as_str(), "/work/out/buildbox_build_tool_config.json");
        assert_eq!(
            paths.dependency.as_str(),
            "/work/out/buildbox_project_dependency_config.json"
        );
        assert_eq!(paths.project.as_str(), "/work/out/buildbox_project_config.json");
    }
}
