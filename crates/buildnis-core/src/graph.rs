//! Loading the project -> module -> build graph

use buildnis_config::placeholder::unresolved_placeholders;
use buildnis_config::{
    BuildDocument, ConfigNode, DocumentStore, ModuleDocument, PlaceholderResolver, ProjectDocument,
    Schema, Value,
};
use buildnis_fs::NormalizedPath;

use crate::{Error, Result};

/// Field of the project artifact holding the expanded module documents.
pub const MODULE_CONFIGS: &str = "module_configs";
/// Field of the project artifact holding the expanded build documents.
pub const BUILD_CONFIGS: &str = "build_configs";

/// A module together with the builds it references, in reference order.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedModule {
    pub document: ModuleDocument,
    pub builds: Vec<BuildDocument>,
}

/// The documents of one project, owned for the duration of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectGraph {
    pub project: ProjectDocument,
    pub modules: Vec<LoadedModule>,
}

impl ProjectGraph {
    /// Expand placeholders top-down.
    ///
    /// The project is expanded on its own, each module with the expanded
    /// project as outer scope, each build with the expanded project and
    /// module. Every document is expanded until it stops changing or `limit`
    /// passes ran. Returns false if any document did not settle.
    pub fn expand_placeholders(&mut self, resolver: &PlaceholderResolver, limit: usize) -> bool {
        let source = self.project.source().clone();
        let mut stable = expand(resolver, self.project.node_mut(), &[], limit, &source);

        let project = self.project.node();
        for module in &mut self.modules {
            let source = module.document.source().clone();
            stable &= expand(resolver, module.document.node_mut(), &[project], limit, &source);

            let module_node = module.document.node();
            for build in &mut module.builds {
                let source = build.source().clone();
                stable &= expand(resolver, build.node_mut(), &[project, module_node], limit, &source);
            }
        }
        stable
    }

    /// The project document with every module and build embedded, as
    /// written to the project artifact.
    pub fn artifact_node(&self) -> ConfigNode {
        let mut node = self.project.node().clone();
        let modules: Vec<Value> = self
            .modules
            .iter()
            .map(|m| m.document.node().clone().into_value())
            .collect();
        let builds: Vec<Value> = self
            .modules
            .iter()
            .flat_map(|m| m.builds.iter())
            .map(|b| b.node().clone().into_value())
            .collect();
        node.set(MODULE_CONFIGS, modules);
        node.set(BUILD_CONFIGS, builds);
        node
    }

    pub fn build_count(&self) -> usize {
        self.modules.iter().map(|m| m.builds.len()).sum()
    }
}

fn expand(
    resolver: &PlaceholderResolver,
    node: &mut ConfigNode,
    parents: &[&ConfigNode],
    limit: usize,
    source: &NormalizedPath,
) -> bool {
    let expansion = resolver.resolve_until_stable(node, parents, limit);
    if !expansion.stable {
        tracing::warn!(
            path = %source,
            passes = expansion.passes,
            "Placeholders still changing after the pass limit, check for self references"
        );
    }
    let unresolved = unresolved_placeholders(node);
    if !unresolved.is_empty() {
        tracing::debug!(path = %source, ?unresolved, "Unresolved placeholders left in place");
    }
    expansion.stable
}

/// Loads a project and everything it references.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProjectGraphLoader {
    store: DocumentStore,
}

impl ProjectGraphLoader {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    /// Load the project at `project_file`, then its modules in `modules`
    /// order, then each module's builds in `supported_builds` order.
    ///
    /// File references are rewritten to absolute paths on the way: modules
    /// and the dependency document relative to the project directory,
    /// builds relative to their module's directory.
    ///
    /// # Errors
    ///
    /// The first document that fails to load aborts the whole load.
    pub fn load(&self, project_file: &NormalizedPath) -> Result<ProjectGraph> {
        let project_file = NormalizedPath::absolute(project_file)
            .map_err(|e| buildnis_fs::Error::io(project_file.to_native(), e))?;
        if !project_file.is_file() {
            return Err(Error::ProjectNotFound {
                path: project_file.to_native(),
            });
        }

        let node = self.store.load(&project_file, Schema::Project)?;
        let mut project = ProjectDocument::new(node, project_file);
        let module_files = project.absolutize_modules()?;
        project.absolutize_dependency_config();
        tracing::info!(project = %project.name(), modules = module_files.len(), "Loaded project");

        let mut modules = Vec::with_capacity(module_files.len());
        for module_file in module_files {
            let node = self.store.load(&module_file, Schema::Module)?;
            let mut document = ModuleDocument::new(node, module_file);
            let build_files = document.absolutize_builds()?;
            tracing::debug!(module = %document.source(), builds = build_files.len(), "Loaded module");

            let mut builds = Vec::with_capacity(build_files.len());
            for build_file in build_files {
                let node = self.store.load(&build_file, Schema::Build)?;
                tracing::debug!(build = %build_file, "Loaded build");
                builds.push(BuildDocument::new(node, build_file));
            }
            modules.push(LoadedModule { document, builds });
        }

        Ok(ProjectGraph { project, modules })
    }

    /// Rebuild the graph from a project artifact written by an earlier run.
    ///
    /// The embedded `module_configs` and `build_configs` stand in for the
    /// authoring modules and builds, matched up through the absolute
    /// `modules` and `supported_builds` references. The project keeps
    /// `project_file` as its source so the project directory is still the
    /// authoring one.
    ///
    /// # Errors
    ///
    /// Load errors of the artifact itself, or `InvalidField` when the
    /// embedded documents do not line up with the references.
    pub fn load_artifact(
        &self,
        artifact: &NormalizedPath,
        project_file: &NormalizedPath,
    ) -> Result<ProjectGraph> {
        let mut node = self.store.load(artifact, Schema::Project)?;
        let module_nodes = take_documents(&mut node, MODULE_CONFIGS, artifact)?;
        let build_nodes = take_documents(&mut node, BUILD_CONFIGS, artifact)?;

        let project = ProjectDocument::new(node, project_file.clone());
        let module_files = project.module_files()?;
        if module_files.len() != module_nodes.len() {
            return Err(misaligned(artifact, MODULE_CONFIGS, module_files.len(), module_nodes.len()));
        }

        let documents: Vec<ModuleDocument> = module_files
            .into_iter()
            .zip(module_nodes)
            .map(|(file, node)| ModuleDocument::new(node, NormalizedPath::new(file)))
            .collect();
        let build_files = documents
            .iter()
            .map(ModuleDocument::build_files)
            .collect::<buildnis_config::Result<Vec<_>>>()?;
        let referenced: usize = build_files.iter().map(Vec::len).sum();
        if referenced != build_nodes.len() {
            return Err(misaligned(artifact, BUILD_CONFIGS, referenced, build_nodes.len()));
        }

        let mut build_nodes = build_nodes.into_iter();
        let modules: Vec<LoadedModule> = documents
            .into_iter()
            .zip(build_files)
            .map(|(document, files)| {
                let builds = files
                    .into_iter()
                    .zip(build_nodes.by_ref())
                    .map(|(file, node)| BuildDocument::new(node, NormalizedPath::new(file)))
                    .collect();
                LoadedModule { document, builds }
            })
            .collect();

        tracing::info!(
            project = %project.name(),
            path = %artifact,
            modules = modules.len(),
            "Loaded project from artifact"
        );
        Ok(ProjectGraph { project, modules })
    }
}

/// Remove the list of embedded documents stored under `field`.
fn take_documents(
    node: &mut ConfigNode,
    field: &str,
    artifact: &NormalizedPath,
) -> Result<Vec<ConfigNode>> {
    let invalid = |message: &str| buildnis_config::Error::InvalidField {
        path: artifact.to_native(),
        field: field.to_string(),
        message: message.to_string(),
    };
    let Some(Value::Array(entries)) = node.take(field) else {
        return Err(invalid("expected a list of embedded documents").into());
    };
    entries
        .into_iter()
        .map(|entry| ConfigNode::from_value(entry).ok_or_else(|| invalid("entry is not an object").into()))
        .collect()
}

fn misaligned(artifact: &NormalizedPath, field: &str, expected: usize, found: usize) -> Error {
    buildnis_config::Error::InvalidField {
        path: artifact.to_native(),
        field: field.to_string(),
        message: format!("{} documents referenced, {} embedded", expected, found),
    }
    .into()
}
