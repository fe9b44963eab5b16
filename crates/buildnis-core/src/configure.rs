//! The configure run
//!
//! [`Orchestrator::run`] walks through the [`Phase`]s in order. Generated
//! artifacts, the project artifact included, are reused when they exist and
//! `--configure` was not given. Everything that is written goes through
//! [`DocumentStore::save_if_changed`] so reruns leave unchanged files alone.
//! `--clean` and `--distclean` run the same phases and then delete what the
//! ledger holds.

use std::fmt;
use std::path::{Path, PathBuf};

use buildnis_check::dependency::{dependencies_from_node, dependencies_into_node};
use buildnis_check::tools::{tools_from_node, tools_to_node};
use buildnis_check::{
    DependencyChecker, ExternalProbe, InstallHook, NoInstall, ToolRecord, ToolVerifier,
    discover_tools,
};
use buildnis_config::{ConfigNode, Constants, DocumentStore, PlaceholderResolver, Schema};
use buildnis_fs::{NormalizedPath, io};
use chrono::NaiveDateTime;

use crate::graph::ProjectGraphLoader;
use crate::host::{HostFacts, HostProvider};
use crate::ledger::{CleanReport, GeneratedFiles};
use crate::paths::ArtifactPaths;
use crate::{Error, Result, config_dir};

/// Default directory holding the per-OS configure scripts.
pub const DEFAULT_CONF_SCRIPTS_DIR: &str = "./configure_scripts";

/// Passes allowed per document before expansion is considered unstable.
pub const DEFAULT_EXPANSION_LIMIT: usize = 8;

/// Steps of a run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Init,
    HostResolved,
    PathsPlanned,
    ToolsResolved,
    ProjectLoaded,
    DependenciesResolved,
    PlaceholdersExpanded,
    Persisted,
    CleanedUp,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CleanMode {
    #[default]
    None,
    /// Delete generated files and directories.
    Clean,
    /// Like `Clean`; the caller also deletes the log file.
    DistClean,
}

/// What the caller asked for.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub project_file: PathBuf,
    /// Rediscover tools and recheck dependencies even if artifacts exist.
    pub configure: bool,
    pub build: bool,
    pub install: bool,
    pub clean: CleanMode,
    pub generated_conf_dir: Option<PathBuf>,
    pub conf_scripts_dir: PathBuf,
    pub expansion_limit: usize,
}

impl RunOptions {
    pub fn new(project_file: impl Into<PathBuf>) -> Self {
        Self {
            project_file: project_file.into(),
            configure: false,
            build: false,
            install: false,
            clean: CleanMode::None,
            generated_conf_dir: None,
            conf_scripts_dir: PathBuf::from(DEFAULT_CONF_SCRIPTS_DIR),
            expansion_limit: DEFAULT_EXPANSION_LIMIT,
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub phase: Phase,
    pub config_dir: NormalizedPath,
    pub artifacts: ArtifactPaths,
    pub host: HostFacts,
    pub tools_total: usize,
    pub tools_checked: usize,
    pub dependencies_total: usize,
    pub dependencies_checked: usize,
    /// False if some document's placeholders did not settle.
    pub placeholders_stable: bool,
    pub ledger: GeneratedFiles,
    pub clean: Option<CleanReport>,
}

/// Drives one configure (or clean) run.
pub struct Orchestrator<'a> {
    host: &'a dyn HostProvider,
    probe: &'a dyn ExternalProbe,
    installer: &'a dyn InstallHook,
    store: DocumentStore,
    clock: Option<NaiveDateTime>,
    phase: Phase,
    ledger: GeneratedFiles,
}

impl<'a> Orchestrator<'a> {
    pub fn new(host: &'a dyn HostProvider, probe: &'a dyn ExternalProbe) -> Self {
        Self {
            host,
            probe,
            installer: &NoInstall,
            store: DocumentStore::new(),
            clock: None,
            phase: Phase::Init,
            ledger: GeneratedFiles::new(),
        }
    }

    pub fn installer(mut self, installer: &'a dyn InstallHook) -> Self {
        self.installer = installer;
        self
    }

    /// Fix the instant used for the date and time placeholders.
    pub fn clock(mut self, clock: NaiveDateTime) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn advance(&mut self, next: Phase) {
        tracing::debug!(from = %self.phase, to = %next, "Phase transition");
        self.phase = next;
    }

    /// Run every phase for `options`.
    ///
    /// # Errors
    ///
    /// Document, directory and write errors abort the run. Failing tools and
    /// dependencies do not; they are reported in the summary.
    pub fn run(&mut self, options: &RunOptions) -> Result<RunSummary> {
        let project_file = NormalizedPath::absolute(&options.project_file)
            .map_err(|e| buildnis_fs::Error::io(&options.project_file, e))?;
        if !project_file.is_file() {
            return Err(Error::ProjectNotFound {
                path: project_file.to_native(),
            });
        }
        let project_file = project_file
            .canonical()
            .map_err(|e| buildnis_fs::Error::io(project_file.to_native(), e))?;
        let project_dir = project_file
            .parent()
            .unwrap_or_else(|| NormalizedPath::new("."));

        let config_dir =
            self.settle_config_dir(&project_dir, options.generated_conf_dir.as_deref())?;

        let host = self.host.collect();
        self.advance(Phase::HostResolved);

        let artifacts = ArtifactPaths::plan(&config_dir, &host.host_name);
        for existing in artifacts.existing() {
            self.ledger.track_file(existing);
        }
        self.advance(Phase::PathsPlanned);

        let mut summary = RunSummary {
            phase: self.phase,
            config_dir: config_dir.clone(),
            artifacts: artifacts.clone(),
            host: host.clone(),
            tools_total: 0,
            tools_checked: 0,
            dependencies_total: 0,
            dependencies_checked: 0,
            placeholders_stable: true,
            ledger: GeneratedFiles::new(),
            clean: None,
        };

        let tools = self.resolve_tools(options, &host, &artifacts)?;
        summary.tools_total = tools.len();
        summary.tools_checked = tools.iter().filter(|t| t.is_checked).count();
        self.advance(Phase::ToolsResolved);

        let loader = ProjectGraphLoader::new(self.store);
        let reuse_project = artifacts.project.is_file() && !options.configure;
        if options.configure && artifacts.project.is_file() {
            io::remove_file(&artifacts.project)?;
            tracing::info!(path = %artifacts.project, "Removed project artifact for reconfiguration");
        }
        let mut graph = if reuse_project {
            loader.load_artifact(&artifacts.project, &project_file)?
        } else {
            loader.load(&project_file)?
        };
        let resolver = PlaceholderResolver::new(self.constants(&graph.project, &config_dir, &host));
        self.advance(Phase::ProjectLoaded);

        let mut dependencies = None;
        if let Some(source) = graph.project.dependency_config() {
            let source = NormalizedPath::new(source);
            let mut project_scope = graph.project.node().clone();
            resolver.resolve_until_stable(&mut project_scope, &[], options.expansion_limit);
            let (mut node, total, checked) =
                self.resolve_dependencies(options, &source, &artifacts, &resolver, &project_scope)?;
            summary.dependencies_total = total;
            summary.dependencies_checked = checked;
            self.store.stamp(&mut node, Schema::ProjectDependency);
            dependencies = Some(node);
        }
        self.advance(Phase::DependenciesResolved);

        summary.placeholders_stable = graph.expand_placeholders(&resolver, options.expansion_limit);
        self.advance(Phase::PlaceholdersExpanded);

        if let Some(mut node) = dependencies {
            self.persist(&mut node, &artifacts.dependency)?;
            graph.project.set_project_dependency_config_file(&artifacts.dependency);
        }
        graph.project.set_host_cfg_file(&artifacts.host);
        graph.project.set_build_tools_cfg_file(&artifacts.build_tools);

        let mut project_node = graph.artifact_node();
        self.store.stamp(&mut project_node, Schema::Project);
        self.persist(&mut project_node, &artifacts.project)?;

        let mut host_node = host.to_node();
        self.store.stamp(&mut host_node, Schema::Host);
        self.persist(&mut host_node, &artifacts.host)?;

        config_dir::store_config_dir(&self.store, &project_dir, &config_dir)?;
        self.ledger.track_file(&config_dir::config_dir_file(&project_dir));
        self.advance(Phase::Persisted);

        if options.clean != CleanMode::None {
            tracing::info!(
                files = self.ledger.files().len(),
                dirs = self.ledger.dirs().len(),
                "Removing generated files"
            );
            summary.clean = Some(self.ledger.clean()?);
            self.advance(Phase::CleanedUp);
            return Ok(self.finish(summary));
        }

        if options.build {
            tracing::info!("Build requested, delegated to the build phase");
        }
        if options.install {
            tracing::info!("Install requested, delegated to the build phase");
        }
        Ok(self.finish(summary))
    }

    fn finish(&mut self, mut summary: RunSummary) -> RunSummary {
        if self.phase != Phase::CleanedUp {
            self.advance(Phase::Done);
        }
        summary.phase = self.phase;
        summary.ledger = self.ledger.clone();
        summary
    }

    fn settle_config_dir(
        &mut self,
        project_dir: &NormalizedPath,
        explicit: Option<&Path>,
    ) -> Result<NormalizedPath> {
        let config_dir = config_dir::settle(&self.store, project_dir, explicit)?;
        io::ensure_dir(&config_dir)?;
        if config_dir != *project_dir {
            self.ledger.track_dir(&config_dir);
        }
        let stored = config_dir::config_dir_file(project_dir);
        if stored.is_file() || explicit.is_some() {
            self.ledger.track_file(&stored);
        }
        tracing::info!(dir = %config_dir, "Configuration directory");
        Ok(config_dir)
    }

    fn constants(
        &self,
        project: &buildnis_config::ProjectDocument,
        config_dir: &NormalizedPath,
        host: &HostFacts,
    ) -> Constants {
        let mut constants = match self.clock {
            Some(clock) => Constants::with_clock(clock),
            None => Constants::new(),
        };
        constants.set_project(project, config_dir.as_str());
        host.apply_constants(&mut constants);
        constants
    }

    fn resolve_tools(
        &mut self,
        options: &RunOptions,
        host: &HostFacts,
        artifacts: &ArtifactPaths,
    ) -> Result<Vec<ToolRecord>> {
        if artifacts.build_tools.is_file() && !options.configure {
            let node = self.store.load(&artifacts.build_tools, Schema::BuildTools)?;
            let tools = tools_from_node(&node, &artifacts.build_tools)?;
            tracing::info!(
                path = %artifacts.build_tools,
                tools = tools.len(),
                "Reusing build tool configuration"
            );
            return Ok(tools);
        }

        let scripts_dir = NormalizedPath::absolute(&options.conf_scripts_dir)
            .map_err(|e| buildnis_fs::Error::io(&options.conf_scripts_dir, e))?;
        let mut tools = discover_tools(&scripts_dir, &host.os, &host.cpu_arch, self.probe)?;
        ToolVerifier::new(self.probe).force(true).verify(&mut tools);

        let mut node = tools_to_node(&tools);
        self.store.stamp(&mut node, Schema::BuildTools);
        self.persist(&mut node, &artifacts.build_tools)?;
        Ok(tools)
    }

    /// Load, expand and check the dependency document.
    ///
    /// Returns the updated document and the record counts.
    fn resolve_dependencies(
        &self,
        options: &RunOptions,
        source: &NormalizedPath,
        artifacts: &ArtifactPaths,
        resolver: &PlaceholderResolver,
        project: &ConfigNode,
    ) -> Result<(ConfigNode, usize, usize)> {
        let reuse = artifacts.dependency.is_file() && !options.configure;
        let path = if reuse { &artifacts.dependency } else { source };
        let mut node = self.store.load(path, Schema::ProjectDependency)?;
        tracing::info!(path = %path, cached = reuse, "Loaded project dependencies");

        let expansion = resolver.resolve_until_stable(&mut node, &[project], options.expansion_limit);
        if !expansion.stable {
            tracing::warn!(path = %path, "Dependency placeholders did not settle");
        }

        let mut records = dependencies_from_node(&node, path)?;
        DependencyChecker::new(self.probe)
            .installer(self.installer)
            .force(!reuse)
            .check(&mut records);
        dependencies_into_node(&mut node, &records);

        let checked = records.iter().filter(|r| r.is_checked).count();
        Ok((node, records.len(), checked))
    }

    fn persist(&mut self, node: &mut ConfigNode, path: &NormalizedPath) -> Result<()> {
        let outcome = self.store.save_if_changed(node, path)?;
        tracing::debug!(path = %path, ?outcome, "Persisted artifact");
        self.ledger.track_file(path);
        Ok(())
    }
}
