//! Buildnis core
//!
//! Ties the document model, placeholder expansion and verification together
//! into one configure run:
//!
//! 1. settle the configuration directory and collect host facts
//! 2. plan the artifact file names and reuse what can be reused
//! 3. discover and verify build tools
//! 4. load the project -> module -> build graph
//! 5. verify project dependencies
//! 6. expand placeholders top-down
//! 7. persist every artifact
//!
//! `--clean` / `--distclean` runs stop after step 2 and delete what the
//! generated-files ledger knows about.

pub mod config_dir;
pub mod configure;
pub mod error;
pub mod exit;
pub mod graph;
pub mod host;
pub mod ledger;
pub mod paths;

pub use configure::{CleanMode, Orchestrator, Phase, RunOptions, RunSummary};
pub use error::{Error, Result};
pub use exit::ExitCode;
pub use graph::{LoadedModule, ProjectGraph, ProjectGraphLoader};
pub use host::{HostFacts, HostProvider, SystemHost};
pub use ledger::{CleanReport, GeneratedFiles};
pub use paths::ArtifactPaths;
