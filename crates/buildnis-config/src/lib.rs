//! Configuration documents for Buildnis
//!
//! This crate holds everything that operates on a single JSON configuration
//! document or a tree of them:
//!
//! - [`ConfigNode`]: the ordered, dynamically shaped document model
//! - [`Schema`] and [`FileVersion`]: the `file_name` / `file_version` contract
//! - [`DocumentStore`]: validated loading and timestamped saving
//! - [`PlaceholderResolver`]: `${NAME}` / `${../NAME}` expansion over scope chains
//! - [`ProjectDocument`], [`ModuleDocument`], [`BuildDocument`]: typed views
//!   over the fields the engine itself manipulates

pub mod documents;
pub mod error;
pub mod node;
pub mod placeholder;
pub mod schema;
pub mod store;
pub mod version;

pub use documents::{BuildDocument, ModuleDocument, ProjectDocument};
pub use error::{Error, Result};
pub use node::{ConfigNode, Map, Value};
pub use placeholder::{Constants, Expansion, Frame, PlaceholderResolver};
pub use schema::Schema;
pub use store::{DocumentStore, SaveOutcome};
pub use version::{ENGINE_VERSION, FileVersion};
