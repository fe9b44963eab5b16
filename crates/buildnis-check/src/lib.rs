//! Verification of build tools and project dependencies
//!
//! Both kinds of record are checked by running an external program (the
//! probe) and matching its standard output against a regular expression.
//! Failing records are marked unchecked and logged; they never abort the
//! batch they are part of.

pub mod dependency;
pub mod error;
pub mod probe;
pub mod tools;

pub use dependency::{DependencyChecker, DependencyRecord, InstallHook, NoInstall};
pub use error::{Error, Result};
pub use probe::{CommandProbe, ExternalProbe, PROBE_TIMEOUT, ProbeOutput, ProbeRequest, match_version};
pub use tools::{ToolRecord, ToolVerifier, discover_tools};
