//! Process exit codes

use crate::Error;

/// Exit status of the `buildnis` binary, one per error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    CommandLine = 1,
    LoadFile = 2,
    MissingDirectory = 3,
    Write = 4,
    VersionTooOld = 5,
    Import = 6,
    InvalidConfig = 7,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

fn from_fs(error: &buildnis_fs::Error) -> ExitCode {
    match error {
        buildnis_fs::Error::NotFound { .. } => ExitCode::LoadFile,
        buildnis_fs::Error::Io { .. } | buildnis_fs::Error::LockFailed { .. } => ExitCode::Write,
    }
}

fn from_config(error: &buildnis_config::Error) -> ExitCode {
    use buildnis_config::Error as E;
    match error {
        E::Fs(inner) => from_fs(inner),
        E::NotFound { .. } | E::Read { .. } | E::Parse { .. } | E::InvalidVersion { .. } => {
            ExitCode::LoadFile
        }
        E::SchemaMismatch { .. } | E::InvalidField { .. } => ExitCode::InvalidConfig,
        E::VersionTooOld { .. } => ExitCode::VersionTooOld,
        E::Write { .. } => ExitCode::Write,
    }
}

fn from_check(error: &buildnis_check::Error) -> ExitCode {
    use buildnis_check::Error as E;
    match error {
        E::Fs(inner) => from_fs(inner),
        E::Config(inner) => from_config(inner),
        E::MissingDirectory { .. } => ExitCode::MissingDirectory,
        E::Import { .. } | E::Process { .. } | E::Timeout { .. } => ExitCode::Import,
        E::MalformedRecord { .. } | E::InvalidRegex { .. } => ExitCode::InvalidConfig,
    }
}

impl From<&Error> for ExitCode {
    fn from(error: &Error) -> Self {
        match error {
            Error::ProjectNotFound { .. } => ExitCode::LoadFile,
            Error::Fs(inner) => from_fs(inner),
            Error::Config(inner) => from_config(inner),
            Error::Check(inner) => from_check(inner),
        }
    }
}
