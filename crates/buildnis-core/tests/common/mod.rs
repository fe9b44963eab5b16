#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use buildnis_check::{Error as CheckError, ExternalProbe, ProbeOutput, ProbeRequest};
use buildnis_core::{HostFacts, HostProvider};
use chrono::{NaiveDate, NaiveDateTime};
use tempfile::TempDir;

pub fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../test-fixtures/project")
}

fn copy_dir(src: &Path, dst: &Path) {
    fs::create_dir_all(dst).unwrap();
    for entry in fs::read_dir(src).unwrap() {
        let entry = entry.unwrap();
        let target = dst.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), &target).unwrap();
        }
    }
}

/// A scratch copy of the sample project.
///
/// `root` is canonical, matching the paths a run writes into its artifacts.
pub struct Project {
    pub temp: TempDir,
    root: PathBuf,
}

impl Project {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        copy_dir(&fixture_dir(), temp.path());
        let root = dunce::canonicalize(temp.path()).unwrap();
        Self { temp, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn project_file(&self) -> PathBuf {
        self.root().join("project_config.json")
    }

    pub fn scripts_dir(&self) -> PathBuf {
        self.root().join("configure_scripts")
    }

    pub fn read_json(&self, path: impl AsRef<Path>) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(path.as_ref()).unwrap()).unwrap()
    }
}

pub fn fixed_clock() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 7)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

pub struct FixedHost(pub HostFacts);

impl FixedHost {
    pub fn linux() -> Self {
        Self(HostFacts {
            host_name: "testhost".into(),
            os: "Linux".into(),
            os_vers_major: "6".into(),
            os_vers: "6.1.0".into(),
            cpu_arch: "x64".into(),
            cpu: "Test CPU".into(),
            num_cores: 4,
            num_logical_cores: 8,
            ram_total: 16 * 1024 * 1024 * 1024,
            ..Default::default()
        })
    }
}

impl HostProvider for FixedHost {
    fn collect(&self) -> HostFacts {
        self.0.clone()
    }
}

/// Answers configure scripts with a gcc descriptor and knows `gcc` and
/// `cmake`; everything else is not installed.
#[derive(Default)]
pub struct ScriptedProbe {
    pub calls: RefCell<Vec<ProbeRequest>>,
}

impl ScriptedProbe {
    pub fn executables(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|r| r.executable.clone()).collect()
    }
}

impl ExternalProbe for ScriptedProbe {
    fn run(&self, request: &ProbeRequest) -> buildnis_check::Result<ProbeOutput> {
        self.calls.borrow_mut().push(request.clone());
        let stdout = if request.executable.ends_with(".sh") {
            serde_json::json!({"build_tools": [{
                "name": "gcc",
                "version_arg": "--version",
                "version_regex": "gcc .* (\\d+\\.\\d+\\.\\d+)",
                "build_tool_exe": "gcc"
            }]})
            .to_string()
        } else {
            match request.executable.as_str() {
                "gcc" => "gcc (GCC) 13.2.0\n".to_string(),
                "cmake" => "cmake version 3.27.1\n".to_string(),
                other => {
                    return Err(CheckError::Process {
                        program: other.to_string(),
                        source: std::io::Error::new(std::io::ErrorKind::NotFound, "not installed"),
                    });
                }
            }
        };
        Ok(ProbeOutput {
            stdout,
            ..Default::default()
        })
    }
}
