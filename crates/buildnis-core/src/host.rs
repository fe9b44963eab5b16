//! Host facts
//!
//! The engine only needs a flat record of facts about the machine it runs
//! on. [`HostProvider`] is the seam; [`SystemHost`] is the real collector.
//! Facts that cannot be determined are left at their zero value.

use buildnis_config::placeholder::{
    HOST_CPU_ARCH, HOST_NAME, HOST_NUM_CORES, HOST_NUM_LOG_CORES, HOST_OS,
};
use buildnis_config::{ConfigNode, Constants};
use serde::{Deserialize, Serialize};

pub const OS_WINDOWS: &str = "Windows";
pub const OS_LINUX: &str = "Linux";
pub const OS_OSX: &str = "OSX";

/// Everything the host artifact records about the machine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostFacts {
    pub host_name: String,
    pub os: String,
    pub os_vers_major: String,
    pub os_vers: String,
    pub cpu_arch: String,
    pub cpu: String,
    /// Bytes
    pub level2_cache: u64,
    /// Bytes
    pub level3_cache: u64,
    pub num_cores: usize,
    pub num_logical_cores: usize,
    /// Bytes
    pub ram_total: u64,
    pub gpu: Vec<String>,
}

impl HostFacts {
    /// Body of the host artifact.
    pub fn to_node(&self) -> ConfigNode {
        serde_json::to_value(self)
            .ok()
            .and_then(ConfigNode::from_value)
            .unwrap_or_default()
    }

    /// Fill the `HOST_*` placeholder constants.
    pub fn apply_constants(&self, constants: &mut Constants) {
        constants.set(HOST_OS, self.os.as_str());
        constants.set(HOST_NAME, self.host_name.as_str());
        constants.set(HOST_CPU_ARCH, self.cpu_arch.as_str());
        constants.set(HOST_NUM_CORES, self.num_cores.to_string());
        constants.set(HOST_NUM_LOG_CORES, self.num_logical_cores.to_string());
    }
}

/// Source of [`HostFacts`].
pub trait HostProvider {
    fn collect(&self) -> HostFacts;
}

/// Collects facts about the machine the process runs on.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHost;

impl HostProvider for SystemHost {
    fn collect(&self) -> HostFacts {
        let mut facts = HostFacts {
            host_name: host_name(),
            os: os_name().to_string(),
            cpu_arch: arch_name().to_string(),
            num_cores: num_cpus::get_physical(),
            num_logical_cores: num_cpus::get(),
            ..Default::default()
        };
        if cfg!(target_os = "linux") {
            collect_linux(&mut facts);
        }
        tracing::debug!(
            host = %facts.host_name,
            os = %facts.os,
            arch = %facts.cpu_arch,
            "Collected host facts"
        );
        facts
    }
}

/// OS name as used in artifact contents and configure script directories.
pub fn os_name() -> &'static str {
    match std::env::consts::OS {
        "windows" => OS_WINDOWS,
        "linux" => OS_LINUX,
        "macos" => OS_OSX,
        other => other,
    }
}

/// `x64` and `x86` for Intel architectures, the target name otherwise.
pub fn arch_name() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "x64",
        "x86" => "x86",
        other => other,
    }
}

fn read_trimmed(path: &str) -> Option<String> {
    std::fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn host_name() -> String {
    read_trimmed("/proc/sys/kernel/hostname")
        .or_else(|| std::env::var("HOSTNAME").ok())
        .or_else(|| std::env::var("COMPUTERNAME").ok())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

fn collect_linux(facts: &mut HostFacts) {
    if let Some(release) = read_trimmed("/proc/sys/kernel/osrelease") {
        facts.os_vers_major = release.split('.').next().unwrap_or_default().to_string();
        facts.os_vers = release;
    }
    if let Some(cpuinfo) = read_trimmed("/proc/cpuinfo") {
        facts.cpu = parse_cpu_model(&cpuinfo).unwrap_or_default();
    }
    if let Some(meminfo) = read_trimmed("/proc/meminfo") {
        facts.ram_total = parse_mem_total(&meminfo).unwrap_or_default();
    }
    for index in 0..8 {
        let dir = format!("/sys/devices/system/cpu/cpu0/cache/index{}", index);
        let (Some(level), Some(size)) = (
            read_trimmed(&format!("{}/level", dir)),
            read_trimmed(&format!("{}/size", dir)),
        ) else {
            continue;
        };
        let size = parse_cache_size(&size).unwrap_or_default();
        match level.as_str() {
            "2" => facts.level2_cache = size,
            "3" => facts.level3_cache = size,
            _ => {}
        }
    }
}

/// First `model name` in `/proc/cpuinfo`.
fn parse_cpu_model(cpuinfo: &str) -> Option<String> {
    cpuinfo.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        (key.trim() == "model name").then(|| value.trim().to_string())
    })
}

/// `MemTotal` of `/proc/meminfo` in bytes.
fn parse_mem_total(meminfo: &str) -> Option<u64> {
    let line = meminfo.lines().find(|l| l.starts_with("MemTotal:"))?;
    let kib: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kib * 1024)
}

/// Sizes like `512K` or `32M` in bytes.
fn parse_cache_size(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    let (digits, factor) = match raw.chars().last()? {
        'K' => (&raw[..raw.len() - 1], 1024),
        'M' => (&raw[..raw.len() - 1], 1024 * 1024),
        _ => (raw, 1),
    };
    digits.parse::<u64>().ok().map(|n| n * factor)
}
