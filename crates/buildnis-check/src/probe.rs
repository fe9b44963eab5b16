//! Running external programs to probe for tools and dependencies

use std::process::Stdio;
use std::time::Duration;

use regex::Regex;
use tokio::process::Command;

use crate::{Error, Result};

/// Hard upper bound for a single probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(120);

/// One invocation of an external program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    pub executable: String,
    pub args: Vec<String>,
    /// Script sourced (Unix) or called (Windows) before the executable runs.
    pub env_script: Option<String>,
    pub env_script_args: Vec<String>,
    /// Always [`PROBE_TIMEOUT`] outside of this crate's tests.
    pub(crate) timeout: Duration,
}

impl ProbeRequest {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            args: Vec::new(),
            env_script: None,
            env_script_args: Vec::new(),
            timeout: PROBE_TIMEOUT,
        }
    }

    /// Append an argument; empty arguments are dropped.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        let arg = arg.into();
        if !arg.is_empty() {
            self.args.push(arg);
        }
        self
    }

    /// Run through an environment script; an empty script name means none.
    pub fn env_script(mut self, script: impl Into<String>, arg: impl Into<String>) -> Self {
        let script = script.into();
        if !script.is_empty() {
            self.env_script = Some(script);
            let arg = arg.into();
            if !arg.is_empty() {
                self.env_script_args.push(arg);
            }
        }
        self
    }

    #[cfg(test)]
    pub(crate) fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Captured result of a probe that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `None` if the process was terminated by a signal.
    pub status: Option<i32>,
}

/// Something that can run a [`ProbeRequest`].
///
/// A non-zero exit status is not an error here. Callers decide success by
/// matching the output.
pub trait ExternalProbe {
    fn run(&self, request: &ProbeRequest) -> Result<ProbeOutput>;
}

/// Runs probes as child processes.
///
/// Each call drives the child on a single-threaded tokio runtime so the
/// timeout can kill it.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandProbe;

impl CommandProbe {
    pub fn new() -> Self {
        Self
    }

    fn command(request: &ProbeRequest) -> Command {
        let Some(script) = &request.env_script else {
            let mut cmd = Command::new(&request.executable);
            cmd.args(&request.args);
            return cmd;
        };

        if cfg!(windows) {
            let line = format!(
                "call {} && {}",
                cmd_line(script, &request.env_script_args),
                cmd_line(&request.executable, &request.args)
            );
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(line);
            cmd
        } else {
            let line = format!(
                ". {} && {}",
                sh_line(script, &request.env_script_args),
                sh_line(&request.executable, &request.args)
            );
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(line);
            cmd
        }
    }
}

impl ExternalProbe for CommandProbe {
    fn run(&self, request: &ProbeRequest) -> Result<ProbeOutput> {
        let program = request.executable.clone();
        let spawn_error = |source| Error::Process {
            program: program.clone(),
            source,
        };

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(spawn_error)?;

        let mut cmd = Self::command(request);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(
            executable = %request.executable,
            args = ?request.args,
            env_script = ?request.env_script,
            "Running probe"
        );

        let output = runtime.block_on(async {
            tokio::time::timeout(request.timeout, cmd.output()).await
        });
        let output = match output {
            Ok(result) => result.map_err(spawn_error)?,
            Err(_) => {
                return Err(Error::Timeout {
                    program,
                    seconds: request.timeout.as_secs(),
                });
            }
        };

        Ok(ProbeOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: output.status.code(),
        })
    }
}

fn sh_quote(word: &str) -> String {
    format!("'{}'", word.replace('\'', r"'\''"))
}

fn sh_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .map(sh_quote)
        .collect::<Vec<_>>()
        .join(" ")
}

fn cmd_line(program: &str, args: &[String]) -> String {
    std::iter::once(format!("\"{}\"", program))
        .chain(args.iter().cloned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Match `pattern` against `stdout` and extract the version.
///
/// The version is capture group 1 of the first match, or the whole match if
/// the pattern has no group. `Ok(None)` means no match.
///
/// # Errors
///
/// [`Error::InvalidRegex`] if `pattern` does not compile.
pub fn match_version(stdout: &str, pattern: &str) -> Result<Option<String>> {
    let regex = Regex::new(pattern).map_err(|e| Error::InvalidRegex {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;
    let Some(captures) = regex.captures(stdout) else {
        return Ok(None);
    };
    let matched = if regex.captures_len() > 1 {
        captures.get(1)
    } else {
        captures.get(0)
    };
    Ok(matched.map(|m| m.as_str().to_string()))
}
