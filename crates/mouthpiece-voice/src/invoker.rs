//! Runs external executables on behalf of the pipeline stages.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

/// Default upper bound on a single tool execution.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(60);

/// A program plus its argument vector.
///
/// Arguments are passed to the process directly; nothing is interpreted by a
/// shell, so artifact paths never need quoting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Human-readable rendering used in logs and errors.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|part| {
                let part = part.to_string_lossy();
                if part.is_empty() || part.contains(char::is_whitespace) {
                    format!("\"{}\"", part)
                } else {
                    part.into_owned()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// A tool ran to completion but reported failure.
#[derive(Debug, Clone, Error)]
#[error("`{command_line}` exited with {}: {}", exit_label(.exit_code), .stderr.trim())]
pub struct ToolExecutionError {
    /// Exit code, or `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub command_line: String,
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    /// The program could not be started (missing from PATH, not executable, ...).
    #[error("failed to start {program}: {source}")]
    Unavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command_line}` timed out after {} seconds", .timeout.as_secs())]
    Timeout {
        command_line: String,
        timeout: Duration,
    },

    #[error(transparent)]
    Execution(#[from] ToolExecutionError),

    #[error("failed to collect tool output: {0}")]
    Io(std::io::Error),
}

/// Spawns external tools with captured output and a bounded run time.
///
/// Children are spawned with `kill_on_drop`, so a run abandoned because of a
/// timeout or because the owning request was dropped never leaves an orphaned
/// process behind.
#[derive(Debug, Clone)]
pub struct ToolInvoker {
    timeout: Duration,
}

impl Default for ToolInvoker {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL_TIMEOUT)
    }
}

impl ToolInvoker {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs `command` and returns its stdout.
    ///
    /// Fails with [`ToolError::Execution`] on a non-zero exit; both streams are
    /// captured in the error for diagnostics.
    pub async fn run(&self, command: &ToolCommand) -> Result<String, ToolError> {
        let command_line = command.command_line();
        let started = Instant::now();

        let child = Command::new(command.program())
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ToolError::Unavailable {
                program: command.program().display().to_string(),
                source,
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                warn!(command = %command_line, timeout_secs = self.timeout.as_secs(), "tool timed out");
                ToolError::Timeout {
                    command_line: command_line.clone(),
                    timeout: self.timeout,
                }
            })?
            .map_err(ToolError::Io)?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            warn!(
                command = %command_line,
                exit_code = ?output.status.code(),
                stderr = %stderr.trim(),
                "tool exited with failure"
            );
            return Err(ToolError::Execution(ToolExecutionError {
                exit_code: output.status.code(),
                stdout,
                stderr,
                command_line,
            }));
        }

        debug!(
            command = %command_line,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "tool finished"
        );
        Ok(stdout)
    }

    /// Checks that `program` can be started by running it with `version_flag`.
    pub async fn probe(&self, program: &Path, version_flag: &str) -> Result<(), ToolError> {
        self.run(&ToolCommand::new(program).arg(version_flag))
            .await
            .map(|_| ())
    }
}
