//! Child process execution

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::error::ReleaseError;

/// Deadline applied to each tool invocation
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(120);

/// Captured result of a finished process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, absent when killed by a signal
    pub status: Option<i32>,
    /// Captured stdout, lossily decoded
    pub stdout: String,
    /// Captured stderr, lossily decoded
    pub stderr: String,
}

impl ToolOutput {
    /// Whether the process exited with code 0
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Convert a failed run into [`ReleaseError::CommandFailed`]
    pub fn into_failure(self, command: impl Into<String>) -> ReleaseError {
        let stderr = if self.stderr.trim().is_empty() {
            self.stdout.trim().to_string()
        } else {
            self.stderr.trim().to_string()
        };
        ReleaseError::CommandFailed {
            command: command.into(),
            status: self.status,
            stderr,
        }
    }
}

/// Resolve `tool` on `PATH`
pub fn locate(tool: &str) -> Result<PathBuf, ReleaseError> {
    which::which(tool).map_err(|e| {
        debug!(tool, error = %e, "tool lookup failed");
        ReleaseError::ToolMissing(tool.to_string())
    })
}

/// Run `program` with `args` and capture its output
///
/// stdin is closed. The child is killed if the deadline passes or the returned
/// future is dropped.
pub async fn run_tool<I, S>(
    program: &Path,
    args: I,
    cwd: Option<&Path>,
    timeout: Duration,
) -> Result<ToolOutput, ReleaseError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<S> = args.into_iter().collect();
    let command_line = describe(program, &args);

    let mut command = Command::new(program);
    command
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    debug!(command = %command_line, "running tool");
    let child = command.spawn().map_err(|source| ReleaseError::Spawn {
        program: program.display().to_string(),
        source,
    })?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(|source| ReleaseError::Spawn {
            program: program.display().to_string(),
            source,
        })?,
        Err(_elapsed) => {
            return Err(ReleaseError::Timeout {
                command: command_line,
                after: timeout,
            });
        }
    };

    let result = ToolOutput {
        status: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };
    debug!(command = %command_line, status = ?result.status, "tool finished");
    Ok(result)
}

fn describe<S: AsRef<OsStr>>(program: &Path, args: &[S]) -> String {
    let name = program
        .file_name()
        .map_or_else(|| program.display().to_string(), |n| n.to_string_lossy().into_owned());
    let mut line = name;
    for arg in args {
        let arg = arg.as_ref().to_string_lossy();
        line.push(' ');
        if arg.contains(char::is_whitespace) || arg.is_empty() {
            line.push_str(&format!("{arg:?}"));
        } else {
            line.push_str(&arg);
        }
    }
    line
}
