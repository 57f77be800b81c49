use std::time::Duration;

use thiserror::Error;

/// Errors raised by the release and commit collaborators
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// The executable is not on `PATH`
    #[error("{0} executable not found")]
    ToolMissing(String),

    /// The process could not be started
    #[error("Failed to run {program}: {source}")]
    Spawn {
        /// Program name
        program: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The process exited unsuccessfully
    #[error("{command} failed ({}): {stderr}", status.map_or_else(|| "signal".to_string(), |code| format!("exit {code}")))]
    CommandFailed {
        /// Command line, for diagnostics
        command: String,
        /// Exit code, absent when killed by a signal
        status: Option<i32>,
        /// Trimmed stderr, or stdout when stderr is empty
        stderr: String,
    },

    /// The process outlived its deadline and was killed
    #[error("{command} timed out after {after:?}")]
    Timeout {
        /// Command line, for diagnostics
        command: String,
        /// Deadline that elapsed
        after: Duration,
    },

    /// A field the release needs is missing or a placeholder
    #[error("{0} is missing or unknown")]
    MissingField(&'static str),

    /// The config file is not inside a git work tree
    #[error("Could not determine Git repository root ({0})")]
    NotARepository(String),
}
