//! Release publishing and auto-commit
//!
//! Both collaborators shell out to the user's own tooling (`gh`, `git`) so they pick
//! up whatever authentication is already configured. Every child process is spawned
//! with `kill_on_drop` and bounded by a timeout.

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod error;
pub mod git;
pub mod github;
pub mod notes;
pub mod process;

pub use error::ReleaseError;
pub use git::{CommitOutcome, CommitRequest, GitCommitter};
pub use github::{GhCli, PublishOutcome};
pub use notes::{ReleaseRequest, UNKNOWN_DEVICE, UNKNOWN_TITLE};
pub use process::{DEFAULT_TOOL_TIMEOUT, ToolOutput, locate, run_tool};
