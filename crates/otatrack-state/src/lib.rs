//! Processed-update state
//!
//! Updates that have been announced are remembered in a plain text file, one
//! identifier per line. The file is only ever appended to. All writers in a process
//! share one [`WriteLock`], which config rewrites take as well, so appends from
//! concurrently reconciled targets never interleave.

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

mod error;
mod lock;
mod store;

pub use error::StateError;
pub use lock::WriteLock;
pub use store::{DEFAULT_STATE_FILE, ProcessedSet, StateStore};
