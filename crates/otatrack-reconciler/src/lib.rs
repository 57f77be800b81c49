//! Per-target reconciliation
//!
//! A [`Reconciler`] takes one device identity through a full check: ask the
//! check-in endpoint for an update, read the target build out of the package,
//! decide novelty against the processed-update state, and only after a confirmed
//! notification register the update, bump the config, publish a release and commit.
//!
//! Network and tool collaborators sit behind the traits in [`ports`]; [`adapters`]
//! binds them to the concrete clients.

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod adapters;
pub mod options;
pub mod outcome;
pub mod ports;
pub mod reconciler;
pub mod target;

pub use options::{DedupKey, ReconcileOptions};
pub use outcome::{FailureReason, ReconcileOutcome, ReconcileStatus};
pub use ports::{CommitRecorder, MetadataSource, Notifier, ReleasePublisher, UpdateSource};
pub use reconciler::Reconciler;
pub use target::Target;
