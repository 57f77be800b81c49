//! In-place rewrite of a device document's `incremental` field
//!
//! The document is parsed to decide *which* `incremental` to change, but the change
//! itself is made on the original text: only the value token on one line is replaced,
//! so comments, blank lines, quoting and line endings elsewhere survive byte for byte.
//! When a variant inherits its incremental from the base, a line is inserted into
//! that variant instead.

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

mod error;
mod line;
mod rewrite;
mod writer;

pub use error::ConfigWriteError;
pub use line::{QuoteStyle, rewrite_value, split_comment};
pub use rewrite::{EditOperation, IncrementalEdit, rewrite_incremental};
pub use writer::ConfigWriter;
