//! Console output for concurrently reconciled targets
//!
//! Every target writes its status lines through its own [`OutputSink`]. A live sink
//! prints immediately; a buffered sink collects [`Line`]s so a coordinator can flush
//! them later, in submission order, to the shared [`Console`].

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

mod console;
mod line;
mod sink;

pub use console::Console;
pub use line::{Level, Line};
pub use sink::OutputSink;
