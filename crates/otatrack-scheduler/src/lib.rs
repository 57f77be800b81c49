//! Runs many independent jobs with bounded parallelism
//!
//! With one worker, jobs run one after another and print as they go. With more,
//! each job writes into its own buffered [`OutputSink`](otatrack_console::OutputSink)
//! and a coordinator prints finished buffers strictly in submission order, so the
//! console reads the same as a sequential run. While it waits on a slow job the
//! coordinator prints a heartbeat.

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

mod config;
mod heartbeat;
mod job;
mod scheduler;

pub use config::SchedulerConfig;
pub use heartbeat::Heartbeat;
pub use job::{Job, Task};
pub use scheduler::{ScheduleReport, Scheduler};
