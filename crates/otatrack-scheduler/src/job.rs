use async_trait::async_trait;
use otatrack_console::OutputSink;

/// Unit of work run by the scheduler
#[async_trait]
pub trait Job: Send + Sync + 'static {
    /// Per-task input
    type Input: Send + 'static;

    /// Run one task, reporting to `sink`; returns the task's exit code
    async fn run(&self, input: Self::Input, sink: &OutputSink) -> u8;
}

/// Labelled job input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task<T> {
    /// Name shown in headers and heartbeats
    pub label: String,
    /// Job input
    pub input: T,
}

impl<T> Task<T> {
    /// Task named `label`
    pub fn new(label: impl Into<String>, input: T) -> Self {
        Self {
            label: label.into(),
            input,
        }
    }
}
