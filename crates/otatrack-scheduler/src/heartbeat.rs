use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

/// Snapshot of progress while the coordinator waits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heartbeat {
    /// Tasks in total
    pub total: usize,
    /// Tasks finished, flushed or not
    pub completed: usize,
    /// Tasks currently holding a worker
    pub running: usize,
    /// Finished tasks waiting behind an earlier one
    pub buffered: usize,
    /// Earliest task not yet printed
    pub oldest_pending: Option<String>,
    /// How long that task has been running, if it started
    pub oldest_elapsed: Option<Duration>,
}

impl fmt::Display for Heartbeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Still working: {}/{} completed, {} running, {} buffered",
            self.completed, self.total, self.running, self.buffered
        )?;
        match (&self.oldest_pending, self.oldest_elapsed) {
            (Some(label), Some(elapsed)) => {
                write!(f, "; waiting on {label} for {}s", elapsed.as_secs())
            }
            (Some(label), None) => write!(f, "; waiting on {label} (queued)"),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Queued,
    Running(Instant),
    Finished,
}

/// Per-task phases shared between workers and the coordinator
#[derive(Debug)]
pub(crate) struct Progress {
    labels: Vec<String>,
    phases: Vec<Phase>,
}

impl Progress {
    pub(crate) fn new(labels: Vec<String>) -> Self {
        let phases = vec![Phase::Queued; labels.len()];
        Self { labels, phases }
    }

    pub(crate) fn set(&mut self, index: usize, phase: Phase) {
        if let Some(slot) = self.phases.get_mut(index) {
            *slot = phase;
        }
    }

    pub(crate) fn label(&self, index: usize) -> &str {
        self.labels.get(index).map_or("", String::as_str)
    }

    /// `next_unflushed` is the index the coordinator is blocked on
    pub(crate) fn heartbeat(&self, next_unflushed: usize, now: Instant) -> Heartbeat {
        let completed = self
            .phases
            .iter()
            .filter(|p| matches!(p, Phase::Finished))
            .count();
        let running = self
            .phases
            .iter()
            .filter(|p| matches!(p, Phase::Running(_)))
            .count();
        let buffered = self
            .phases
            .iter()
            .skip(next_unflushed)
            .filter(|p| matches!(p, Phase::Finished))
            .count();
        let oldest_elapsed = match self.phases.get(next_unflushed) {
            Some(Phase::Running(started)) => Some(now.saturating_duration_since(*started)),
            _ => None,
        };
        Heartbeat {
            total: self.phases.len(),
            completed,
            running,
            buffered,
            oldest_pending: self.labels.get(next_unflushed).cloned(),
            oldest_elapsed,
        }
    }
}
