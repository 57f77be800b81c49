use std::time::Duration;

/// Scheduler settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Jobs allowed to run at once; 0 and 1 both mean sequential
    pub workers: usize,
    /// Interval between heartbeats while waiting on a job
    pub heartbeat_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            heartbeat_interval: Duration::from_secs(30),
        }
    }
}

impl SchedulerConfig {
    /// Run up to `workers` jobs at once
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            ..Default::default()
        }
    }

    /// Override the heartbeat interval
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Whether jobs run one at a time with live output
    pub fn is_sequential(&self) -> bool {
        self.workers <= 1
    }
}
