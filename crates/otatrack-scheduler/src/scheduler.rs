use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use otatrack_console::{Console, Level, Line, OutputSink};
use parking_lot::Mutex;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::config::SchedulerConfig;
use crate::heartbeat::{Phase, Progress};
use crate::job::{Job, Task};

/// Floor for the heartbeat period; tokio intervals reject zero
const MIN_HEARTBEAT: Duration = Duration::from_millis(10);

/// Exit codes of a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleReport {
    /// Exit code of each task, in submission order
    pub codes: Vec<u8>,
}

impl ScheduleReport {
    /// Highest task exit code, 0 when there were no tasks
    pub fn exit_code(&self) -> u8 {
        self.codes.iter().copied().max().unwrap_or(0)
    }

    /// Tasks that exited non-zero
    pub fn failures(&self) -> usize {
        self.codes.iter().filter(|code| **code != 0).count()
    }
}

/// A task that finished, with its buffered output
#[derive(Debug)]
struct Finished {
    index: usize,
    code: u8,
    lines: Vec<Line>,
}

/// Runs [`Job`]s over a list of [`Task`]s
#[derive(Debug, Clone)]
pub struct Scheduler {
    config: SchedulerConfig,
    console: Console,
}

impl Scheduler {
    /// Scheduler printing to `console`
    pub fn new(config: SchedulerConfig, console: Console) -> Self {
        Self { config, console }
    }

    /// Active configuration
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Run every task and wait for all of them
    ///
    /// A panicking task counts as exit code 1 and never stops its siblings.
    pub async fn run<J: Job>(&self, job: Arc<J>, tasks: Vec<Task<J::Input>>) -> ScheduleReport {
        info!(
            tasks = tasks.len(),
            workers = self.config.workers,
            "starting scheduled run"
        );
        if self.config.is_sequential() {
            self.run_sequential(job, tasks).await
        } else {
            self.run_parallel(job, tasks).await
        }
    }

    async fn run_sequential<J: Job>(&self, job: Arc<J>, tasks: Vec<Task<J::Input>>) -> ScheduleReport {
        let total = tasks.len();
        let mut codes = Vec::with_capacity(total);
        for (index, task) in tasks.into_iter().enumerate() {
            if total > 1 {
                self.console.write_line(&header(index, total, &task.label));
            }
            let console = self.console.clone();
            let job = Arc::clone(&job);
            let handle = tokio::spawn(async move {
                let sink = OutputSink::live(console);
                job.run(task.input, &sink).await
            });
            let code = match handle.await {
                Ok(code) => code,
                Err(e) => {
                    error!(index, error = %e, "task panicked");
                    self.console
                        .write_line(&Line::new(Level::Error, format!("Task aborted: {e}")));
                    1
                }
            };
            codes.push(code);
        }
        ScheduleReport { codes }
    }

    async fn run_parallel<J: Job>(&self, job: Arc<J>, tasks: Vec<Task<J::Input>>) -> ScheduleReport {
        let total = tasks.len();
        let labels: Vec<String> = tasks.iter().map(|t| t.label.clone()).collect();
        let progress = Arc::new(Mutex::new(Progress::new(labels)));
        let semaphore = Arc::new(Semaphore::new(self.config.workers));
        let (tx, mut rx) = mpsc::unbounded_channel::<Finished>();

        let mut set = JoinSet::new();
        let mut index_of = HashMap::with_capacity(total);
        for (index, task) in tasks.into_iter().enumerate() {
            let job = Arc::clone(&job);
            let semaphore = Arc::clone(&semaphore);
            let progress = Arc::clone(&progress);
            let tx = tx.clone();
            let handle = set.spawn(async move {
                // the semaphore is never closed
                let _permit = semaphore.acquire_owned().await.ok();
                progress.lock().set(index, Phase::Running(Instant::now()));
                let sink = OutputSink::buffered();
                let code = job.run(task.input, &sink).await;
                progress.lock().set(index, Phase::Finished);
                let finished = Finished {
                    index,
                    code,
                    lines: sink.take_lines(),
                };
                if tx.send(finished).is_err() {
                    debug!(index, "coordinator gone before task finished");
                }
            });
            index_of.insert(handle.id(), index);
        }
        drop(tx);

        let period = self.config.heartbeat_interval.max(MIN_HEARTBEAT);
        let mut heartbeat = tokio::time::interval_at(Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut codes = vec![0u8; total];
        let mut pending: BTreeMap<usize, Finished> = BTreeMap::new();
        let mut next = 0usize;

        while next < total {
            tokio::select! {
                Some(finished) = rx.recv() => {
                    pending.insert(finished.index, finished);
                }
                Some(joined) = set.join_next_with_id() => {
                    if let Err(e) = joined {
                        let index = index_of.get(&e.id()).copied().unwrap_or(next);
                        error!(index, error = %e, "task panicked");
                        progress.lock().set(index, Phase::Finished);
                        pending.insert(index, Finished {
                            index,
                            code: 1,
                            lines: vec![Line::new(Level::Error, format!("Task aborted: {e}"))],
                        });
                    }
                }
                _ = heartbeat.tick() => {
                    let beat = progress.lock().heartbeat(next, Instant::now());
                    info!(
                        completed = beat.completed,
                        running = beat.running,
                        buffered = beat.buffered,
                        "heartbeat"
                    );
                    self.console.write_line(&Line::new(Level::Info, beat.to_string()));
                }
            }

            while let Some(finished) = pending.remove(&next) {
                if let Some(slot) = codes.get_mut(next) {
                    *slot = finished.code;
                }
                let label = progress.lock().label(next).to_string();
                let mut batch = Vec::with_capacity(finished.lines.len() + 1);
                if total > 1 {
                    batch.push(header(next, total, &label));
                }
                batch.extend(finished.lines);
                self.console.write_lines(&batch);
                next += 1;
            }
        }

        // every task has reported; reap the rest
        while set.join_next().await.is_some() {}
        ScheduleReport { codes }
    }
}

fn header(index: usize, total: usize, label: &str) -> Line {
    Line::new(Level::Plain, format!("[{}/{total}] {label}", index + 1))
}
