use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use otatrack_console::{Console, OutputSink};
use otatrack_scheduler::{Job, Scheduler, SchedulerConfig, Task};

/// Sleeps for the given time, prints two lines and exits with the given code
#[derive(Default)]
struct Sleeper {
    running: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl Job for Sleeper {
    type Input = (u64, u8);

    async fn run(&self, input: Self::Input, sink: &OutputSink) -> u8 {
        let (millis, code) = input;
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        sink.info(format!("start {millis}"));
        tokio::time::sleep(Duration::from_millis(millis)).await;
        sink.success(format!("done {millis}"));
        self.running.fetch_sub(1, Ordering::SeqCst);
        code
    }
}

struct Panicker;

#[async_trait]
impl Job for Panicker {
    type Input = bool;

    #[expect(clippy::panic, reason = "exercises panic isolation")]
    async fn run(&self, explode: bool, sink: &OutputSink) -> u8 {
        tokio::task::yield_now().await;
        if explode {
            panic!("boom");
        }
        sink.info("fine");
        0
    }
}

fn tasks(delays: &[(u64, u8)]) -> Vec<Task<(u64, u8)>> {
    delays
        .iter()
        .enumerate()
        .map(|(i, input)| Task::new(format!("t{i}"), *input))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn output_follows_submission_order() {
    let console = Console::memory();
    let scheduler = Scheduler::new(SchedulerConfig::new(4), console.clone());
    let job = Arc::new(Sleeper::default());

    let report = scheduler
        .run(Arc::clone(&job), tasks(&[(10, 0), (500, 0), (20, 1), (5, 0)]))
        .await;

    assert_eq!(report.codes, vec![0, 0, 1, 0]);
    assert_eq!(report.exit_code(), 1);
    assert_eq!(report.failures(), 1);
    assert_eq!(job.peak.load(Ordering::SeqCst), 4);
    assert_eq!(
        console.captured(),
        vec![
            "[1/4] t0", "=> start 10", "✓ done 10",
            "[2/4] t1", "=> start 500", "✓ done 500",
            "[3/4] t2", "=> start 20", "✓ done 20",
            "[4/4] t3", "=> start 5", "✓ done 5",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn worker_limit_is_respected() {
    let scheduler = Scheduler::new(SchedulerConfig::new(2), Console::memory());
    let job = Arc::new(Sleeper::default());
    let report = scheduler
        .run(Arc::clone(&job), tasks(&[(30, 0); 6]))
        .await;
    assert_eq!(report.exit_code(), 0);
    assert_eq!(job.peak.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn heartbeat_while_waiting() {
    let console = Console::memory();
    let config = SchedulerConfig::new(2).with_heartbeat_interval(Duration::from_secs(30));
    let scheduler = Scheduler::new(config, console.clone());

    scheduler
        .run(Arc::new(Sleeper::default()), tasks(&[(95_000, 0), (1_000, 0)]))
        .await;

    let captured = console.captured();
    let beats: Vec<&String> = captured.iter().filter(|l| l.contains("Still working")).collect();
    assert_eq!(beats.len(), 3);
    assert_eq!(
        beats.first().map(|s| s.as_str()),
        Some("=> Still working: 1/2 completed, 1 running, 1 buffered; waiting on t0 for 30s")
    );
    // heartbeats come before the flushed output
    assert_eq!(captured.get(3).map(String::as_str), Some("[1/2] t0"));
}

#[tokio::test]
async fn sequential_prints_live() {
    let console = Console::memory();
    let scheduler = Scheduler::new(SchedulerConfig::default(), console.clone());
    let report = scheduler
        .run(Arc::new(Sleeper::default()), tasks(&[(1, 0), (1, 0)]))
        .await;
    assert_eq!(report.codes, vec![0, 0]);
    assert_eq!(
        console.captured(),
        vec!["[1/2] t0", "=> start 1", "✓ done 1", "[2/2] t1", "=> start 1", "✓ done 1"]
    );
}

#[tokio::test]
async fn single_task_has_no_header() {
    let console = Console::memory();
    let scheduler = Scheduler::new(SchedulerConfig::default(), console.clone());
    scheduler.run(Arc::new(Sleeper::default()), tasks(&[(1, 0)])).await;
    assert_eq!(console.captured(), vec!["=> start 1", "✓ done 1"]);
}

#[tokio::test]
async fn panics_are_contained() {
    for workers in [1, 3] {
        let console = Console::memory();
        let scheduler = Scheduler::new(SchedulerConfig::new(workers), console.clone());
        let report = scheduler
            .run(
                Arc::new(Panicker),
                vec![Task::new("a", false), Task::new("b", true), Task::new("c", false)],
            )
            .await;
        assert_eq!(report.codes, vec![0, 1, 0]);
        let captured = console.captured();
        assert!(captured.iter().any(|l| l.starts_with("✗ Task aborted")));
        assert_eq!(captured.last().map(String::as_str), Some("=> fine"));
    }
}

#[tokio::test]
async fn empty_run() {
    let scheduler = Scheduler::new(SchedulerConfig::new(4), Console::memory());
    let report = scheduler.run(Arc::new(Panicker), Vec::new()).await;
    assert_eq!(report.exit_code(), 0);
}
