//! Wiring from command-line options to a scheduled reconciliation run

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use otatrack_checkin::{CheckinClient, CheckinConfig};
use otatrack_config_writer::ConfigWriter;
use otatrack_console::{Console, OutputSink};
use otatrack_device::{load_identities, select_region};
use otatrack_metadata::{ExtractorConfig, MetadataExtractor};
use otatrack_notify::{TelegramConfig, TelegramNotifier, TelegraphClient};
use otatrack_reconciler::{ReconcileOptions, Reconciler, Target};
use otatrack_release::{GhCli, GitCommitter};
use otatrack_scheduler::{Job, Scheduler, SchedulerConfig, Task};
use otatrack_state::{StateStore, WriteLock};
use tracing::{info, warn};

use crate::Cli;
use crate::error::CliError;

/// Reconciles one target per task
struct ReconcileJob {
    reconciler: Reconciler,
}

#[async_trait]
impl Job for ReconcileJob {
    type Input = Target;

    async fn run(&self, target: Target, sink: &OutputSink) -> u8 {
        self.reconciler.reconcile(&target, sink).await.exit_code()
    }
}

/// Run every configured target; returns the process exit code
pub async fn run(cli: &Cli) -> Result<u8> {
    let console = Console::stdout();
    let setup = OutputSink::live(console.clone());

    let targets = load_targets(cli)?;
    if cli.dry_run {
        setup.info("Dry-run mode enabled: no external side effects will occur.");
    }

    let reconciler = build_reconciler(cli, &setup)?;
    let tasks: Vec<Task<Target>> = targets
        .into_iter()
        .map(|target| Task::new(target.label(), target))
        .collect();
    let total = tasks.len();

    let config = SchedulerConfig::new(cli.workers)
        .with_heartbeat_interval(Duration::from_secs(cli.heartbeat_secs));
    let scheduler = Scheduler::new(config, console);
    let report = scheduler
        .run(Arc::new(ReconcileJob { reconciler }), tasks)
        .await;

    let failures = report.failures();
    info!(targets = total, failures, "run finished");
    if total > 1 && failures > 0 {
        setup.warn(format!("{failures} of {total} targets failed"));
    }
    Ok(report.exit_code())
}

/// Expand every config into one target per (region-filtered) variant
fn load_targets(cli: &Cli) -> Result<Vec<Target>, CliError> {
    let mut targets = Vec::new();
    for path in &cli.config {
        let identities = load_identities(path).map_err(|source| CliError::Config {
            path: path.clone(),
            source,
        })?;
        let identities = match cli.region.as_deref() {
            Some(region) => {
                let selected = select_region(identities, region);
                if selected.is_empty() {
                    return Err(CliError::RegionNotFound {
                        path: path.clone(),
                        region: region.to_string(),
                    });
                }
                selected
            }
            None => identities,
        };
        info!(config = %path.display(), variants = identities.len(), "loaded config");
        targets.extend(
            identities
                .into_iter()
                .map(|identity| Target::new(path.clone(), identity)),
        );
    }
    Ok(targets)
}

fn build_reconciler(cli: &Cli, setup: &OutputSink) -> Result<Reconciler> {
    let mut checkin = CheckinConfig::new(cli.checkin_url.clone());
    if cli.debug {
        checkin = checkin.with_debug_dir(".");
    }
    let source = CheckinClient::new(checkin).context("failed to create check-in client")?;
    let extractor = MetadataExtractor::new(ExtractorConfig::default())
        .context("failed to create metadata extractor")?;

    let lock = WriteLock::new();
    let state = StateStore::new(cli.state_file.clone(), lock.clone());
    let config_writer = ConfigWriter::new(lock);

    let mut options = ReconcileOptions::default()
        .with_dry_run(cli.dry_run)
        .with_override_incremental(cli.incremental.clone())
        .with_skip_config_pattern(cli.skip_config_pattern.clone())
        .with_dedup_key(cli.dedup_key);
    options.register_only = cli.register_fingerprint;
    options.force_notify = cli.force_notify;
    options.force_release = cli.force_release;
    options.auto_commit = !cli.no_commit;

    let mut reconciler = Reconciler::new(
        Arc::new(source),
        Arc::new(extractor),
        state,
        config_writer,
        options,
    );

    if !cli.skip_telegram
        && !cli.register_fingerprint
        && let Some(notifier) = build_notifier(cli, setup)
    {
        reconciler = reconciler.with_notifier(Arc::new(notifier));
    }

    match GhCli::locate() {
        Ok(gh) => reconciler = reconciler.with_publisher(Arc::new(gh)),
        Err(e) => {
            warn!(error = %e, "release publishing disabled");
            setup.warn(format!("{e}; GitHub releases will not be created"));
        }
    }

    if !cli.no_commit {
        match GitCommitter::locate() {
            Ok(git) => reconciler = reconciler.with_committer(Arc::new(git)),
            Err(e) => {
                warn!(error = %e, "auto-commit disabled");
                setup.warn(format!("{e}; config updates will not be committed"));
            }
        }
    }

    Ok(reconciler)
}

fn build_notifier(cli: &Cli, setup: &OutputSink) -> Option<TelegramNotifier> {
    let (Some(token), Some(chat), Some(telegraph_token)) = (
        non_blank(cli.bot_token.as_deref()),
        non_blank(cli.chat_id.as_deref()),
        non_blank(cli.telegraph_token.as_deref()),
    ) else {
        setup.warn("Telegram env vars not set, skipping notifications");
        return None;
    };

    let config = TelegramConfig::new(token, chat).with_api_base(cli.telegram_api.clone());
    let built = TelegraphClient::new(telegraph_token).and_then(|telegraph| {
        Ok(TelegramNotifier::new(config)?.with_paste_service(Arc::new(telegraph)))
    });
    match built {
        Ok(notifier) => Some(notifier),
        Err(e) => {
            setup.error(format!("Telegram setup failed: {e}"));
            None
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
