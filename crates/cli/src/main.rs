//! otatrack - Android OTA update tracker
//!
//! Polls the check-in endpoint for every configured device variant, reads the
//! target build out of newly offered packages and announces genuinely new
//! releases exactly once.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod app;
mod error;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use otatrack_checkin::CHECKIN_URL;
use otatrack_notify::TELEGRAM_API_BASE;
use otatrack_reconciler::DedupKey;
use otatrack_state::DEFAULT_STATE_FILE;
use regex::Regex;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "otatrack")]
#[command(about = "Android OTA update checker")]
#[command(version)]
#[command(long_about = "
otatrack asks the Android check-in service whether an update is offered for each
configured device, extracts the target build fingerprint from the OTA package and,
for updates not seen before, sends a Telegram notification, records the update,
bumps the config's incremental and publishes a GitHub release.

Telegram credentials are read from the bot_token, chat_id and telegraph_token
environment variables.
")]
pub(crate) struct Cli {
    /// Config file path; repeat to check several device families
    #[arg(short, long = "config", required = true, num_args = 1..)]
    pub config: Vec<PathBuf>,

    /// Enable debugging and write check-in response dumps
    #[arg(long)]
    pub debug: bool,

    /// Simulate actions without making changes or sending notifications
    #[arg(long)]
    pub dry_run: bool,

    /// Skip Telegram notifications
    #[arg(long)]
    pub skip_telegram: bool,

    /// Save the update fingerprint without sending a notification
    #[arg(long)]
    pub register_fingerprint: bool,

    /// Send notification even if the update has been seen before
    #[arg(long)]
    pub force_notify: bool,

    /// Create GitHub release even without Telegram token or if fingerprint already exists
    #[arg(long)]
    pub force_release: bool,

    /// Override incremental version
    #[arg(short, long)]
    pub incremental: Option<String>,

    /// Only check variants whose product ends with this region code (e.g. OP, EU)
    #[arg(long, value_name = "CODE")]
    pub region: Option<String>,

    /// Targets checked concurrently; 1 prints output live
    #[arg(long, default_value_t = 1, value_parser = parse_workers)]
    pub workers: usize,

    /// Seconds between progress heartbeats while waiting on a slow target
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    pub heartbeat_secs: u64,

    /// File holding processed update identifiers
    #[arg(long, default_value = DEFAULT_STATE_FILE)]
    pub state_file: PathBuf,

    /// Identifier used to recognise known updates
    #[arg(long, default_value_t = DedupKey::Fingerprint)]
    pub dedup_key: DedupKey,

    /// Never rewrite the config for updates whose title matches this regex
    #[arg(long, value_name = "REGEX")]
    pub skip_config_pattern: Option<Regex>,

    /// Do not commit rewritten configs
    #[arg(long)]
    pub no_commit: bool,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Telegram bot token
    #[arg(long, env = "bot_token", hide_env_values = true)]
    pub bot_token: Option<String>,

    /// Telegram chat receiving notifications
    #[arg(long, env = "chat_id", hide_env_values = true)]
    pub chat_id: Option<String>,

    /// Telegraph access token for oversized changelogs
    #[arg(long, env = "telegraph_token", hide_env_values = true)]
    pub telegraph_token: Option<String>,

    /// Check-in endpoint (for testing)
    #[arg(long, env = "OTATRACK_CHECKIN_URL", default_value = CHECKIN_URL, hide = true)]
    pub checkin_url: String,

    /// Telegram Bot API base (for testing)
    #[arg(long, env = "OTATRACK_TELEGRAM_API", default_value = TELEGRAM_API_BASE, hide = true)]
    pub telegram_api: String,
}

fn parse_workers(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("at least one worker is required".to_string()),
        Ok(workers) => Ok(workers),
        Err(e) => Err(e.to_string()),
    }
}

fn init_tracing(verbose: u8, debug: bool) {
    let log_level = match (verbose, debug) {
        (0, false) => "warn",
        (0, true) | (1, _) => "info",
        (2, _) => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("otatrack={log_level}")));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.debug);

    match app::run(&cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            output::print_error_human(&e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn defaults() -> TestResult {
        let cli = Cli::try_parse_from(["otatrack", "-c", "km9.yml"])?;
        assert_eq!(cli.config, vec![PathBuf::from("km9.yml")]);
        assert_eq!(cli.workers, 1);
        assert_eq!(cli.heartbeat_secs, 30);
        assert_eq!(cli.state_file, PathBuf::from(DEFAULT_STATE_FILE));
        assert_eq!(cli.dedup_key, DedupKey::Fingerprint);
        assert_eq!(cli.checkin_url, CHECKIN_URL);
        assert!(!cli.dry_run && !cli.no_commit);
        assert!(cli.incremental.is_none() && cli.region.is_none());
        Ok(())
    }

    #[test]
    fn several_configs_and_flags() -> TestResult {
        let cli = Cli::try_parse_from([
            "otatrack",
            "-c",
            "a.yml",
            "b.yml",
            "--workers",
            "4",
            "--dry-run",
            "--force-release",
            "-i",
            "V15.0.3",
            "--dedup-key",
            "title",
            "--skip-config-pattern",
            "(?i)beta",
            "-vv",
        ])?;
        assert_eq!(cli.config.len(), 2);
        assert_eq!(cli.workers, 4);
        assert!(cli.dry_run && cli.force_release);
        assert_eq!(cli.incremental.as_deref(), Some("V15.0.3"));
        assert_eq!(cli.dedup_key, DedupKey::Title);
        assert!(
            cli.skip_config_pattern
                .as_ref()
                .is_some_and(|re| re.is_match("Public BETA"))
        );
        assert_eq!(cli.verbose, 2);
        Ok(())
    }

    #[test]
    fn config_is_required() {
        assert!(Cli::try_parse_from(["otatrack"]).is_err());
    }

    #[test]
    fn rejects_zero_workers_and_bad_values() {
        assert!(Cli::try_parse_from(["otatrack", "-c", "a.yml", "--workers", "0"]).is_err());
        assert!(Cli::try_parse_from(["otatrack", "-c", "a.yml", "--heartbeat-secs", "0"]).is_err());
        assert!(Cli::try_parse_from(["otatrack", "-c", "a.yml", "--dedup-key", "md5"]).is_err());
        assert!(
            Cli::try_parse_from(["otatrack", "-c", "a.yml", "--skip-config-pattern", "("]).is_err()
        );
    }
}
