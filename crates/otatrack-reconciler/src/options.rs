//! Run-wide switches for reconciliation

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::Serialize;

/// Identifier recorded in the processed-update state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupKey {
    /// Target build fingerprint
    #[default]
    Fingerprint,
    /// Update title
    Title,
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fingerprint => "fingerprint",
            Self::Title => "title",
        })
    }
}

impl FromStr for DedupKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fingerprint" => Ok(Self::Fingerprint),
            "title" => Ok(Self::Title),
            other => Err(format!("unknown dedup key '{other}', expected fingerprint or title")),
        }
    }
}

/// Switches controlling one reconciliation
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Log intended side effects instead of performing them
    pub dry_run: bool,
    /// Record new updates without notifying
    pub register_only: bool,
    /// Notify even for known updates
    pub force_notify: bool,
    /// Publish a release even for known updates or without a notifier
    pub force_release: bool,
    /// Incremental checked instead of the configured one; disables config rewrites
    pub override_incremental: Option<String>,
    /// Titles matching this pattern never rewrite the config
    pub skip_config_pattern: Option<Regex>,
    /// Identifier recorded in state
    pub dedup_key: DedupKey,
    /// Commit rewritten configs
    pub auto_commit: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            register_only: false,
            force_notify: false,
            force_release: false,
            override_incremental: None,
            skip_config_pattern: None,
            dedup_key: DedupKey::Fingerprint,
            auto_commit: true,
        }
    }
}

impl ReconcileOptions {
    /// Enable or disable dry-run
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Check with `incremental` instead of the configured value
    pub fn with_override_incremental(mut self, incremental: Option<String>) -> Self {
        self.override_incremental = incremental.filter(|v| !v.trim().is_empty());
        self
    }

    /// Skip config rewrites for titles matching `pattern`
    pub fn with_skip_config_pattern(mut self, pattern: Option<Regex>) -> Self {
        self.skip_config_pattern = pattern;
        self
    }

    /// Record `key` in state
    pub fn with_dedup_key(mut self, key: DedupKey) -> Self {
        self.dedup_key = key;
        self
    }

    /// Whether `title` opts out of config rewrites
    pub fn skips_config_for(&self, title: &str) -> bool {
        self.skip_config_pattern
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_key_parses() {
        assert_eq!("Title".parse::<DedupKey>(), Ok(DedupKey::Title));
        assert_eq!(" fingerprint ".parse::<DedupKey>(), Ok(DedupKey::Fingerprint));
        assert!("hash".parse::<DedupKey>().is_err());
        assert_eq!(DedupKey::default().to_string(), "fingerprint");
    }

    #[test]
    fn skip_pattern() -> Result<(), regex::Error> {
        let options = ReconcileOptions::default()
            .with_skip_config_pattern(Some(Regex::new(r"(?i)\bbeta\b")?));
        assert!(options.skips_config_for("KM9 Beta 2"));
        assert!(!options.skips_config_for("KM9-240215V321"));
        assert!(!ReconcileOptions::default().skips_config_for("beta"));
        Ok(())
    }

    #[test]
    fn blank_override_is_ignored() {
        let options = ReconcileOptions::default().with_override_incremental(Some(" ".to_string()));
        assert_eq!(options.override_incremental, None);
    }
}
