//! The per-target state machine
//!
//! Check, read the package metadata, decide novelty, then dispatch. State, config,
//! release and commit effects run only after the notification is confirmed, in that
//! order. Dry-run prints the intended effects instead of running them.

use std::sync::Arc;

use otatrack_checkin::CheckinResult;
use otatrack_config_writer::ConfigWriter;
use otatrack_console::OutputSink;
use otatrack_device::DeviceIdentity;
use otatrack_metadata::OtaMetadata;
use otatrack_notify::Notification;
use otatrack_release::{CommitOutcome, CommitRequest, PublishOutcome, ReleaseError, ReleaseRequest};
use otatrack_state::StateStore;
use tracing::{debug, info, warn};

use crate::options::{DedupKey, ReconcileOptions};
use crate::outcome::{FailureReason, ReconcileOutcome, ReconcileStatus};
use crate::ports::{CommitRecorder, MetadataSource, Notifier, ReleasePublisher, UpdateSource};
use crate::target::Target;

/// An update that passed the checks and is about to be acted on
struct Detected<'a> {
    target: &'a Target,
    identity: DeviceIdentity,
    title: String,
    size: String,
    url: String,
    description: Option<String>,
    metadata: OtaMetadata,
    update_id: String,
    is_new: bool,
}

impl Detected<'_> {
    fn notification(&self) -> Notification {
        Notification::new(
            self.identity.model.clone(),
            self.title.clone(),
            self.description.clone().unwrap_or_default(),
            self.size.clone(),
            self.metadata.fingerprint.clone(),
            self.url.clone(),
        )
        .with_metadata(&self.metadata)
    }

    fn release(&self) -> ReleaseRequest {
        ReleaseRequest {
            config_name: self.target.config_name(),
            title: self.title.clone(),
            device: self.identity.model.clone(),
            description: self.description.clone(),
            size: Some(self.size.clone()),
            url: self.url.clone(),
            fingerprint: self.metadata.fingerprint.clone(),
            metadata: Some(self.metadata.clone()),
        }
    }

    fn outcome(&self, status: ReconcileStatus) -> ReconcileOutcome {
        ReconcileOutcome {
            status,
            target_fingerprint: Some(self.metadata.fingerprint.clone()),
            is_new: self.is_new,
        }
    }
}

/// Runs the check, decide, act sequence for one target at a time
///
/// Shared across concurrent targets; all mutable state lives behind the
/// [`StateStore`] and [`ConfigWriter`] write lock.
pub struct Reconciler {
    source: Arc<dyn UpdateSource>,
    metadata: Arc<dyn MetadataSource>,
    notifier: Option<Arc<dyn Notifier>>,
    publisher: Option<Arc<dyn ReleasePublisher>>,
    committer: Option<Arc<dyn CommitRecorder>>,
    state: StateStore,
    config_writer: ConfigWriter,
    options: ReconcileOptions,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("notifier", &self.notifier.is_some())
            .field("publisher", &self.publisher.is_some())
            .field("committer", &self.committer.is_some())
            .field("state", &self.state)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Reconciler without notifier, publisher or committer
    pub fn new(
        source: Arc<dyn UpdateSource>,
        metadata: Arc<dyn MetadataSource>,
        state: StateStore,
        config_writer: ConfigWriter,
        options: ReconcileOptions,
    ) -> Self {
        Self {
            source,
            metadata,
            notifier: None,
            publisher: None,
            committer: None,
            state,
            config_writer,
            options,
        }
    }

    /// Announce updates through `notifier`
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Publish releases through `publisher`
    pub fn with_publisher(mut self, publisher: Arc<dyn ReleasePublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Commit config rewrites through `committer`
    pub fn with_committer(mut self, committer: Arc<dyn CommitRecorder>) -> Self {
        self.committer = Some(committer);
        self
    }

    /// Active options
    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    /// Reconcile `target`, reporting progress to `sink`
    pub async fn reconcile(&self, target: &Target, sink: &OutputSink) -> ReconcileOutcome {
        let identity = match &self.options.override_incremental {
            Some(incremental) => {
                sink.info(format!("Override incremental: {incremental}"));
                target.identity.with_incremental(incremental.clone())
            }
            None => target.identity.clone(),
        };

        sink.info(format!("Device: {} ({})", identity.label(), identity.device));
        sink.info(format!("Build: {}", identity.fingerprint()));

        let Some(offer) = self.check(&identity, sink).await else {
            sink.info("No updates found");
            return ReconcileOutcome::new(ReconcileStatus::NoUpdate);
        };

        let (Some(title), Some(size), Some(url)) = (
            non_empty(offer.title.as_deref()),
            non_empty(offer.size.as_deref()),
            non_empty(offer.url.as_deref()),
        ) else {
            sink.error("Missing essential update info (title, url, or size)");
            return ReconcileOutcome::failed(FailureReason::MissingUpdateInfo);
        };

        sink.success(format!("New OTA update found: {title}"));
        sink.info(format!("Size: {size}"));
        sink.info(format!("URL: {url}"));

        let Some(metadata) = self.fetch_metadata(&url, sink).await else {
            sink.error("Could not determine target fingerprint. Cannot verify if update is new.");
            return ReconcileOutcome::failed(FailureReason::NoTargetFingerprint);
        };
        report_metadata(&metadata, sink);

        let update_id = match self.options.dedup_key {
            DedupKey::Fingerprint => metadata.fingerprint.clone(),
            DedupKey::Title => title.clone(),
        };
        let processed = self.state.load().await;
        let is_new = !processed.contains(&update_id);
        debug!(id = %update_id, is_new, known = processed.len(), "novelty decided");

        let detected = Detected {
            target,
            identity,
            title,
            size,
            url,
            description: offer.description.clone(),
            metadata,
            update_id,
            is_new,
        };
        self.act(&detected, sink).await
    }

    async fn check(&self, identity: &DeviceIdentity, sink: &OutputSink) -> Option<CheckinResult> {
        sink.info("Checking for updates...");
        match self.source.check(identity).await {
            Ok(result) if result.has_update() => Some(result),
            Ok(_) => None,
            Err(e) => {
                warn!(product = %identity.product, error = %e, "check-in failed");
                sink.error(format!("Update check failed: {e}"));
                None
            }
        }
    }

    async fn fetch_metadata(&self, url: &str, sink: &OutputSink) -> Option<OtaMetadata> {
        sink.info("Fetching OTA metadata (fingerprint, patch level, sdk)...");
        match self.metadata.extract(url).await {
            Ok(Some(metadata)) if metadata.has_fingerprint() => Some(metadata),
            Ok(_) => {
                sink.warn("Could not extract OTA metadata");
                None
            }
            Err(e) => {
                sink.warn(format!("Metadata extraction failed: {e}"));
                None
            }
        }
    }

    async fn act(&self, update: &Detected<'_>, sink: &OutputSink) -> ReconcileOutcome {
        let options = &self.options;
        let fingerprint = &update.metadata.fingerprint;

        if !update.is_new && !options.force_notify && !options.force_release {
            sink.info("This update has already been processed. Skipping.");
            return update.outcome(ReconcileStatus::AlreadyProcessed);
        }

        if options.register_only {
            return self.register_only(update, sink).await;
        }

        if !update.is_new && options.force_notify {
            sink.warn(format!(
                "Forcing notification for an already processed update: {fingerprint}"
            ));
        }
        if !update.is_new && options.force_release {
            sink.warn(format!(
                "Forcing GitHub release for an already processed update: {fingerprint}"
            ));
        }

        let mut status = ReconcileStatus::Undispatched;
        let mut released = false;

        let notifier = self
            .notifier
            .as_ref()
            .filter(|_| update.is_new || options.force_notify);
        match notifier {
            Some(_) if options.dry_run => {
                sink.info("Dry-run: would send Telegram notification with OTA details.");
                if update.is_new {
                    sink.info("Dry-run: would save new fingerprint after successful notification.");
                    if let Some(value) = self.config_value(update) {
                        sink.info(format!(
                            "Dry-run: would update {} incremental to {value}.",
                            update.target.path().display()
                        ));
                    }
                    sink.info("Dry-run: would create GitHub release for new update.");
                    if options.auto_commit && self.config_value(update).is_some() {
                        sink.info("Dry-run: would commit the updated config.");
                    }
                }
                status = ReconcileStatus::DryRun;
            }
            Some(notifier) => {
                sink.info("Sending Telegram notification...");
                match notifier.send(&update.notification()).await {
                    Ok(report) => {
                        if let Some(page) = &report.page_url {
                            sink.success(format!("Created Telegraph page: {page}"));
                        }
                        sink.success("Notification sent successfully");
                    }
                    Err(e) => {
                        sink.error(format!("Failed to send notification: {e}"));
                        sink.error("Failed to send notification. Fingerprint will not be saved.");
                        return update.outcome(ReconcileStatus::Failed(FailureReason::DispatchFailed));
                    }
                }
                if update.is_new {
                    released = self.register_dispatched(update, sink).await;
                }
                status = ReconcileStatus::Notified;
            }
            None if update.is_new => {
                sink.warn("Notifications disabled; update not registered");
            }
            None => {}
        }

        if options.force_release && !released {
            if options.dry_run {
                sink.info("Dry-run: would create GitHub release due to --force-release.");
                status = ReconcileStatus::DryRun;
            } else {
                sink.info("Force release flag detected. Creating GitHub release...");
                self.publish(update, sink).await;
                if update.is_new && self.notifier.is_none() {
                    sink.info("Skipping fingerprint save due to force release");
                }
            }
        }

        sink.success("Update check completed successfully");
        update.outcome(status)
    }

    async fn register_only(&self, update: &Detected<'_>, sink: &OutputSink) -> ReconcileOutcome {
        if !update.is_new {
            sink.info("--register-fingerprint flag is set, but fingerprint is already known. No action taken.");
            return update.outcome(ReconcileStatus::AlreadyProcessed);
        }
        if self.options.dry_run {
            sink.info("--register-fingerprint set. Dry-run: would save new fingerprint without notification.");
            return update.outcome(ReconcileStatus::DryRun);
        }
        sink.info("--register-fingerprint flag is set. Saving new fingerprint without notification.");
        self.save_state(update, sink).await;
        sink.success("Update check completed successfully (fingerprint registered).");
        update.outcome(ReconcileStatus::Registered)
    }

    /// Follow-up work once delivery of a new update is confirmed; returns whether a
    /// release was attempted
    async fn register_dispatched(&self, update: &Detected<'_>, sink: &OutputSink) -> bool {
        self.save_state(update, sink).await;
        let rewritten = self.rewrite_config(update, sink).await;

        sink.info("Creating GitHub release for new update...");
        let released = self.publish(update, sink).await;

        if let Some(value) = rewritten {
            self.commit(update, &value, sink).await;
        }
        released
    }

    async fn save_state(&self, update: &Detected<'_>, sink: &OutputSink) {
        match self.state.save(&update.update_id).await {
            Ok(()) => sink.success(format!(
                "Saved new fingerprint to {}",
                self.state.path().display()
            )),
            Err(e) => sink.error(format!("Failed to save fingerprint: {e}")),
        }
    }

    /// New incremental for the config, when this update may rewrite it
    fn config_value(&self, update: &Detected<'_>) -> Option<String> {
        if self.options.override_incremental.is_some() || self.options.skips_config_for(&update.title) {
            return None;
        }
        update.metadata.target_incremental()
    }

    /// Rewrite the config; returns the value when the file changed
    async fn rewrite_config(&self, update: &Detected<'_>, sink: &OutputSink) -> Option<String> {
        if self.options.override_incremental.is_some() {
            sink.info("Skipping config update: incremental was overridden");
            return None;
        }
        if self.options.skips_config_for(&update.title) {
            sink.info(format!("Skipping config update: title '{}' matches skip pattern", update.title));
            return None;
        }
        let Some(value) = update.metadata.target_incremental() else {
            sink.warn("No incremental value available to update configuration.");
            return None;
        };

        let path = update.target.path();
        match self
            .config_writer
            .update_incremental(path, &update.target.identity, &value)
            .await
        {
            Ok(edit) if edit.changed() => {
                sink.success(format!("Updated {} incremental -> {value}", path.display()));
                Some(value)
            }
            Ok(_) => {
                sink.info(format!("{} already uses incremental {value}.", path.display()));
                None
            }
            Err(e) => {
                sink.warn(format!("Failed to update {}: {e}", path.display()));
                None
            }
        }
    }

    /// Returns whether a publisher was asked
    async fn publish(&self, update: &Detected<'_>, sink: &OutputSink) -> bool {
        let Some(publisher) = &self.publisher else {
            sink.warn("GitHub CLI (gh) not available. Cannot create release.");
            return false;
        };
        let name = update.target.config_name();
        match publisher.publish(&update.release()).await {
            Ok(PublishOutcome::Created) => {
                sink.success(format!("Created new release: {} for config {name}", update.title));
            }
            Ok(PublishOutcome::AlreadyExists) => {
                sink.info(format!(
                    "Release '{}' for config {name} already exists. Skipping.",
                    update.title
                ));
            }
            Err(ReleaseError::MissingField(field)) => {
                sink.warn(format!(
                    "Skipping GitHub release for {name}: {field} is missing or unknown"
                ));
            }
            Err(e) => sink.error(format!("Failed to create release: {e}")),
        }
        true
    }

    async fn commit(&self, update: &Detected<'_>, value: &str, sink: &OutputSink) {
        if !self.options.auto_commit {
            return;
        }
        let Some(committer) = &self.committer else {
            sink.warn("Git executable not found; skipping auto-commit.");
            return;
        };
        let request = CommitRequest::new(update.target.path(), value)
            .with_variant(update.target.identity.variant.clone())
            .with_extra_path(self.state.path());
        match committer.commit(&request).await {
            Ok(CommitOutcome::Committed(message)) => {
                info!(config = %update.target.path().display(), value, "config change committed");
                sink.success(format!("Committed incremental update: {message}"));
            }
            Ok(CommitOutcome::NothingToCommit) => {
                sink.info("No staged changes detected; skipping incremental update commit.");
            }
            Err(e) => sink.warn(format!("Auto-commit skipped: {e}")),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn report_metadata(metadata: &OtaMetadata, sink: &OutputSink) {
    sink.info(format!("Target build: {}", metadata.fingerprint));
    if let Some(patch) = &metadata.security_patch_level {
        sink.info(format!("Security patch: {patch}"));
    }
    if let Some(date) = &metadata.build_date {
        sink.info(format!("Build date: {date} (CST)"));
    }
    if let Some(summary) = metadata.sdk_summary() {
        sink.info(summary.log_line);
    }
}
