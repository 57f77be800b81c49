//! What a reconciliation ended with, and its exit code

use serde::Serialize;

/// Why a reconciliation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureReason {
    /// The offer lacked a title or size
    MissingUpdateInfo,
    /// The package's target fingerprint could not be read
    NoTargetFingerprint,
    /// The notifier did not confirm delivery
    DispatchFailed,
}

/// Where a reconciliation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReconcileStatus {
    /// No update offered, or the check itself failed
    NoUpdate,
    /// The update was seen before
    AlreadyProcessed,
    /// Recorded without notification
    Registered,
    /// Notification delivered
    Notified,
    /// Update found but nothing was dispatched
    Undispatched,
    /// Side effects were only described
    DryRun,
    /// The target failed
    Failed(FailureReason),
}

/// Result of reconciling one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    /// Final status
    pub status: ReconcileStatus,
    /// Target build fingerprint, once known
    pub target_fingerprint: Option<String>,
    /// Whether the update was new
    pub is_new: bool,
}

impl ReconcileOutcome {
    pub(crate) fn new(status: ReconcileStatus) -> Self {
        Self {
            status,
            target_fingerprint: None,
            is_new: false,
        }
    }

    pub(crate) fn failed(reason: FailureReason) -> Self {
        Self::new(ReconcileStatus::Failed(reason))
    }

    /// Process exit code contributed by this target
    pub fn exit_code(&self) -> u8 {
        match self.status {
            ReconcileStatus::Failed(_) => 1,
            _ => 0,
        }
    }
}
