//! Collaborator ports
//!
//! Each trait is the narrow slice of an external system the reconciler needs. They
//! report through `Result`; the reconciler decides what the user sees.

use async_trait::async_trait;
use otatrack_checkin::{CheckinError, CheckinResult};
use otatrack_device::DeviceIdentity;
use otatrack_metadata::{ExtractError, OtaMetadata};
use otatrack_notify::{DeliveryReport, Notification, NotifyError};
use otatrack_release::{CommitOutcome, CommitRequest, PublishOutcome, ReleaseError, ReleaseRequest};

/// Asks the vendor whether an update is offered
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Check `identity` for an update
    async fn check(&self, identity: &DeviceIdentity) -> Result<CheckinResult, CheckinError>;
}

/// Reads build metadata out of an update package
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Metadata of the package at `url`, `None` when unavailable
    async fn extract(&self, url: &str) -> Result<Option<OtaMetadata>, ExtractError>;
}

/// Announces updates
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `notification`; `Ok` means the channel accepted it
    async fn send(&self, notification: &Notification) -> Result<DeliveryReport, NotifyError>;
}

/// Publishes releases
#[async_trait]
pub trait ReleasePublisher: Send + Sync {
    /// Publish `request` unless it already exists
    async fn publish(&self, request: &ReleaseRequest) -> Result<PublishOutcome, ReleaseError>;
}

/// Records config changes in version control
#[async_trait]
pub trait CommitRecorder: Send + Sync {
    /// Commit the files named by `request`
    async fn commit(&self, request: &CommitRequest) -> Result<CommitOutcome, ReleaseError>;
}
