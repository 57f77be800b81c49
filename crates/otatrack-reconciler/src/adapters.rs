//! Port implementations for the concrete clients

use async_trait::async_trait;
use otatrack_checkin::{CheckinClient, CheckinError, CheckinResult};
use otatrack_device::DeviceIdentity;
use otatrack_metadata::{ExtractError, MetadataExtractor, OtaMetadata};
use otatrack_notify::{DeliveryReport, Notification, NotifyError, TelegramNotifier};
use otatrack_release::{
    CommitOutcome, CommitRequest, GhCli, GitCommitter, PublishOutcome, ReleaseError,
    ReleaseRequest,
};

use crate::ports::{CommitRecorder, MetadataSource, Notifier, ReleasePublisher, UpdateSource};

#[async_trait]
impl UpdateSource for CheckinClient {
    async fn check(&self, identity: &DeviceIdentity) -> Result<CheckinResult, CheckinError> {
        CheckinClient::check(self, identity).await
    }
}

#[async_trait]
impl MetadataSource for MetadataExtractor {
    async fn extract(&self, url: &str) -> Result<Option<OtaMetadata>, ExtractError> {
        MetadataExtractor::extract(self, url).await
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, notification: &Notification) -> Result<DeliveryReport, NotifyError> {
        TelegramNotifier::send(self, notification).await
    }
}

#[async_trait]
impl ReleasePublisher for GhCli {
    async fn publish(&self, request: &ReleaseRequest) -> Result<PublishOutcome, ReleaseError> {
        GhCli::publish(self, request).await
    }
}

#[async_trait]
impl CommitRecorder for GitCommitter {
    async fn commit(&self, request: &CommitRequest) -> Result<CommitOutcome, ReleaseError> {
        GitCommitter::commit(self, request).await
    }
}
