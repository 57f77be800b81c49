//! Metadata extraction driver

use std::time::Duration;

use reqwest::Client;
use tracing::{info, warn};

use crate::archive::{METADATA_ENTRY, ZipEntryStage};
use crate::error::ExtractError;
use crate::fetch::{DEFAULT_RATE_LIMIT, Fetch};
use crate::filter::LineFilterStage;
use crate::metadata::OtaMetadata;
use crate::stage::Pipeline;

/// Extraction limits
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Transfer rate in bytes per second; `None` for unpaced
    pub rate_limit: Option<u64>,
    /// Ceiling for the HTTP transfer itself
    pub fetch_timeout: Duration,
    /// Ceiling for the whole pipeline
    pub pipeline_timeout: Duration,
    /// Archive entry to read
    pub entry: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            rate_limit: Some(DEFAULT_RATE_LIMIT),
            fetch_timeout: Duration::from_secs(60),
            pipeline_timeout: Duration::from_secs(90),
            entry: METADATA_ENTRY.to_string(),
        }
    }
}

impl ExtractorConfig {
    /// Override the transfer rate
    pub fn with_rate_limit(mut self, rate_limit: Option<u64>) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Override the transfer ceiling
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Override the pipeline ceiling
    pub fn with_pipeline_timeout(mut self, timeout: Duration) -> Self {
        self.pipeline_timeout = timeout;
        self
    }
}

/// Reads target build metadata out of remote OTA packages
#[derive(Debug, Clone)]
pub struct MetadataExtractor {
    http: Client,
    config: ExtractorConfig,
}

impl MetadataExtractor {
    /// Create an extractor
    pub fn new(config: ExtractorConfig) -> Result<Self, ExtractError> {
        let http = Client::builder().timeout(config.fetch_timeout).build()?;
        Ok(Self { http, config })
    }

    /// Active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Metadata of the package at `url`
    ///
    /// `Ok(None)` when the package holds no usable metadata.
    pub async fn extract(&self, url: &str) -> Result<Option<OtaMetadata>, ExtractError> {
        let deadline = self.config.pipeline_timeout;
        let lines = match tokio::time::timeout(deadline, self.run(url)).await {
            Ok(lines) => lines?,
            Err(_) => {
                warn!(%url, ?deadline, "metadata extraction timed out");
                return Err(ExtractError::Timeout(deadline));
            }
        };

        let text = String::from_utf8_lossy(&lines);
        if text.trim().is_empty() {
            warn!(%url, "no metadata lines extracted");
            return Ok(None);
        }
        let meta = OtaMetadata::from_lines(&text);
        if !meta.has_fingerprint() {
            warn!(%url, "post-build not found in metadata");
            return Ok(None);
        }
        info!(fingerprint = %meta.fingerprint, "extracted target fingerprint");
        Ok(Some(meta))
    }

    async fn run(&self, url: &str) -> Result<Vec<u8>, ExtractError> {
        let fetch = Fetch::open(&self.http, url, self.config.rate_limit).await?;
        let mut pipeline = Pipeline::new(vec![
            Box::new(ZipEntryStage::new(self.config.entry.clone())),
            Box::new(LineFilterStage::metadata_keys()),
        ]);
        fetch.drive(&mut pipeline).await?;
        Ok(pipeline.into_output())
    }
}
