//! HTTP transport for check-in requests

use std::path::PathBuf;
use std::time::Duration;

use otatrack_device::DeviceIdentity;
use prost::Message;
use reqwest::Client;
use reqwest::header::{ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_TYPE, USER_AGENT};
use tracing::{debug, info, warn};

use crate::codec::{self, CheckinResult};
use crate::error::CheckinError;
use crate::proto::AndroidCheckinResponse;

/// Production check-in endpoint
pub const CHECKIN_URL: &str = "https://android.googleapis.com/checkin";
/// Readable dump of the last decoded response
pub const DEBUG_RESPONSE_FILE: &str = "debug_checkin_response.txt";
/// Raw body of the last response that failed to decode
pub const DEBUG_ERROR_FILE: &str = "debug_checkin_response_error.bin";

/// Check-in client configuration
#[derive(Debug, Clone)]
pub struct CheckinConfig {
    /// Endpoint URL
    pub endpoint: String,
    /// Whole-request timeout
    pub timeout: Duration,
    /// Write debug artifacts
    pub debug: bool,
    /// Directory for debug artifacts
    pub debug_dir: PathBuf,
}

impl Default for CheckinConfig {
    fn default() -> Self {
        Self {
            endpoint: CHECKIN_URL.to_string(),
            timeout: Duration::from_secs(10),
            debug: false,
            debug_dir: PathBuf::from("."),
        }
    }
}

impl CheckinConfig {
    /// Configuration targeting `endpoint`
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Override the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Write debug artifacts into `dir`
    pub fn with_debug_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.debug = true;
        self.debug_dir = dir.into();
        self
    }
}

/// `user-agent` presented for an identity
pub fn user_agent(identity: &DeviceIdentity) -> String {
    format!(
        "Dalvik/2.1.0 (Linux; U; Android {}; {} Build/{})",
        identity.android_version, identity.model, identity.build_tag
    )
}

/// Client for the check-in endpoint
#[derive(Debug, Clone)]
pub struct CheckinClient {
    http: Client,
    config: CheckinConfig,
}

impl CheckinClient {
    /// Create a client
    pub fn new(config: CheckinConfig) -> Result<Self, CheckinError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    /// Active configuration
    pub fn config(&self) -> &CheckinConfig {
        &self.config
    }

    /// Check whether an update is offered for `identity`
    pub async fn check(&self, identity: &DeviceIdentity) -> Result<CheckinResult, CheckinError> {
        let body = codec::encode_request(identity)?;
        debug!(
            endpoint = %self.config.endpoint,
            fingerprint = %identity.fingerprint(),
            bytes = body.len(),
            "sending check-in"
        );

        let response = self
            .http
            .post(&self.config.endpoint)
            .header(CONTENT_TYPE, "application/x-protobuffer")
            .header(CONTENT_ENCODING, "gzip")
            .header(ACCEPT_ENCODING, "gzip, deflate")
            .header(USER_AGENT, user_agent(identity))
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CheckinError::Status {
                status: status.as_u16(),
            });
        }

        let encoding = response
            .headers()
            .get(CONTENT_ENCODING)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let raw = response.bytes().await?.to_vec();
        let payload = codec::decode_body(raw, encoding.as_deref())?;

        let decoded = match AndroidCheckinResponse::decode(payload.as_slice()) {
            Ok(decoded) => decoded,
            Err(e) => {
                if self.config.debug {
                    self.write_artifact(DEBUG_ERROR_FILE, &payload).await;
                }
                return Err(e.into());
            }
        };

        if self.config.debug {
            let dump = codec::render_response(&decoded);
            self.write_artifact(DEBUG_RESPONSE_FILE, dump.as_bytes())
                .await;
        }

        let result = codec::classify(&decoded, &identity.model);
        info!(
            device = %identity.model,
            found = result.found,
            settings = decoded.setting.len(),
            "check-in complete"
        );
        Ok(result)
    }

    async fn write_artifact(&self, name: &str, contents: &[u8]) {
        let path = self.config.debug_dir.join(name);
        match tokio::fs::write(&path, contents).await {
            Ok(()) => debug!(path = %path.display(), "wrote debug artifact"),
            Err(e) => warn!(path = %path.display(), error = %e, "failed to write debug artifact"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_template() {
        let identity = DeviceIdentity {
            build_tag: "UP1A.231005.007".to_string(),
            incremental: "1".to_string(),
            android_version: "14".to_string(),
            model: "TECNO KM9".to_string(),
            device: "TECNO-KM9".to_string(),
            oem: "TECNO".to_string(),
            product: "KM9-OP".to_string(),
            variant: None,
            variant_index: None,
        };
        assert_eq!(
            user_agent(&identity),
            "Dalvik/2.1.0 (Linux; U; Android 14; TECNO KM9 Build/UP1A.231005.007)"
        );
    }

    #[test]
    fn config_defaults() {
        let config = CheckinConfig::default();
        assert_eq!(config.endpoint, CHECKIN_URL);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(!config.debug);
    }
}
