//! Release notes

use otatrack_metadata::OtaMetadata;

use crate::error::ReleaseError;

/// Placeholder title treated as missing
pub const UNKNOWN_TITLE: &str = "Unknown Update";
/// Placeholder device treated as missing
pub const UNKNOWN_DEVICE: &str = "Unknown Device";

/// Everything needed to publish one release
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseRequest {
    /// Config file stem, for messages
    pub config_name: String,
    /// Update title, also used as the release tag
    pub title: String,
    /// Device model
    pub device: String,
    /// Changelog
    pub description: Option<String>,
    /// Package size
    pub size: Option<String>,
    /// Package download URL
    pub url: String,
    /// Target build fingerprint
    pub fingerprint: String,
    /// Extracted build details
    pub metadata: Option<OtaMetadata>,
}

impl ReleaseRequest {
    /// Reject requests that would publish placeholders
    pub fn validate(&self) -> Result<(), ReleaseError> {
        let title = self.title.trim();
        if title.is_empty() || title == UNKNOWN_TITLE {
            return Err(ReleaseError::MissingField("Title"));
        }
        let device = self.device.trim();
        if device.is_empty() || device == UNKNOWN_DEVICE {
            return Err(ReleaseError::MissingField("Device"));
        }
        if self.url.trim().is_empty() {
            return Err(ReleaseError::MissingField("Download URL"));
        }
        Ok(())
    }

    /// Markdown body of the release
    pub fn notes(&self) -> String {
        let description = self
            .description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or("No description available");
        let size = self
            .size
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("Unknown size");
        let fingerprint = if self.fingerprint.is_empty() {
            "Unknown fingerprint"
        } else {
            &self.fingerprint
        };

        let mut lines = vec![
            format!("# {}", self.device),
            "## Changelog:".to_string(),
            description.to_string(),
            String::new(),
            format!("**Size:** {size}"),
            format!("**Download URL:** {}", self.url),
        ];
        if let Some(metadata) = &self.metadata {
            if let Some(incremental) = &metadata.incremental {
                lines.push(format!("**Incremental:** {incremental}"));
            }
            if let Some(patch) = &metadata.security_patch_level {
                lines.push(format!("**Security patch:** {patch}"));
            }
            if let Some(date) = &metadata.build_date {
                lines.push(format!("**Build date:** {date} (CST)"));
            }
            if let Some(summary) = metadata.sdk_summary() {
                lines.push(summary.release_line);
            }
        }
        lines.push(format!("**Fingerprint:** `{fingerprint}`"));

        let mut notes = lines.join("\n");
        notes.push('\n');
        notes
    }
}
