//! Target build metadata and derived labels

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Offset used for build dates, UTC+8
const BUILD_DATE_OFFSET_SECS: i32 = 8 * 3600;
/// First SDK level with a mapped Android version
const FIRST_MAPPED_SDK: u32 = 33;

/// Build properties of the release an OTA package installs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtaMetadata {
    /// `post-build`, the target fingerprint
    pub fingerprint: String,
    /// `post-build-incremental`
    pub incremental: Option<String>,
    /// `post-security-patch-level`
    pub security_patch_level: Option<String>,
    /// `post-timestamp`, seconds since the epoch as written
    pub timestamp: Option<String>,
    /// Build time at UTC+8, `YYYY-MM-DD HH:MM:SS`
    pub build_date: Option<String>,
    /// `post-sdk-level`
    pub sdk_level: Option<String>,
    /// Android version for SDK levels 33 and above
    pub android_version: Option<String>,
}

impl OtaMetadata {
    /// Parse `key=value` lines as written in `META-INF/com/android/metadata`
    pub fn from_lines(text: &str) -> Self {
        let mut meta = Self::default();
        for line in text.lines() {
            let Some((key, value)) = line.trim().split_once('=') else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            let value = value.to_string();
            match key.trim() {
                "post-build" => meta.fingerprint = value,
                "post-build-incremental" => meta.incremental = Some(value),
                "post-security-patch-level" => meta.security_patch_level = Some(value),
                "post-timestamp" => {
                    meta.build_date = build_date_from_timestamp(&value);
                    meta.timestamp = Some(value);
                }
                "post-sdk-level" => {
                    meta.android_version = value
                        .parse::<u32>()
                        .ok()
                        .and_then(android_version_for_sdk)
                        .map(str::to_string);
                    meta.sdk_level = Some(value);
                }
                _ => {}
            }
        }
        meta
    }

    /// Whether a target fingerprint was found
    pub fn has_fingerprint(&self) -> bool {
        !self.fingerprint.is_empty()
    }

    /// Incremental of the target build, from metadata or the fingerprint
    pub fn target_incremental(&self) -> Option<String> {
        self.incremental
            .clone()
            .or_else(|| incremental_from_fingerprint(&self.fingerprint))
    }

    /// Android/SDK labels for messages and release notes
    pub fn sdk_summary(&self) -> Option<SdkSummary> {
        SdkSummary::new(self.sdk_level.as_deref(), self.android_version.as_deref())
    }
}

/// Android version or SDK level rendered for each output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkSummary {
    /// Short label, `Android 14` or `SDK: 40`
    pub label: String,
    /// Console line
    pub log_line: String,
    /// Markdown line for release notes
    pub release_line: String,
}

impl SdkSummary {
    /// Labels for an SDK level; levels below 33 or unparsable values yield nothing
    pub fn new(sdk_level: Option<&str>, android_version: Option<&str>) -> Option<Self> {
        let sdk_level = sdk_level?.trim();
        let level: u32 = sdk_level.parse().ok()?;
        if level < FIRST_MAPPED_SDK {
            return None;
        }
        let version = android_version
            .filter(|v| !v.is_empty())
            .or_else(|| android_version_for_sdk(level));
        Some(match version {
            Some(version) => Self {
                label: version.to_string(),
                log_line: format!("Android: {version} (SDK {sdk_level})"),
                release_line: format!("**Android:** {version} (SDK {sdk_level})"),
            },
            None => Self {
                label: format!("SDK: {sdk_level}"),
                log_line: format!("SDK level: {sdk_level}"),
                release_line: format!("**SDK:** {sdk_level}"),
            },
        })
    }
}

/// Android version name for an SDK level
pub fn android_version_for_sdk(level: u32) -> Option<&'static str> {
    match level {
        33 => Some("Android 13"),
        34 => Some("Android 14"),
        35 => Some("Android 15"),
        36 => Some("Android 16"),
        37 => Some("Android 17"),
        38 => Some("Android 18"),
        _ => None,
    }
}

/// Format a unix timestamp at UTC+8
pub fn build_date_from_timestamp(raw: &str) -> Option<String> {
    let seconds: i64 = raw.trim().parse().ok()?;
    let utc = DateTime::from_timestamp(seconds, 0)?;
    let offset = FixedOffset::east_opt(BUILD_DATE_OFFSET_SECS)?;
    Some(
        utc.with_timezone(&offset)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
    )
}

/// Incremental segment of a fingerprint
///
/// `OEM/PRODUCT/DEVICE:PLATFORM/BUILD_TAG/INCREMENTAL:user/release-keys` yields
/// `INCREMENTAL`.
pub fn incremental_from_fingerprint(fingerprint: &str) -> Option<String> {
    let (_, suffix) = fingerprint.split_once(':')?;
    let segment = suffix.split('/').nth(2)?;
    let incremental = segment.split(':').next().unwrap_or_default();
    (!incremental.is_empty()).then(|| incremental.to_string())
}
