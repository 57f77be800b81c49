//! Request encoding and response classification

use std::io::{Read, Write};

use chrono::{DateTime, Utc};
use flate2::Compression;
use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::GzEncoder;
use otatrack_device::DeviceIdentity;
use prost::Message;
use serde::{Deserialize, Serialize};

use crate::error::CheckinError;
use crate::hardware::SyntheticHardware;
use crate::proto::{
    AndroidBuildProto, AndroidCheckinProto, AndroidCheckinRequest, AndroidCheckinResponse,
};

const LOCALE: &str = "en-US";
const TIME_ZONE: &str = "America/New_York";
const PROTOCOL_VERSION: i32 = 3;
const ROAMING: &str = "WIFI::";
const DEVICE_TYPE: i32 = 2;

const SETTING_URL: &str = "update_url";
const SETTING_TITLE: &str = "update_title";
const SETTING_DESCRIPTION: &str = "update_description";
const SETTING_SIZE: &str = "update_size";
/// Prefix of package download URLs, recognised regardless of the setting name
pub const PACKAGE_URL_PREFIX: &str = "https://android.googleapis.com/packages/ota";

/// Update fields extracted from a check-in response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckinResult {
    /// Model of the identity that was checked
    pub device: String,
    /// Whether the response advertised a package
    pub found: bool,
    /// Update title
    pub title: Option<String>,
    /// Raw HTML description
    pub description: Option<String>,
    /// Human-readable package size, e.g. `1.2 GB`
    pub size: Option<String>,
    /// Package download URL
    pub url: Option<String>,
    /// When the response was classified
    pub discovered_at: DateTime<Utc>,
}

impl CheckinResult {
    /// Whether a package URL is available
    pub fn has_update(&self) -> bool {
        self.found && self.url.is_some()
    }
}

/// Protobuf check-in request for an identity
pub fn build_request(identity: &DeviceIdentity) -> AndroidCheckinRequest {
    let fingerprint = identity.fingerprint();
    let hardware = SyntheticHardware::for_fingerprint(&fingerprint);

    AndroidCheckinRequest {
        imei: Some(hardware.imei),
        id: Some(0),
        digest: Some(hardware.digest),
        checkin: Some(AndroidCheckinProto {
            build: Some(AndroidBuildProto {
                id: Some(fingerprint),
                timestamp: Some(0),
                device: Some(identity.device.clone()),
            }),
            roaming: Some(ROAMING.to_string()),
            user_number: Some(0),
            device_type: Some(DEVICE_TYPE),
            voice_capable: Some(false),
        }),
        locale: Some(LOCALE.to_string()),
        mac_addr: vec![hardware.mac],
        time_zone: Some(TIME_ZONE.to_string()),
        version: Some(PROTOCOL_VERSION),
        serial_number: Some(hardware.serial),
        mac_addr_type: vec!["wifi".to_string()],
        fragment: Some(0),
        user_serial_number: Some(0),
        fetch_system_updates: Some(1),
    }
}

/// Gzip-compressed request body for an identity
pub fn encode_request(identity: &DeviceIdentity) -> Result<Vec<u8>, CheckinError> {
    let payload = build_request(identity).encode_to_vec();
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&payload)
        .map_err(CheckinError::Compression)?;
    encoder.finish().map_err(CheckinError::Compression)
}

/// Decode a response body and classify it for `device`
pub fn parse_response(body: &[u8], device: &str) -> Result<CheckinResult, CheckinError> {
    let response = AndroidCheckinResponse::decode(body)?;
    Ok(classify(&response, device))
}

/// Extract update fields from a decoded response
pub fn classify(response: &AndroidCheckinResponse, device: &str) -> CheckinResult {
    let mut result = CheckinResult {
        device: device.to_string(),
        found: false,
        title: None,
        description: None,
        size: None,
        url: None,
        discovered_at: Utc::now(),
    };

    for setting in &response.setting {
        let name = setting
            .name
            .as_deref()
            .map(String::from_utf8_lossy)
            .unwrap_or_default();
        let value = setting
            .value
            .as_deref()
            .map(|raw| String::from_utf8_lossy(raw).into_owned())
            .unwrap_or_default();

        if result.url.is_none() && (name == SETTING_URL || value.contains(PACKAGE_URL_PREFIX)) {
            result.url = Some(value.trim().to_string());
            result.found = true;
            continue;
        }
        match name.as_ref() {
            SETTING_TITLE => result.title = Some(value.trim().to_string()),
            SETTING_DESCRIPTION => result.description = Some(value.trim().to_string()),
            SETTING_SIZE => result.size = Some(value.trim().to_string()),
            _ => {}
        }
    }

    result
}

/// Readable dump of a decoded response
pub fn render_response(response: &AndroidCheckinResponse) -> String {
    let mut lines = vec![
        format!("stats_ok: {:?}", response.stats_ok),
        format!("time_msec: {:?}", response.time_msec),
        format!("digest: {:?}", response.digest),
        format!("android_id: {:?}", response.android_id),
        format!("security_token: {:?}", response.security_token),
        format!("settings_diff: {:?}", response.settings_diff),
        format!("settings ({}):", response.setting.len()),
    ];
    lines.extend(response.setting.iter().map(|setting| {
        let name = setting.name.as_deref().map(String::from_utf8_lossy);
        let value = setting.value.as_deref().map(String::from_utf8_lossy);
        format!(
            "  {}: {}",
            name.unwrap_or_default(),
            value.unwrap_or_default()
        )
    }));
    lines.join("\n") + "\n"
}

/// Undo a `content-encoding` the client asked for but does not decode itself
pub(crate) fn decode_body(body: Vec<u8>, encoding: Option<&str>) -> Result<Vec<u8>, CheckinError> {
    let mut decoded = Vec::new();
    match encoding.map(str::trim) {
        Some(enc) if enc.eq_ignore_ascii_case("gzip") => {
            GzDecoder::new(body.as_slice())
                .read_to_end(&mut decoded)
                .map_err(CheckinError::Compression)?;
        }
        Some(enc) if enc.eq_ignore_ascii_case("deflate") => {
            ZlibDecoder::new(body.as_slice())
                .read_to_end(&mut decoded)
                .map_err(CheckinError::Compression)?;
        }
        _ => return Ok(body),
    }
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::GservicesSetting;

    fn identity() -> DeviceIdentity {
        DeviceIdentity {
            build_tag: "UP1A.231005.007".to_string(),
            incremental: "240101V123".to_string(),
            android_version: "14".to_string(),
            model: "TECNO KM9".to_string(),
            device: "TECNO-KM9".to_string(),
            oem: "TECNO".to_string(),
            product: "KM9-OP".to_string(),
            variant: None,
            variant_index: None,
        }
    }

    fn setting(name: &[u8], value: &str) -> GservicesSetting {
        GservicesSetting {
            name: Some(name.to_vec()),
            value: Some(value.as_bytes().to_vec()),
        }
    }

    #[test]
    fn request_carries_fingerprint_and_fixed_fields() -> Result<(), CheckinError> {
        let body = encode_request(&identity())?;
        let mut raw = Vec::new();
        GzDecoder::new(body.as_slice())
            .read_to_end(&mut raw)
            .map_err(CheckinError::Compression)?;
        let request = AndroidCheckinRequest::decode(raw.as_slice())?;

        let checkin = request.checkin.unwrap_or_default();
        let build = checkin.build.unwrap_or_default();
        assert_eq!(build.id, Some(identity().fingerprint()));
        assert_eq!(build.device.as_deref(), Some("TECNO-KM9"));
        assert_eq!(checkin.roaming.as_deref(), Some("WIFI::"));
        assert_eq!(checkin.device_type, Some(2));
        assert_eq!(request.locale.as_deref(), Some("en-US"));
        assert_eq!(request.time_zone.as_deref(), Some("America/New_York"));
        assert_eq!(request.version, Some(3));
        assert_eq!(request.fetch_system_updates, Some(1));
        assert_eq!(request.mac_addr_type, vec!["wifi".to_string()]);
        Ok(())
    }

    #[test]
    fn update_is_found() -> Result<(), CheckinError> {
        let response = AndroidCheckinResponse {
            setting: vec![
                setting(b"update_title", "  KM9-H894ABC-U-OP-240301V200  "),
                setting(b"update_description", "<p>Security fixes</p>\n"),
                setting(b"update_size", "1.2 GB"),
                setting(b"update_url", "https://android.googleapis.com/packages/ota-api/a.zip"),
            ],
            ..Default::default()
        };
        let result = parse_response(&response.encode_to_vec(), "TECNO KM9")?;
        assert!(result.found);
        assert!(result.has_update());
        assert_eq!(result.title.as_deref(), Some("KM9-H894ABC-U-OP-240301V200"));
        assert_eq!(result.description.as_deref(), Some("<p>Security fixes</p>"));
        assert_eq!(result.size.as_deref(), Some("1.2 GB"));
        assert_eq!(result.device, "TECNO KM9");
        Ok(())
    }

    #[test]
    fn first_url_candidate_wins() {
        let response = AndroidCheckinResponse {
            setting: vec![
                setting(b"some_other", "https://android.googleapis.com/packages/ota/first.zip"),
                setting(b"update_url", "https://android.googleapis.com/packages/ota/second.zip"),
            ],
            ..Default::default()
        };
        let result = classify(&response, "m");
        assert_eq!(
            result.url.as_deref(),
            Some("https://android.googleapis.com/packages/ota/first.zip")
        );
    }

    #[test]
    fn package_url_found_under_non_utf8_name() {
        let response = AndroidCheckinResponse {
            setting: vec![
                setting(&[0xff, 0xfe], "https://android.googleapis.com/packages/ota/x.zip"),
                setting(b"update_size", "10 MB"),
            ],
            ..Default::default()
        };
        let result = classify(&response, "m");
        assert!(result.found);
        assert_eq!(
            result.url.as_deref(),
            Some("https://android.googleapis.com/packages/ota/x.zip")
        );
        assert_eq!(result.size.as_deref(), Some("10 MB"));
    }

    #[test]
    fn non_utf8_name_without_package_url_is_ignored() {
        let response = AndroidCheckinResponse {
            setting: vec![setting(&[0xff, 0xfe], "unrelated")],
            ..Default::default()
        };
        let result = classify(&response, "m");
        assert!(!result.found);
        assert_eq!(result.title, None);
    }

    #[test]
    fn empty_response_has_no_update() -> Result<(), CheckinError> {
        let result = parse_response(&[], "m")?;
        assert!(!result.found);
        assert!(!result.has_update());
        Ok(())
    }

    #[test]
    fn dump_lists_settings() {
        let response = AndroidCheckinResponse {
            setting: vec![setting(b"update_size", "1.2 GB")],
            ..Default::default()
        };
        let dump = render_response(&response);
        assert!(dump.contains("settings (1):"));
        assert!(dump.contains("update_size: 1.2 GB"));
    }

    #[test]
    fn identity_bodies_pass_through() -> Result<(), CheckinError> {
        assert_eq!(decode_body(vec![1, 2, 3], None)?, vec![1, 2, 3]);
        assert_eq!(decode_body(vec![1, 2, 3], Some("identity"))?, vec![1, 2, 3]);
        Ok(())
    }
}
