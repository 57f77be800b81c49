//! Check-in client against a mock endpoint

use std::io::Write;

use anyhow::Result;
use flate2::Compression;
use flate2::write::GzEncoder;
use otatrack_checkin::client::{DEBUG_ERROR_FILE, DEBUG_RESPONSE_FILE};
use otatrack_checkin::proto::{AndroidCheckinResponse, GservicesSetting};
use otatrack_checkin::{CheckinClient, CheckinConfig, CheckinError};
use otatrack_device::DeviceIdentity;
use prost::Message;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

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

fn update_response() -> Vec<u8> {
    let setting = |name: &str, value: &str| GservicesSetting {
        name: Some(name.as_bytes().to_vec()),
        value: Some(value.as_bytes().to_vec()),
    };
    AndroidCheckinResponse {
        setting: vec![
            setting("update_title", "KM9-H894ABC-U-OP-240301V200"),
            setting("update_size", "1.2 GB"),
            setting(
                "update_url",
                "https://android.googleapis.com/packages/ota-api/package/abc.zip",
            ),
        ],
        ..Default::default()
    }
    .encode_to_vec()
}

#[tokio::test]
async fn sends_expected_headers_and_classifies_update() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/checkin"))
        .and(header("content-type", "application/x-protobuffer"))
        .and(header("content-encoding", "gzip"))
        .and(header(
            "user-agent",
            "Dalvik/2.1.0 (Linux; U; Android 14; TECNO KM9 Build/UP1A.231005.007)",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(update_response()))
        .expect(1)
        .mount(&server)
        .await;

    let client = CheckinClient::new(CheckinConfig::new(format!("{}/checkin", server.uri())))?;
    let result = client.check(&identity()).await?;

    assert!(result.has_update());
    assert_eq!(result.size.as_deref(), Some("1.2 GB"));
    assert_eq!(result.title.as_deref(), Some("KM9-H894ABC-U-OP-240301V200"));
    Ok(())
}

#[tokio::test]
async fn gzip_response_is_inflated() -> Result<()> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&update_response())?;
    let compressed = encoder.finish()?;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-encoding", "gzip")
                .set_body_bytes(compressed),
        )
        .mount(&server)
        .await;

    let client = CheckinClient::new(CheckinConfig::new(server.uri()))?;
    let result = client.check(&identity()).await?;
    assert!(result.found);
    Ok(())
}

#[tokio::test]
async fn error_status_is_reported() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = CheckinClient::new(CheckinConfig::new(server.uri()))?;
    match client.check(&identity()).await {
        Err(CheckinError::Status { status }) => assert_eq!(status, 503),
        other => panic!("expected status error, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn debug_artifacts_are_written() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(update_response()))
        .mount(&server)
        .await;

    let config = CheckinConfig::new(server.uri()).with_debug_dir(dir.path());
    let client = CheckinClient::new(config)?;
    client.check(&identity()).await?;

    let dump = std::fs::read_to_string(dir.path().join(DEBUG_RESPONSE_FILE))?;
    assert!(dump.contains("update_size: 1.2 GB"));
    Ok(())
}

#[tokio::test]
async fn undecodable_body_is_kept_for_inspection() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let garbage = vec![0x0a, 0xff, 0xff, 0xff, 0xff, 0xff];
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(garbage.clone()))
        .mount(&server)
        .await;

    let config = CheckinConfig::new(server.uri()).with_debug_dir(dir.path());
    let client = CheckinClient::new(config)?;
    assert!(matches!(
        client.check(&identity()).await,
        Err(CheckinError::Decode(_))
    ));
    assert_eq!(std::fs::read(dir.path().join(DEBUG_ERROR_FILE))?, garbage);
    Ok(())
}
