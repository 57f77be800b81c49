//! Integration tests for loading device documents from disk

use std::io::Write;

use anyhow::Result;
use otatrack_device::{DeviceConfigError, DeviceIdentity, load_identities, region_for_product};
use proptest::prelude::*;

#[test]
fn loads_document_from_disk() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(
        file,
        "oem: TECNO\nproduct: \"KM9-OP\"\ndevice: TECNO-KM9\nmodel: TECNO KM9\n\
         android_version: 14\nbuild_tag: UP1A.231005.007\nincremental: '240101V123'"
    )?;

    let identities = load_identities(file.path())?;
    assert_eq!(identities.len(), 1);
    let identity = &identities[0];
    assert_eq!(identity.region_code(), Some("OP"));
    assert_eq!(identity.region_name(), Some("Global"));
    assert_eq!(region_for_product(&identity.product), Some("Global"));
    Ok(())
}

#[test]
fn missing_document_is_reported() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("absent.yml");
    assert!(matches!(
        load_identities(&path),
        Err(DeviceConfigError::NotFound(_))
    ));
    Ok(())
}

#[test]
fn malformed_yaml_is_a_parse_error() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(file, "oem: [unterminated")?;
    assert!(matches!(
        load_identities(file.path()),
        Err(DeviceConfigError::Parse(_))
    ));
    Ok(())
}

fn segment() -> impl Strategy<Value = String> {
    "[A-Za-z0-9._-]{1,16}"
}

proptest! {
    #[test]
    fn fingerprint_is_deterministic_and_carries_every_field(
        oem in segment(),
        product in segment(),
        device in segment(),
        version in "[0-9]{1,2}",
        build_tag in segment(),
        incremental in segment(),
    ) {
        let identity = DeviceIdentity {
            build_tag: build_tag.clone(),
            incremental: incremental.clone(),
            android_version: version.clone(),
            model: "Model".to_string(),
            device: device.clone(),
            oem: oem.clone(),
            product: product.clone(),
            variant: None,
            variant_index: None,
        };
        let fingerprint = identity.fingerprint();
        prop_assert_eq!(&fingerprint, &identity.clone().fingerprint());
        let expected_prefix = format!("{oem}/{product}/{device}:{version}/");
        let expected_suffix = format!("/{build_tag}/{incremental}:user/release-keys");
        prop_assert!(fingerprint.starts_with(&expected_prefix));
        prop_assert!(fingerprint.ends_with(&expected_suffix));
    }
}
