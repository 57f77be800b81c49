//! YAML target documents
//!
//! A document is either a single identity:
//!
//! ```yaml
//! oem: TECNO
//! product: KM9-OP
//! device: TECNO-KM9
//! model: TECNO KM9
//! android_version: 14
//! build_tag: UP1A.231005.007
//! incremental: "240101V123"
//! ```
//!
//! or a base mapping with a `variants` list whose entries are merged over the base.

use std::path::Path;

use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::error::DeviceConfigError;
use crate::identity::DeviceIdentity;

/// Keys every identity must resolve to a non-empty scalar
pub const REQUIRED_FIELDS: [&str; 7] = [
    "build_tag",
    "incremental",
    "android_version",
    "model",
    "device",
    "oem",
    "product",
];

/// Keys consulted, in order, for a variant's display label
const VARIANT_LABEL_KEYS: [&str; 5] = ["variant", "name", "region", "label", "product"];

/// Load every identity described by the document at `path`
pub fn load_identities(path: &Path) -> Result<Vec<DeviceIdentity>, DeviceConfigError> {
    if !path.exists() {
        return Err(DeviceConfigError::NotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path).map_err(|source| DeviceConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let identities = parse_identities(&text)?;
    debug!(path = %path.display(), count = identities.len(), "loaded device identities");
    Ok(identities)
}

/// Parse a document into one identity, or one identity per variant
pub fn parse_identities(text: &str) -> Result<Vec<DeviceIdentity>, DeviceConfigError> {
    let root: Value = serde_yaml::from_str(text)?;
    let Value::Mapping(mut base) = root else {
        return Err(DeviceConfigError::NotAMapping);
    };

    let Some(variants) = base.remove("variants") else {
        return identity_from_mapping(&base, None, None).map(|identity| vec![identity]);
    };

    let entries = match variants {
        Value::Sequence(entries) if !entries.is_empty() => entries,
        _ => return Err(DeviceConfigError::InvalidVariants),
    };

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let Value::Mapping(overrides) = entry else {
                return Err(DeviceConfigError::VariantNotMapping(index));
            };
            let mut merged = base.clone();
            for (key, value) in overrides {
                merged.insert(key.clone(), value.clone());
            }
            let label = variant_label(overrides);
            identity_from_mapping(&merged, label, Some(index))
        })
        .collect()
}

/// Keep only identities whose product carries the given region code
///
/// Matching is case-insensitive. An empty code keeps everything.
pub fn select_region(identities: Vec<DeviceIdentity>, code: &str) -> Vec<DeviceIdentity> {
    let code = code.trim();
    if code.is_empty() {
        return identities;
    }
    identities
        .into_iter()
        .filter(|identity| {
            identity
                .region_code()
                .is_some_and(|own| own.eq_ignore_ascii_case(code))
        })
        .collect()
}

fn identity_from_mapping(
    map: &Mapping,
    variant: Option<String>,
    variant_index: Option<usize>,
) -> Result<DeviceIdentity, DeviceConfigError> {
    let missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|field| field_text(map, field).is_none())
        .map(|field| (*field).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DeviceConfigError::MissingFields(missing));
    }

    let field = |name: &str| field_text(map, name).unwrap_or_default();
    Ok(DeviceIdentity {
        build_tag: field("build_tag"),
        incremental: field("incremental"),
        android_version: field("android_version"),
        model: field("model"),
        device: field("device"),
        oem: field("oem"),
        product: field("product"),
        variant,
        variant_index,
    })
}

fn variant_label(overrides: &Mapping) -> Option<String> {
    VARIANT_LABEL_KEYS
        .iter()
        .find_map(|key| field_text(overrides, key))
}

fn field_text(map: &Mapping, key: &str) -> Option<String> {
    map.get(key).and_then(scalar_text).filter(|text| !text.is_empty())
}

/// Render a YAML scalar the way it reads in the document
///
/// Unquoted numbers such as `android_version: 14` are accepted as text.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SINGLE: &str = r#"
oem: TECNO
product: KM9-OP
device: TECNO-KM9
model: TECNO KM9
android_version: 14
build_tag: UP1A.231005.007
incremental: "240101V123"
"#;

    const FAMILY: &str = r#"
oem: Infinix
device: Infinix-X6871
model: Infinix GT 20 Pro
android_version: 14
build_tag: UP1A.231005.007
incremental: "X6871-H894ABC-U-OP-240101V100"
variants:
  - product: X6871-OP
  - product: X6871-RU
    incremental: "X6871-H894ABC-U-RU-240101V101"
    region: Russia
  - variant: India
    product: X6871-IN
"#;

    #[test]
    fn single_document() -> Result<(), DeviceConfigError> {
        let identities = parse_identities(SINGLE)?;
        assert_eq!(identities.len(), 1);
        let identity = &identities[0];
        assert_eq!(identity.android_version, "14");
        assert_eq!(identity.variant, None);
        assert_eq!(identity.variant_index, None);
        Ok(())
    }

    #[test]
    fn variants_inherit_and_override() -> Result<(), DeviceConfigError> {
        let identities = parse_identities(FAMILY)?;
        assert_eq!(identities.len(), 3);

        assert_eq!(identities[0].product, "X6871-OP");
        assert_eq!(identities[0].incremental, "X6871-H894ABC-U-OP-240101V100");
        assert_eq!(identities[0].variant.as_deref(), Some("X6871-OP"));

        assert_eq!(identities[1].incremental, "X6871-H894ABC-U-RU-240101V101");
        assert_eq!(identities[1].variant.as_deref(), Some("Russia"));
        assert_eq!(identities[1].variant_index, Some(1));

        assert_eq!(identities[2].variant.as_deref(), Some("India"));
        assert_eq!(identities[2].model, "Infinix GT 20 Pro");
        Ok(())
    }

    #[test]
    fn missing_fields_are_listed() {
        let result = parse_identities("oem: TECNO\nproduct: KM9-OP\n");
        match result {
            Err(DeviceConfigError::MissingFields(fields)) => {
                assert!(fields.contains(&"build_tag".to_string()));
                assert!(fields.contains(&"incremental".to_string()));
                assert!(!fields.contains(&"oem".to_string()));
            }
            other => panic!("expected missing fields, got {other:?}"),
        }
    }

    #[test]
    fn empty_variants_rejected() {
        let text = format!("{SINGLE}variants: []\n");
        assert!(matches!(
            parse_identities(&text),
            Err(DeviceConfigError::InvalidVariants)
        ));
    }

    #[test]
    fn non_mapping_rejected() {
        assert!(matches!(
            parse_identities("- a\n- b\n"),
            Err(DeviceConfigError::NotAMapping)
        ));
    }

    #[test]
    fn region_filter() -> Result<(), DeviceConfigError> {
        let identities = parse_identities(FAMILY)?;
        let russian = select_region(identities.clone(), "ru");
        assert_eq!(russian.len(), 1);
        assert_eq!(russian[0].product, "X6871-RU");
        assert_eq!(select_region(identities, "").len(), 3);
        Ok(())
    }
}
