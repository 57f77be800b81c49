//! Device identity record

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::region;

/// Everything the check-in endpoint needs to recognise one handset build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// Build tag, e.g. `TP1A.220624.014`
    pub build_tag: String,
    /// Incremental build identifier currently installed
    pub incremental: String,
    /// Platform version, e.g. `14`
    pub android_version: String,
    /// Marketing model name
    pub model: String,
    /// Device codename
    pub device: String,
    /// Manufacturer as it appears in the fingerprint
    pub oem: String,
    /// Product code, usually `<MODEL>-<REGION>`
    pub product: String,
    /// Variant label when the identity came from a `variants` entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    /// Position of the originating `variants` entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_index: Option<usize>,
}

impl DeviceIdentity {
    /// Canonical build fingerprint
    ///
    /// `OEM/PRODUCT/DEVICE:PLATFORM/BUILD_TAG/INCREMENTAL:user/release-keys`
    pub fn fingerprint(&self) -> String {
        format!(
            "{}/{}/{}:{}/{}/{}:user/release-keys",
            self.oem,
            self.product,
            self.device,
            self.android_version,
            self.build_tag,
            self.incremental
        )
    }

    /// Copy of this identity reporting a different installed incremental
    pub fn with_incremental(&self, incremental: impl Into<String>) -> Self {
        Self {
            incremental: incremental.into(),
            ..self.clone()
        }
    }

    /// Region code taken from the product suffix
    pub fn region_code(&self) -> Option<&str> {
        region::region_code(&self.product)
    }

    /// Region display name for the product suffix
    pub fn region_name(&self) -> Option<&'static str> {
        region::region_for_product(&self.product)
    }

    /// Short label for console output, `model` or `model [variant]`
    pub fn label(&self) -> String {
        match &self.variant {
            Some(variant) => format!("{} [{variant}]", self.model),
            None => self.model.clone(),
        }
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.model, self.device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DeviceIdentity {
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

    #[test]
    fn fingerprint_layout() {
        assert_eq!(
            sample().fingerprint(),
            "TECNO/KM9-OP/TECNO-KM9:14/UP1A.231005.007/240101V123:user/release-keys"
        );
    }

    #[test]
    fn override_only_touches_incremental() {
        let original = sample();
        let updated = original.with_incremental("240301V200");
        assert_eq!(updated.incremental, "240301V200");
        assert_eq!(updated.product, original.product);
        assert!(updated.fingerprint().contains("/240301V200:user"));
    }

    #[test]
    fn label_includes_variant() {
        let mut identity = sample();
        assert_eq!(identity.label(), "TECNO KM9");
        identity.variant = Some("Global".to_string());
        assert_eq!(identity.label(), "TECNO KM9 [Global]");
        assert_eq!(identity.region_name(), Some("Global"));
    }
}
