//! A device identity paired with the config it came from

use std::path::{Path, PathBuf};

use otatrack_device::DeviceIdentity;

/// One identity from one config document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Document the identity came from
    pub config_path: PathBuf,
    /// Identity to check
    pub identity: DeviceIdentity,
}

impl Target {
    /// Target for `identity` loaded from `config_path`
    pub fn new(config_path: impl Into<PathBuf>, identity: DeviceIdentity) -> Self {
        Self {
            config_path: config_path.into(),
            identity,
        }
    }

    /// Config file stem, used in release and commit messages
    pub fn config_name(&self) -> String {
        self.config_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Config path
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// `stem` or `stem [variant]`, for scheduler headers
    pub fn label(&self) -> String {
        match &self.identity.variant {
            Some(variant) => format!("{} [{variant}]", self.config_name()),
            None => self.config_name(),
        }
    }
}
