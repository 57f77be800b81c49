//! Error types for the otatrack CLI

use std::path::PathBuf;

use otatrack_device::DeviceConfigError;
use thiserror::Error;

/// Problems that stop a run before any target is checked
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Config error: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: DeviceConfigError,
    },

    #[error("No variant of {} matches region {region}", path.display())]
    RegionNotFound { path: PathBuf, region: String },
}
