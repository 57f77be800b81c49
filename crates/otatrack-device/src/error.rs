//! Error types for device document loading

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while turning a YAML document into device identities
#[derive(Error, Debug)]
pub enum DeviceConfigError {
    /// The document does not exist
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The document exists but could not be read
    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        /// Path of the document
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid YAML
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The top level of the document is not a mapping
    #[error("Config file content is not a valid mapping")]
    NotAMapping,

    /// `variants` is present but is not a non-empty list
    #[error("'variants' must be a non-empty list of mappings")]
    InvalidVariants,

    /// A `variants` entry is not a mapping
    #[error("Variant entry #{0} is not a mapping")]
    VariantNotMapping(usize),

    /// Required identity fields are absent after variant merging
    #[error("Config missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),
}
