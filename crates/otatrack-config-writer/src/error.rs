use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while rewriting a document
#[derive(Error, Debug)]
pub enum ConfigWriteError {
    /// The document could not be read or written
    #[error("Config file {} I/O error: {source}", path.display())]
    Io {
        /// Document path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid YAML
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The document has variants but no block-style `variants:` line
    #[error("Could not find variants section")]
    VariantsSectionMissing,

    /// No variant resolves to the identity's product
    #[error("Could not locate variant for product {product}")]
    VariantNotFound {
        /// Product searched for
        product: String,
    },

    /// The matching variant has no locatable list entry
    #[error("Failed to locate variant block #{}", index + 1)]
    EntryNotFound {
        /// Zero-based variant position
        index: usize,
    },

    /// No `incremental` line in a single-identity document
    #[error("Could not find incremental entry")]
    FieldNotFound,

    /// The replacement value is empty or spans lines
    #[error("Invalid incremental value: {0:?}")]
    InvalidValue(String),
}
