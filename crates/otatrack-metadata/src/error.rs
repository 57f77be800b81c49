//! Error types for metadata extraction

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while extracting package metadata
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Connection, TLS or body read failure
    #[error("Package transfer failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The package URL answered with a non-success status
    #[error("Package download returned HTTP {status}")]
    Status {
        /// HTTP status code
        status: u16,
    },

    /// The pipeline did not finish within its deadline
    #[error("Metadata extraction timed out after {0:?}")]
    Timeout(Duration),

    /// The byte stream is not a ZIP archive this walker can follow
    #[error("Archive error: {0}")]
    Archive(String),

    /// The metadata entry failed to inflate
    #[error("Failed to inflate metadata entry: {0}")]
    Inflate(#[from] flate2::DecompressError),
}
