//! Error types for check-in operations

use thiserror::Error;

/// Errors that can occur while talking to the check-in endpoint
#[derive(Error, Debug)]
pub enum CheckinError {
    /// Connection, TLS or timeout failure
    #[error("Check-in transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status
    #[error("Check-in endpoint returned HTTP {status}")]
    Status {
        /// HTTP status code
        status: u16,
    },

    /// The response body is not a valid check-in response
    #[error("Failed to decode check-in response: {0}")]
    Decode(#[from] prost::DecodeError),

    /// Compressing the request or inflating the response failed
    #[error("Check-in body compression error: {0}")]
    Compression(#[source] std::io::Error),

    /// Writing a debug artifact failed
    #[error("Failed to write debug artifact: {0}")]
    DebugArtifact(#[source] std::io::Error),
}
