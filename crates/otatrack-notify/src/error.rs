use thiserror::Error;

/// Errors raised while delivering a notification
#[derive(Error, Debug)]
pub enum NotifyError {
    /// The request did not complete
    #[error("Notification transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("API returned HTTP {status}: {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body, for diagnostics
        body: String,
    },

    /// The API answered but reported failure
    #[error("Request rejected: {0}")]
    Rejected(String),
}
