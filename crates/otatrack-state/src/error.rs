use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the state store
#[derive(Error, Debug)]
pub enum StateError {
    /// Reading or appending the state file failed
    #[error("State file {} I/O error: {source}", path.display())]
    Io {
        /// State file path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The identifier is empty or spans several lines
    #[error("Invalid update identifier: {0:?}")]
    InvalidIdentifier(String),
}
