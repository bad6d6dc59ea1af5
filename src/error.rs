//! Error types for the dbx-transfer library.

use thiserror::Error;

use crate::api::ApiErrorKind;

/// Main error type for transfer operations.
#[derive(Error, Debug)]
pub enum TransferError {
    /// A local or remote path is neither a file nor a directory.
    #[error("Path kind error: {0}")]
    PathKind(String),

    /// A required local or remote source does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Destination exists and overwrite was not authorized, or a non-empty
    /// directory removal was requested without recursion.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Out-of-range or unrecognized option value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP request failed with status code.
    #[error("HTTP error: {0}")]
    HttpError(u16),

    /// Network request error.
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Local filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Dropbox API returned an endpoint-specific error.
    #[error("API error: {summary} ({})", kind.description())]
    Api { kind: ApiErrorKind, summary: String },

    /// Invalid or unexpected response from server.
    #[error("Invalid response from server")]
    InvalidResponse,

    /// No usable access token could be obtained.
    #[error("Credentials error: {0}")]
    Credentials(String),

    /// Custom error message.
    #[error("{0}")]
    Custom(String),
}

impl TransferError {
    /// Check whether this is an API error of the given kind.
    pub fn is_api(&self, expected: ApiErrorKind) -> bool {
        matches!(self, TransferError::Api { kind, .. } if *kind == expected)
    }
}

/// Result type alias for transfer operations.
pub type Result<T> = std::result::Result<T, TransferError>;
