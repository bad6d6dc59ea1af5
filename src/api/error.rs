//! Dropbox API error classification.

use serde::Deserialize;

/// Endpoint error kinds, classified from the `error_summary` of a 409 response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Path or upload session does not exist
    NotFound,
    /// Something already exists at the destination
    Conflict,
    /// Path is not well formed
    MalformedPath,
    /// Name is not allowed by Dropbox
    DisallowedName,
    /// Account is out of space
    InsufficientSpace,
    /// Upload session offset does not match the committed bytes
    IncorrectOffset,
    /// Upload session was already closed
    SessionClosed,
    /// Too many requests or concurrent writes
    RateLimited,
    /// Access token is invalid or expired
    InvalidToken,
    /// Content is restricted
    Restricted,
    /// Unknown error
    Unknown,
}

impl From<&str> for ApiErrorKind {
    fn from(summary: &str) -> Self {
        // Summaries look like "path/not_found/.." or "lookup_failed/incorrect_offset/..".
        for segment in summary.split('/') {
            let kind = match segment.trim_end_matches('.') {
                "not_found" => ApiErrorKind::NotFound,
                "conflict" => ApiErrorKind::Conflict,
                "malformed_path" => ApiErrorKind::MalformedPath,
                "disallowed_name" => ApiErrorKind::DisallowedName,
                "insufficient_space" => ApiErrorKind::InsufficientSpace,
                "incorrect_offset" => ApiErrorKind::IncorrectOffset,
                "closed" => ApiErrorKind::SessionClosed,
                "too_many_write_operations" | "too_many_requests" => ApiErrorKind::RateLimited,
                "expired_access_token" | "invalid_access_token" => ApiErrorKind::InvalidToken,
                "restricted_content" => ApiErrorKind::Restricted,
                _ => continue,
            };
            return kind;
        }
        ApiErrorKind::Unknown
    }
}

impl ApiErrorKind {
    /// Get human-readable description of the error.
    pub fn description(&self) -> &'static str {
        match self {
            ApiErrorKind::NotFound => "Path not found",
            ApiErrorKind::Conflict => "Conflicting entry exists",
            ApiErrorKind::MalformedPath => "Malformed path",
            ApiErrorKind::DisallowedName => "Disallowed name",
            ApiErrorKind::InsufficientSpace => "Insufficient space",
            ApiErrorKind::IncorrectOffset => "Incorrect upload session offset",
            ApiErrorKind::SessionClosed => "Upload session closed",
            ApiErrorKind::RateLimited => "Rate limit exceeded",
            ApiErrorKind::InvalidToken => "Invalid access token",
            ApiErrorKind::Restricted => "Restricted content",
            ApiErrorKind::Unknown => "Unknown error",
        }
    }
}

/// Body of an endpoint error response.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error_summary: String,
}
