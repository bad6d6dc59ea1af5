//! Dropbox API client and types.

pub mod client;
pub mod error;
pub(crate) mod types;

pub use client::ApiClient;
pub use error::ApiErrorKind;
