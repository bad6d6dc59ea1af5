//! Remote object store contract.
//!
//! The transfer manager only talks to a [`RemoteStore`]. Two implementations
//! ship with the crate: [`DropboxStore`] speaks the Dropbox v2 HTTP API, and
//! [`MemoryStore`] keeps everything in process for headless runs and tests.

mod dropbox;
mod memory;

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::fs::{ListPage, RemoteEntry};

pub use dropbox::DropboxStore;
pub use memory::{CallCounts, MemoryStore};

/// Largest request body the store accepts (150 MiB).
pub const MAX_REQUEST_SIZE: u64 = 150 * 1024 * 1024;

/// What to do when a file already exists at the commit path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Fail on conflict
    Add,
    /// Replace the existing file
    Overwrite,
}

/// Position within an open upload session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadCursor {
    pub session_id: String,
    /// Bytes already committed to the session
    pub offset: u64,
}

/// Destination of a finished upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
    pub path: String,
    pub mode: WriteMode,
    pub autorename: bool,
    pub mute: bool,
}

impl CommitInfo {
    /// Commit to `path` without auto-renaming.
    pub fn new(path: impl Into<String>, mode: WriteMode) -> Self {
        Self {
            path: path.into(),
            mode,
            autorename: false,
            mute: false,
        }
    }
}

/// Operations the transfer manager requires from a remote store.
///
/// Paths are normalized remote paths: "" for the root, otherwise a leading
/// slash and no trailing slash.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Look up a path. `Ok(None)` means nothing exists there.
    async fn metadata(&self, path: &str) -> Result<Option<RemoteEntry>>;

    /// Upload a whole file in one request.
    async fn upload(&self, data: Vec<u8>, commit: &CommitInfo) -> Result<RemoteEntry>;

    /// Open an upload session with optional initial data; returns the session id.
    async fn start_upload_session(&self, data: Vec<u8>) -> Result<String>;

    /// Append a chunk at `cursor.offset`.
    async fn append_upload_session(&self, cursor: &UploadCursor, data: Vec<u8>) -> Result<()>;

    /// Send the final chunk and bind the session's content to `commit.path`.
    async fn finish_upload_session(
        &self,
        cursor: &UploadCursor,
        data: Vec<u8>,
        commit: &CommitInfo,
    ) -> Result<RemoteEntry>;

    /// Download a file (optionally a specific revision) into `dest`.
    ///
    /// Returns the number of bytes written.
    async fn download_to(&self, path: &str, revision: Option<&str>, dest: &Path) -> Result<u64>;

    /// Fetch the first page of a directory listing.
    async fn list_folder(&self, path: &str, recursive: bool) -> Result<ListPage>;

    /// Fetch the page following `cursor`.
    async fn list_folder_continue(&self, cursor: &str) -> Result<ListPage>;

    /// Delete a file, or a directory with everything below it.
    async fn delete(&self, path: &str) -> Result<RemoteEntry>;

    /// Create a directory. With `autorename`, a conflicting name is resolved
    /// by the store instead of failing.
    async fn create_folder(&self, path: &str, autorename: bool) -> Result<RemoteEntry>;

    /// Move a file or directory to a path that does not exist yet.
    async fn move_entry(&self, from: &str, to: &str) -> Result<RemoteEntry>;
}
