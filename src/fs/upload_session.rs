//! Chunked upload session bookkeeping.

use crate::store::{CommitInfo, UploadCursor, WriteMode};

/// An open chunked upload.
///
/// `offset` is the number of bytes the store has accepted for this session.
/// It only moves forward, and only by the length of a chunk that was sent.
#[derive(Debug)]
pub struct UploadSession {
    session_id: String,
    offset: u64,
    destination: String,
}

impl UploadSession {
    /// Track a session the store just opened (nothing committed yet).
    pub fn new(session_id: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            offset: 0,
            destination: destination.into(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Bytes committed so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Cursor for the next append or the finish call.
    pub fn cursor(&self) -> UploadCursor {
        UploadCursor {
            session_id: self.session_id.clone(),
            offset: self.offset,
        }
    }

    /// Record that the store accepted `len` more bytes.
    pub fn advance(&mut self, len: u64) {
        self.offset += len;
    }

    /// Close the bookkeeping and produce the final cursor and commit.
    pub fn into_commit(self, mode: WriteMode) -> (UploadCursor, CommitInfo) {
        let cursor = self.cursor();
        (cursor, CommitInfo::new(self.destination, mode))
    }
}
