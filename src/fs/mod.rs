//! Remote entries and the transfer operations built on them.

mod entry;
pub(crate) mod operations;
mod upload_session;

pub use entry::{EntryKind, ListPage, RemoteEntry};
pub use operations::{ConflictPolicy, DownloadOptions, UploadOptions};
pub use upload_session::UploadSession;
