//! # dbx-transfer
//!
//! Move files and directory trees between a local filesystem and Dropbox.
//!
//! ## Features
//!
//! - **Uploads**: single files or whole directories (optionally recursive).
//!   - Files larger than the chunk size go up through an upload session in
//!     fixed-size chunks, staying under the 150 MiB request ceiling.
//!   - Replacing an existing remote directory is staged next to it and swapped
//!     in only after every file is uploaded.
//! - **Downloads**: single files (optionally a specific revision) or whole
//!   directories, streamed to disk.
//! - **Remote management**: paged listings, directory creation with a conflict
//!   policy, file and directory removal.
//! - **Progress tracking** with custom callbacks.
//! - **Configuration**: chunk size, page limit and remote aliases from a TOML
//!   file, validated when loaded.
//!
//! All operations go through the [`RemoteStore`](store::RemoteStore) trait.
//! [`DropboxStore`](store::DropboxStore) talks to the Dropbox v2 API and
//! [`MemoryStore`](store::MemoryStore) keeps everything in memory.
//!
//! ## Example: Basic Usage
//!
//! ```no_run
//! use dbx_transfer::credentials::EnvToken;
//! use dbx_transfer::store::DropboxStore;
//! use dbx_transfer::{ConflictPolicy, DownloadOptions, TransferManager, UploadOptions};
//!
//! # async fn example() -> dbx_transfer::Result<()> {
//! // Token from $DROPBOX_TOKEN
//! let store = DropboxStore::connect(&EnvToken::default())?;
//! let mut manager = TransferManager::new(store);
//!
//! manager.make_directory("/Backups", ConflictPolicy::None).await?;
//!
//! // Uploads ./photos to /Backups/photos
//! manager.upload("photos", "/Backups", &UploadOptions::default()).await?;
//!
//! for (index, names) in manager.list_directory_names("/Backups/photos", 0, false).await? {
//!     println!("page {}: {:?}", index, names);
//! }
//!
//! // Downloads /Backups/photos to ./restore/photos
//! let options = DownloadOptions {
//!     recursive: true,
//!     ..Default::default()
//! };
//! manager.download("restore", "/Backups/photos", &options).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod credentials;
pub mod error;
pub mod fs;
pub mod http;
pub mod manager;
pub mod progress;
pub mod store;

// Re-export commonly used types
pub use config::{RemoteAliases, Settings, TransferConfig};
pub use error::{Result, TransferError};
pub use fs::{ConflictPolicy, DownloadOptions, EntryKind, RemoteEntry, UploadOptions};
pub use manager::TransferManager;
pub use progress::{Direction, ProgressCallback, TransferProgress};
