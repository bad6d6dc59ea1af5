//! Transfer operations split into focused modules.

mod browse;
mod dir_ops;
mod download;
mod upload;
mod utils;

pub use dir_ops::ConflictPolicy;
pub use download::DownloadOptions;
pub use upload::UploadOptions;
