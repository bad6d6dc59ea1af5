//! Upload operations.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::AsyncReadExt as _;
use walkdir::WalkDir;

use super::utils::{
    join_remote, local_to_remote_relative, normalize_remote_path, remote_relative,
};
use crate::config::validate_chunk_size;
use crate::error::{Result, TransferError};
use crate::fs::entry::RemoteEntry;
use crate::fs::upload_session::UploadSession;
use crate::manager::TransferManager;
use crate::progress::{Direction, TransferProgress};
use crate::store::{CommitInfo, RemoteStore, WriteMode};

/// Suffix of the sibling directory a replacing directory upload is staged in.
const STAGING_SUFFIX: &str = ".partial";

/// Staging names tried before giving up.
const MAX_STAGING_ATTEMPTS: usize = 100;

/// Options for [`TransferManager::upload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// Descend into subdirectories when uploading a directory
    pub recursive: bool,
    /// Replace whatever already exists at the destination
    pub overwrite: bool,
    /// Request size override; `None` uses the manager's configuration
    pub chunk_size: Option<u64>,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            overwrite: false,
            chunk_size: None,
        }
    }
}

impl<S: RemoteStore> TransferManager<S> {
    /// Upload a local file or directory below `remote_path`.
    ///
    /// A file is uploaded to `remote_path` itself; a directory is uploaded to
    /// `remote_path/<directory name>`.
    ///
    /// # Returns
    /// The remote entries of every uploaded file.
    pub async fn upload<P: AsRef<Path>>(
        &mut self,
        local_path: P,
        remote_path: &str,
        options: &UploadOptions,
    ) -> Result<Vec<RemoteEntry>> {
        let local_path = local_path.as_ref();
        let chunk_size = options.chunk_size.unwrap_or(self.config.chunk_size);

        if local_path.is_file() {
            let entry = self
                .upload_file(local_path, remote_path, options.overwrite, chunk_size)
                .await?;
            Ok(vec![entry])
        } else if local_path.is_dir() {
            self.upload_directory(
                local_path,
                remote_path,
                options.recursive,
                options.overwrite,
                chunk_size,
            )
            .await
        } else {
            Err(TransferError::PathKind(format!(
                "{} is neither a file nor a directory",
                local_path.display()
            )))
        }
    }

    /// Upload a single file to `remote_path`.
    ///
    /// Files up to `chunk_size` bytes go up in one request. Larger files use
    /// an upload session: chunks of exactly `chunk_size` bytes are appended
    /// while more than `chunk_size` bytes remain, and the remainder is sent
    /// with the commit.
    ///
    /// # Arguments
    /// * `local_path` - File to upload
    /// * `remote_path` - Full remote path of the new file
    /// * `overwrite` - Replace an existing remote entry instead of failing
    /// * `chunk_size` - Bytes per request (at most 150 MiB)
    pub async fn upload_file<P: AsRef<Path>>(
        &mut self,
        local_path: P,
        remote_path: &str,
        overwrite: bool,
        chunk_size: u64,
    ) -> Result<RemoteEntry> {
        let local_path = local_path.as_ref();
        validate_chunk_size(chunk_size)?;

        let remote = normalize_remote_path(remote_path);
        if remote.is_empty() {
            return Err(TransferError::PathKind(
                "cannot upload a file to the root directory".to_string(),
            ));
        }

        let size = match tokio::fs::metadata(local_path).await {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => {
                return Err(TransferError::NotFound(format!(
                    "local file {} does not exist",
                    local_path.display()
                )));
            }
        };

        if !overwrite && self.store().metadata(&remote).await?.is_some() {
            return Err(TransferError::Conflict(format!(
                "{} already exists and overwrite is not set",
                remote
            )));
        }

        let mode = if overwrite {
            WriteMode::Overwrite
        } else {
            WriteMode::Add
        };

        tracing::info!(local = %local_path.display(), remote = %remote, size, "uploading file");

        let mut file = File::open(local_path).await?;

        if size <= chunk_size {
            let mut data = Vec::with_capacity(size as usize);
            file.read_to_end(&mut data).await?;
            let sent = data.len() as u64;

            let entry = self
                .store()
                .upload(data, &CommitInfo::new(remote.as_str(), mode))
                .await?;
            self.report(TransferProgress::new(sent, size, &remote, Direction::Upload));
            return Ok(entry);
        }

        let session_id = self.store().start_upload_session(Vec::new()).await?;
        let mut session = UploadSession::new(session_id, remote.as_str());
        tracing::debug!(session = session.session_id(), "opened upload session");

        while size.saturating_sub(session.offset()) > chunk_size {
            let chunk = read_chunk(&mut file, chunk_size).await?;
            if chunk.is_empty() {
                tracing::warn!(local = %local_path.display(), "file shrank during upload");
                break;
            }
            let len = chunk.len() as u64;

            self.store()
                .append_upload_session(&session.cursor(), chunk)
                .await?;
            session.advance(len);

            tracing::debug!(offset = session.offset(), size, "appended chunk");
            self.report(TransferProgress::new(
                session.offset(),
                size,
                &remote,
                Direction::Upload,
            ));
        }

        let rest = read_chunk(&mut file, chunk_size).await?;
        let done = session.offset() + rest.len() as u64;
        let (cursor, commit) = session.into_commit(mode);

        let entry = self
            .store()
            .finish_upload_session(&cursor, rest, &commit)
            .await?;
        self.report(TransferProgress::new(done, size, &remote, Direction::Upload));

        Ok(entry)
    }

    /// Upload a directory to `remote_path/<directory name>`.
    ///
    /// Replacing an existing destination is staged: the tree is uploaded to
    /// an unused sibling such as `<destination>.partial` first, and only once
    /// every file is up is the old destination deleted and the staged copy
    /// moved into its place.
    ///
    /// # Arguments
    /// * `local_path` - Directory to upload
    /// * `remote_path` - Remote parent directory
    /// * `recursive` - Include subdirectories; otherwise top-level files only
    /// * `overwrite` - Replace an existing destination instead of failing
    /// * `chunk_size` - Bytes per request for each file
    pub async fn upload_directory<P: AsRef<Path>>(
        &mut self,
        local_path: P,
        remote_path: &str,
        recursive: bool,
        overwrite: bool,
        chunk_size: u64,
    ) -> Result<Vec<RemoteEntry>> {
        let local_path = local_path.as_ref();
        validate_chunk_size(chunk_size)?;

        if !local_path.is_dir() {
            return Err(TransferError::NotFound(format!(
                "local directory {} does not exist",
                local_path.display()
            )));
        }

        let name = directory_name(local_path).await?;
        let destination = join_remote(&normalize_remote_path(remote_path), &name);

        let existing = self.store().metadata(&destination).await?;
        if existing.is_some() && !overwrite {
            return Err(TransferError::Conflict(format!(
                "{} already exists and overwrite is not set",
                destination
            )));
        }

        let files = local_files(local_path, recursive)?;
        let staged = existing.is_some();
        let target = if staged {
            self.free_staging_path(&destination).await?
        } else {
            destination.clone()
        };

        tracing::info!(
            local = %local_path.display(),
            remote = %destination,
            files = files.len(),
            staged,
            "uploading directory"
        );

        let mut uploaded = Vec::with_capacity(files.len());
        for file in &files {
            let relative = file.strip_prefix(local_path).unwrap_or(file);
            let remote_file = join_remote(&target, &local_to_remote_relative(relative));
            uploaded.push(self.upload_file(file, &remote_file, true, chunk_size).await?);
        }

        if !staged {
            return Ok(uploaded);
        }

        self.delete_if_exists(&destination).await?;
        if uploaded.is_empty() {
            // Nothing was staged, so there is nothing to move.
            return Ok(uploaded);
        }
        self.store().move_entry(&target, &destination).await?;
        tracing::debug!(from = %target, to = %destination, "swapped staged upload into place");

        Ok(uploaded
            .into_iter()
            .map(|entry| match remote_relative(&target, &entry.path) {
                Some(relative) => {
                    RemoteEntry::file(join_remote(&destination, relative), entry.size, entry.rev)
                }
                None => entry,
            })
            .collect())
    }

    /// First unused sibling of `destination` to stage a replacement in:
    /// `<destination>.partial`, then `.partial-2`, `.partial-3` and so on.
    /// Existing entries are never touched.
    async fn free_staging_path(&self, destination: &str) -> Result<String> {
        for attempt in 1..=MAX_STAGING_ATTEMPTS {
            let candidate = if attempt == 1 {
                format!("{}{}", destination, STAGING_SUFFIX)
            } else {
                format!("{}{}-{}", destination, STAGING_SUFFIX, attempt)
            };
            if self.store().metadata(&candidate).await?.is_none() {
                return Ok(candidate);
            }
            tracing::debug!(path = %candidate, "staging path taken");
        }
        Err(TransferError::Conflict(format!(
            "no free staging path next to {}",
            destination
        )))
    }
}

/// Read up to `limit` bytes, stopping early only at end of file.
async fn read_chunk(file: &mut File, limit: u64) -> Result<Vec<u8>> {
    let mut chunk = Vec::with_capacity(limit as usize);
    file.take(limit).read_to_end(&mut chunk).await?;
    Ok(chunk)
}

/// Name of a local directory, resolving paths like `.` that have none.
async fn directory_name(path: &Path) -> Result<String> {
    if let Some(name) = path.file_name() {
        return Ok(name.to_string_lossy().into_owned());
    }
    tokio::fs::canonicalize(path)
        .await?
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            TransferError::PathKind(format!("{} has no directory name", path.display()))
        })
}

/// Files below `root`, sorted by path. Symlinked directories are not followed;
/// symlinks to regular files are included.
fn local_files(root: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
    {
        let entry = entry.map_err(std::io::Error::from)?;
        let file_type = entry.file_type();
        if file_type.is_file() || (file_type.is_symlink() && entry.path().is_file()) {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}
