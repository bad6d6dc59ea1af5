//! Download operations.

use std::path::{Path, PathBuf};

use super::utils::{
    normalize_remote_path, remote_basename, remote_relative, remote_to_local,
};
use crate::error::{Result, TransferError};
use crate::manager::TransferManager;
use crate::progress::{Direction, TransferProgress};
use crate::store::RemoteStore;

/// Options for [`TransferManager::download`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadOptions {
    /// Fetch this revision instead of the latest (file downloads only)
    pub revision: Option<String>,
    /// Replace existing local files or a non-empty destination directory
    pub overwrite: bool,
    /// Include subdirectories when downloading a directory
    pub recursive: bool,
    /// Extra listing pages to fetch after the first one; `None` uses the
    /// manager's configuration
    pub page_limit: Option<usize>,
}

impl<S: RemoteStore> TransferManager<S> {
    /// Download into an existing local file or directory.
    ///
    /// When `local_path` is a file, `remote_path` is downloaded over it. When
    /// it is a directory, the remote directory is downloaded to
    /// `local_path/<remote directory name>`.
    ///
    /// # Returns
    /// The local paths that were written.
    pub async fn download<P: AsRef<Path>>(
        &mut self,
        local_path: P,
        remote_path: &str,
        options: &DownloadOptions,
    ) -> Result<Vec<PathBuf>> {
        let local_path = local_path.as_ref();

        if local_path.is_file() {
            self.download_file(
                remote_path,
                local_path,
                options.revision.as_deref(),
                options.overwrite,
            )
            .await?;
            Ok(vec![local_path.to_path_buf()])
        } else if local_path.is_dir() {
            let page_limit = options.page_limit.unwrap_or(self.config.page_limit);
            self.download_directory(
                remote_path,
                local_path,
                options.recursive,
                page_limit,
                options.overwrite,
            )
            .await
        } else {
            Err(TransferError::PathKind(format!(
                "{} is neither a file nor a directory",
                local_path.display()
            )))
        }
    }

    /// Download a remote file to `local_path`.
    ///
    /// Missing parent directories are created. Content is streamed to disk.
    ///
    /// # Arguments
    /// * `remote_path` - File to download
    /// * `local_path` - Where to write it
    /// * `revision` - A specific revision id, or `None` for the latest
    /// * `overwrite` - Replace an existing local file instead of failing
    ///
    /// # Returns
    /// Number of bytes written.
    pub async fn download_file<P: AsRef<Path>>(
        &mut self,
        remote_path: &str,
        local_path: P,
        revision: Option<&str>,
        overwrite: bool,
    ) -> Result<u64> {
        let local_path = local_path.as_ref();
        let remote = normalize_remote_path(remote_path);

        if !self.file_exists(&remote).await? {
            return Err(TransferError::NotFound(format!(
                "remote file {} does not exist",
                display_remote(&remote)
            )));
        }

        if local_path.is_file() && !overwrite {
            return Err(TransferError::Conflict(format!(
                "{} already exists and overwrite is not set",
                local_path.display()
            )));
        }

        if let Some(parent) = local_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        tracing::info!(
            remote = %remote,
            local = %local_path.display(),
            ?revision,
            "downloading file"
        );

        let written = self.store().download_to(&remote, revision, local_path).await?;
        self.report(TransferProgress::new(
            written,
            written,
            &remote,
            Direction::Download,
        ));

        Ok(written)
    }

    /// Download a remote directory to `local_path/<remote directory name>`.
    ///
    /// The destination is cleared first. Entries returned by the store are
    /// mapped to local paths by stripping the remote directory prefix, compared
    /// case-insensitively.
    ///
    /// # Arguments
    /// * `remote_path` - Directory to download
    /// * `local_path` - Existing local parent directory
    /// * `recursive` - Include subdirectories
    /// * `page_limit` - Extra listing pages to fetch after the first one
    /// * `overwrite` - Replace a non-empty destination instead of failing
    pub async fn download_directory<P: AsRef<Path>>(
        &mut self,
        remote_path: &str,
        local_path: P,
        recursive: bool,
        page_limit: usize,
        overwrite: bool,
    ) -> Result<Vec<PathBuf>> {
        let local_path = local_path.as_ref();
        let remote = normalize_remote_path(remote_path);

        let name = remote_basename(&remote);
        if name.is_empty() {
            return Err(TransferError::PathKind(
                "the root directory has no name to download into".to_string(),
            ));
        }
        let destination = local_path.join(name);

        if !self.directory_exists(&remote).await? {
            return Err(TransferError::NotFound(format!(
                "remote directory {} does not exist",
                remote
            )));
        }

        if !overwrite {
            if let Some(reason) = occupied(&destination).await? {
                return Err(TransferError::Conflict(format!(
                    "{} {} and overwrite is not set",
                    destination.display(),
                    reason
                )));
            }
        }

        clear_destination(&destination).await?;
        tokio::fs::create_dir_all(&destination).await?;

        let pages = self.fetch_pages(&remote, page_limit, recursive).await?;
        if pages.values().next_back().is_some_and(|page| page.has_more) {
            tracing::warn!(
                remote = %remote,
                page_limit,
                "listing has more pages than the page limit; download is incomplete"
            );
        }
        let files: Vec<_> = pages
            .into_values()
            .flat_map(|page| page.entries)
            .filter(|entry| entry.is_file())
            .collect();

        tracing::info!(
            remote = %remote,
            local = %destination.display(),
            files = files.len(),
            "downloading directory"
        );

        let mut written = Vec::with_capacity(files.len());
        for entry in files {
            let Some(relative) = remote_relative(&remote, &entry.path) else {
                tracing::warn!(path = %entry.path, "skipping entry outside the directory");
                continue;
            };
            let target = remote_to_local(&destination, relative);
            self.download_file(&entry.path, &target, None, true).await?;
            written.push(target);
        }

        Ok(written)
    }
}

fn display_remote(path: &str) -> &str {
    if path.is_empty() { "/" } else { path }
}

/// Why `path` cannot be reused without overwriting: it is something other
/// than a directory, or a directory with content. `None` when free.
async fn occupied(path: &Path) -> Result<Option<&'static str>> {
    let meta = match tokio::fs::symlink_metadata(path).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if !meta.is_dir() {
        return Ok(Some("exists and is not a directory"));
    }
    let mut entries = tokio::fs::read_dir(path).await?;
    if entries.next_entry().await?.is_some() {
        return Ok(Some("is not empty"));
    }
    Ok(None)
}

async fn clear_destination(path: &Path) -> Result<()> {
    match tokio::fs::symlink_metadata(path).await {
        Ok(meta) if meta.is_dir() => tokio::fs::remove_dir_all(path).await?,
        Ok(_) => tokio::fs::remove_file(path).await?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
