//! Removal and directory creation.

use std::fmt;
use std::str::FromStr;

use super::utils::normalize_remote_path;
use crate::api::ApiErrorKind;
use crate::error::{Result, TransferError};
use crate::fs::entry::RemoteEntry;
use crate::manager::TransferManager;
use crate::store::RemoteStore;

/// What [`TransferManager::make_directory`] does when the path is taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Fail with a conflict error
    #[default]
    None,
    /// Delete whatever is there, then create the directory
    Overwrite,
    /// Let the store pick a free name
    Autorename,
}

impl FromStr for ConflictPolicy {
    type Err = TransferError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(ConflictPolicy::None),
            "overwrite" => Ok(ConflictPolicy::Overwrite),
            "autorename" => Ok(ConflictPolicy::Autorename),
            other => Err(TransferError::Config(format!(
                "unknown conflict policy {:?}: expected none, overwrite or autorename",
                other
            ))),
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConflictPolicy::None => "none",
            ConflictPolicy::Overwrite => "overwrite",
            ConflictPolicy::Autorename => "autorename",
        };
        f.write_str(name)
    }
}

impl<S: RemoteStore> TransferManager<S> {
    /// Remove a remote file or directory.
    ///
    /// # Arguments
    /// * `remote_path` - Path to remove
    /// * `recursive` - Allow removing a non-empty directory
    pub async fn remove(&mut self, remote_path: &str, recursive: bool) -> Result<()> {
        let remote = normalize_remote_path(remote_path);
        match self.store().metadata(&remote).await? {
            Some(entry) if entry.is_file() => self.remove_file(&remote).await,
            Some(_) => self.remove_directory(&remote, recursive).await,
            None => Err(TransferError::PathKind(format!(
                "{} is neither a file nor a directory",
                remote_path
            ))),
        }
    }

    /// Remove a remote file.
    pub async fn remove_file(&mut self, remote_path: &str) -> Result<()> {
        let remote = normalize_remote_path(remote_path);
        if !self.file_exists(&remote).await? {
            return Err(TransferError::NotFound(format!(
                "remote file {} does not exist",
                remote_path
            )));
        }

        tracing::info!(path = %remote, "removing file");
        self.store().delete(&remote).await?;
        Ok(())
    }

    /// Remove a remote directory.
    ///
    /// A non-empty directory is only removed when `recursive` is set.
    pub async fn remove_directory(&mut self, remote_path: &str, recursive: bool) -> Result<()> {
        let remote = normalize_remote_path(remote_path);
        if remote.is_empty() {
            return Err(TransferError::PathKind(
                "the root directory cannot be removed".to_string(),
            ));
        }
        if !self.directory_exists(&remote).await? {
            return Err(TransferError::NotFound(format!(
                "remote directory {} does not exist",
                remote
            )));
        }

        if !recursive {
            let first = self.store().list_folder(&remote, false).await?;
            if !first.entries.is_empty() {
                return Err(TransferError::Conflict(format!(
                    "{} is not empty and recursive is not set",
                    remote
                )));
            }
        }

        tracing::info!(path = %remote, recursive, "removing directory");
        self.store().delete(&remote).await?;
        Ok(())
    }

    /// Delete a remote file or directory if one exists at `remote_path`.
    ///
    /// # Returns
    /// `true` when something was deleted, `false` when nothing was there.
    pub async fn delete_if_exists(&mut self, remote_path: &str) -> Result<bool> {
        let remote = normalize_remote_path(remote_path);
        if remote.is_empty() {
            return Err(TransferError::PathKind(
                "the root directory cannot be removed".to_string(),
            ));
        }
        if self.store().metadata(&remote).await?.is_none() {
            return Ok(false);
        }

        match self.store().delete(&remote).await {
            Ok(_) => {
                tracing::debug!(path = %remote, "deleted existing entry");
                Ok(true)
            }
            // Removed by someone else between the lookup and the delete.
            Err(e) if e.is_api(ApiErrorKind::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Create a remote directory.
    ///
    /// # Arguments
    /// * `remote_path` - Directory to create; missing parents are created too
    /// * `policy` - What to do when the path is already taken
    ///
    /// # Returns
    /// The created directory, whose path differs from `remote_path` when the
    /// store renamed it.
    pub async fn make_directory(
        &mut self,
        remote_path: &str,
        policy: ConflictPolicy,
    ) -> Result<RemoteEntry> {
        let remote = normalize_remote_path(remote_path);
        if remote.is_empty() {
            return Err(TransferError::Conflict(
                "the root directory already exists".to_string(),
            ));
        }

        match policy {
            ConflictPolicy::None => {
                if self.directory_exists(&remote).await? {
                    return Err(TransferError::Conflict(format!(
                        "directory {} already exists",
                        remote
                    )));
                }
            }
            ConflictPolicy::Overwrite => {
                self.delete_if_exists(&remote).await?;
            }
            ConflictPolicy::Autorename => {}
        }

        tracing::info!(path = %remote, %policy, "creating directory");
        self.store()
            .create_folder(&remote, policy == ConflictPolicy::Autorename)
            .await
            .map_err(|e| {
                if e.is_api(ApiErrorKind::Conflict) {
                    TransferError::Conflict(format!("{} is already taken", remote))
                } else {
                    e
                }
            })
    }
}
