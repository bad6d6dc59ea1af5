//! Existence checks and directory listings.

use std::collections::BTreeMap;

use super::utils::normalize_remote_path;
use crate::error::{Result, TransferError};
use crate::fs::entry::{ListPage, RemoteEntry};
use crate::manager::TransferManager;
use crate::store::RemoteStore;

impl<S: RemoteStore> TransferManager<S> {
    /// Check whether a remote file exists at `remote_path`.
    pub async fn file_exists(&self, remote_path: &str) -> Result<bool> {
        let remote = normalize_remote_path(remote_path);
        if remote.is_empty() {
            return Ok(false);
        }
        Ok(self
            .store()
            .metadata(&remote)
            .await?
            .is_some_and(|entry| entry.is_file()))
    }

    /// Check whether a remote directory exists at `remote_path`.
    ///
    /// The root always exists.
    pub async fn directory_exists(&self, remote_path: &str) -> Result<bool> {
        let remote = normalize_remote_path(remote_path);
        if remote.is_empty() {
            return Ok(true);
        }
        Ok(self
            .store()
            .metadata(&remote)
            .await?
            .is_some_and(|entry| entry.is_directory()))
    }

    /// List a remote directory page by page.
    ///
    /// The first page is always fetched. Further pages are fetched while the
    /// store reports more and fewer than `page_limit` extra pages have been
    /// read, so at most `page_limit + 1` pages come back.
    ///
    /// # Arguments
    /// * `remote_path` - Directory to list
    /// * `page_limit` - Extra pages to fetch after the first one
    /// * `recursive` - Include everything below the directory
    ///
    /// # Returns
    /// Pages keyed by index, starting at 0.
    pub async fn list_directory(
        &self,
        remote_path: &str,
        page_limit: usize,
        recursive: bool,
    ) -> Result<BTreeMap<usize, Vec<RemoteEntry>>> {
        let pages = self.fetch_pages(remote_path, page_limit, recursive).await?;
        Ok(pages
            .into_iter()
            .map(|(index, page)| (index, page.entries))
            .collect())
    }

    /// Like [`list_directory`](Self::list_directory), but only entry names.
    pub async fn list_directory_names(
        &self,
        remote_path: &str,
        page_limit: usize,
        recursive: bool,
    ) -> Result<BTreeMap<usize, Vec<String>>> {
        let pages = self.fetch_pages(remote_path, page_limit, recursive).await?;
        Ok(pages
            .into_iter()
            .map(|(index, page)| (index, page.names()))
            .collect())
    }

    /// Fetch up to `page_limit + 1` pages. The last page keeps its `has_more`
    /// flag, so callers can tell when the listing was cut short.
    pub(crate) async fn fetch_pages(
        &self,
        remote_path: &str,
        page_limit: usize,
        recursive: bool,
    ) -> Result<BTreeMap<usize, ListPage>> {
        let remote = normalize_remote_path(remote_path);
        if !self.directory_exists(&remote).await? {
            return Err(TransferError::NotFound(format!(
                "remote directory {} does not exist",
                remote_path
            )));
        }

        let mut pages = BTreeMap::new();
        let mut page = self.store().list_folder(&remote, recursive).await?;
        let mut index = 0;

        loop {
            let has_more = page.has_more;
            let cursor = page.cursor.clone();
            tracing::debug!(
                path = %remote,
                index,
                entries = page.entries.len(),
                has_more,
                "listed page"
            );
            pages.insert(index, page);

            if !has_more || index >= page_limit {
                break;
            }
            index += 1;
            page = self.store().list_folder_continue(&cursor).await?;
        }

        Ok(pages)
    }
}
