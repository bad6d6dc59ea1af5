//! In-process remote store.
//!
//! Mirrors the Dropbox semantics the transfer manager depends on: paths are
//! case-insensitive, uploads create missing parent folders, recursive
//! listings start with the listed folder itself, and upload sessions reject
//! appends at the wrong offset.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{CommitInfo, MAX_REQUEST_SIZE, RemoteStore, UploadCursor, WriteMode};
use crate::api::ApiErrorKind;
use crate::error::{Result, TransferError};
use crate::fs::{EntryKind, ListPage, RemoteEntry};

const DEFAULT_PAGE_SIZE: usize = 500;

/// Number of calls made per store operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub uploads: usize,
    pub session_starts: usize,
    pub session_appends: usize,
    pub session_finishes: usize,
    pub downloads: usize,
    pub list_pages: usize,
    pub deletes: usize,
    pub folders_created: usize,
    pub moves: usize,
}

#[derive(Debug, Clone)]
struct StoredEntry {
    path: String,
    kind: EntryKind,
    data: Vec<u8>,
    rev: Option<String>,
}

impl StoredEntry {
    fn to_entry(&self) -> RemoteEntry {
        match self.kind {
            EntryKind::File => {
                RemoteEntry::file(self.path.clone(), self.data.len() as u64, self.rev.clone())
            }
            EntryKind::Directory => RemoteEntry::directory(self.path.clone()),
        }
    }
}

#[derive(Debug, Default)]
struct UploadSessionState {
    data: Vec<u8>,
}

#[derive(Debug)]
struct ListingCursor {
    entries: Vec<RemoteEntry>,
    position: usize,
}

#[derive(Debug, Default)]
struct State {
    /// Keyed by lower-cased path
    entries: BTreeMap<String, StoredEntry>,
    /// Every committed revision of every file: rev -> (lower path, content)
    revisions: HashMap<String, (String, Vec<u8>)>,
    sessions: HashMap<String, UploadSessionState>,
    cursors: HashMap<String, ListingCursor>,
    next_id: u64,
    counts: CallCounts,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn get(&self, path: &str) -> Option<&StoredEntry> {
        self.entries.get(&path.to_lowercase())
    }

    fn is_directory(&self, path: &str) -> bool {
        path.is_empty() || self.get(path).is_some_and(|e| e.kind == EntryKind::Directory)
    }

    /// Create missing ancestors of `path` as folders.
    fn ensure_parents(&mut self, path: &str) -> Result<()> {
        let mut prefix_end = 0;
        let components: Vec<&str> = path.split('/').skip(1).collect();
        for component in components.iter().take(components.len().saturating_sub(1)) {
            prefix_end += component.len() + 1;
            let ancestor = &path[..prefix_end];
            match self.get(ancestor) {
                Some(existing) if existing.kind == EntryKind::File => {
                    return Err(api_error("path/conflict/file/"));
                }
                Some(_) => {}
                None => {
                    self.entries.insert(
                        ancestor.to_lowercase(),
                        StoredEntry {
                            path: ancestor.to_string(),
                            kind: EntryKind::Directory,
                            data: Vec::new(),
                            rev: None,
                        },
                    );
                }
            }
        }
        Ok(())
    }

    fn commit_file(&mut self, commit: &CommitInfo, data: Vec<u8>) -> Result<RemoteEntry> {
        validate_path(&commit.path)?;

        let mut path = commit.path.clone();
        if let Some(existing) = self.get(&path) {
            let conflict = match (existing.kind, commit.mode) {
                (EntryKind::Directory, _) => true,
                (EntryKind::File, WriteMode::Add) => existing.data != data,
                (EntryKind::File, WriteMode::Overwrite) => false,
            };
            if conflict {
                if !commit.autorename {
                    return Err(api_error("path/conflict/file/"));
                }
                path = self.free_name(&path);
            }
        }
        self.ensure_parents(&path)?;

        let rev = format!("{:09x}", self.next_id());
        self.revisions
            .insert(rev.clone(), (path.to_lowercase(), data.clone()));
        let stored = StoredEntry {
            path: path.clone(),
            kind: EntryKind::File,
            data,
            rev: Some(rev),
        };
        let entry = stored.to_entry();
        self.entries.insert(path.to_lowercase(), stored);
        Ok(entry)
    }

    /// First "name (n)" variant of `path` that is not taken.
    fn free_name(&self, path: &str) -> String {
        let (parent, name) = match path.rfind('/') {
            Some(idx) => (&path[..idx], &path[idx + 1..]),
            None => ("", path),
        };
        let (stem, ext) = match name.rfind('.') {
            Some(idx) if idx > 0 => (&name[..idx], &name[idx..]),
            _ => (name, ""),
        };
        (1..)
            .map(|n| format!("{}/{} ({}){}", parent, stem, n, ext))
            .find(|candidate| self.get(candidate).is_none())
            .unwrap_or_else(|| path.to_string())
    }

    /// Lower-cased keys of `path` and everything below it.
    fn subtree_keys(&self, path: &str) -> Vec<String> {
        let key = path.to_lowercase();
        let prefix = format!("{}/", key);
        self.entries
            .keys()
            .filter(|k| **k == key || k.starts_with(&prefix))
            .cloned()
            .collect()
    }
}

fn api_error(summary: &str) -> TransferError {
    TransferError::Api {
        kind: ApiErrorKind::from(summary),
        summary: summary.to_string(),
    }
}

fn validate_path(path: &str) -> Result<()> {
    if !path.starts_with('/') || path.ends_with('/') || path.contains("//") {
        return Err(api_error("path/malformed_path/"));
    }
    Ok(())
}

fn check_request_size(data: &[u8]) -> Result<()> {
    if data.len() as u64 > MAX_REQUEST_SIZE {
        return Err(TransferError::HttpError(413));
    }
    Ok(())
}

/// In-memory implementation of [`RemoteStore`].
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<State>,
    page_size: usize,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Create an empty store that returns at most `page_size` entries per listing page.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            state: Mutex::new(State::default()),
            page_size: page_size.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed a file without counting it as an upload.
    pub fn insert_file(&self, path: &str, data: impl Into<Vec<u8>>) -> Result<RemoteEntry> {
        let mut state = self.lock();
        state.commit_file(&CommitInfo::new(path, WriteMode::Overwrite), data.into())
    }

    /// Seed a folder (and its parents) without counting it as a create call.
    pub fn insert_folder(&self, path: &str) -> Result<RemoteEntry> {
        validate_path(path)?;
        let mut state = self.lock();
        state.ensure_parents(path)?;
        let stored = StoredEntry {
            path: path.to_string(),
            kind: EntryKind::Directory,
            data: Vec::new(),
            rev: None,
        };
        let entry = stored.to_entry();
        state.entries.entry(path.to_lowercase()).or_insert(stored);
        Ok(entry)
    }

    /// Current content of the file at `path`.
    pub fn file_content(&self, path: &str) -> Option<Vec<u8>> {
        self.lock()
            .get(path)
            .filter(|e| e.kind == EntryKind::File)
            .map(|e| e.data.clone())
    }

    /// Whether anything exists at `path`.
    pub fn contains(&self, path: &str) -> bool {
        path.is_empty() || self.lock().get(path).is_some()
    }

    /// Display paths of all files, sorted.
    pub fn file_paths(&self) -> Vec<String> {
        self.lock()
            .entries
            .values()
            .filter(|e| e.kind == EntryKind::File)
            .map(|e| e.path.clone())
            .collect()
    }

    /// Calls made so far.
    pub fn counts(&self) -> CallCounts {
        self.lock().counts
    }

    fn next_page(&self, state: &mut State, cursor_id: &str) -> Result<ListPage> {
        let cursor = state
            .cursors
            .get_mut(cursor_id)
            .ok_or_else(|| api_error("reset/"))?;

        let end = (cursor.position + self.page_size).min(cursor.entries.len());
        let entries = cursor.entries[cursor.position..end].to_vec();
        cursor.position = end;
        let has_more = end < cursor.entries.len();

        state.counts.list_pages += 1;
        Ok(ListPage {
            entries,
            cursor: cursor_id.to_string(),
            has_more,
        })
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn metadata(&self, path: &str) -> Result<Option<RemoteEntry>> {
        if path.is_empty() {
            return Ok(Some(RemoteEntry::directory("")));
        }
        Ok(self.lock().get(path).map(StoredEntry::to_entry))
    }

    async fn upload(&self, data: Vec<u8>, commit: &CommitInfo) -> Result<RemoteEntry> {
        check_request_size(&data)?;
        let mut state = self.lock();
        state.counts.uploads += 1;
        state.commit_file(commit, data)
    }

    async fn start_upload_session(&self, data: Vec<u8>) -> Result<String> {
        check_request_size(&data)?;
        let mut state = self.lock();
        state.counts.session_starts += 1;
        let id = format!("session-{}", state.next_id());
        state.sessions.insert(id.clone(), UploadSessionState { data });
        Ok(id)
    }

    async fn append_upload_session(&self, cursor: &UploadCursor, data: Vec<u8>) -> Result<()> {
        check_request_size(&data)?;
        let mut state = self.lock();
        state.counts.session_appends += 1;
        let session = state
            .sessions
            .get_mut(&cursor.session_id)
            .ok_or_else(|| api_error("lookup_failed/not_found/"))?;
        if session.data.len() as u64 != cursor.offset {
            return Err(api_error("lookup_failed/incorrect_offset/"));
        }
        session.data.extend_from_slice(&data);
        Ok(())
    }

    async fn finish_upload_session(
        &self,
        cursor: &UploadCursor,
        data: Vec<u8>,
        commit: &CommitInfo,
    ) -> Result<RemoteEntry> {
        check_request_size(&data)?;
        let mut state = self.lock();
        state.counts.session_finishes += 1;
        let session = state
            .sessions
            .get(&cursor.session_id)
            .ok_or_else(|| api_error("lookup_failed/not_found/"))?;
        if session.data.len() as u64 != cursor.offset {
            return Err(api_error("lookup_failed/incorrect_offset/"));
        }

        let mut content = session.data.clone();
        content.extend_from_slice(&data);
        let entry = state.commit_file(commit, content)?;
        state.sessions.remove(&cursor.session_id);
        Ok(entry)
    }

    async fn download_to(&self, path: &str, revision: Option<&str>, dest: &Path) -> Result<u64> {
        let data = {
            let mut state = self.lock();
            state.counts.downloads += 1;
            match revision {
                Some(rev) => {
                    let (owner, data) = state
                        .revisions
                        .get(rev)
                        .ok_or_else(|| api_error("path/not_found/"))?;
                    if *owner != path.to_lowercase() {
                        return Err(api_error("path/not_found/"));
                    }
                    data.clone()
                }
                None => {
                    let entry = state.get(path).ok_or_else(|| api_error("path/not_found/"))?;
                    if entry.kind != EntryKind::File {
                        return Err(api_error("path/not_file/"));
                    }
                    entry.data.clone()
                }
            }
        };

        tokio::fs::write(dest, &data).await?;
        Ok(data.len() as u64)
    }

    async fn list_folder(&self, path: &str, recursive: bool) -> Result<ListPage> {
        let mut state = self.lock();
        if !state.is_directory(path) {
            return Err(api_error("path/not_found/"));
        }

        let key = path.to_lowercase();
        let prefix = format!("{}/", key);
        let entries: Vec<RemoteEntry> = state
            .entries
            .iter()
            .filter(|(k, _)| {
                if **k == key {
                    return recursive;
                }
                match k.strip_prefix(&prefix) {
                    Some(rest) => recursive || !rest.contains('/'),
                    None => false,
                }
            })
            .map(|(_, e)| e.to_entry())
            .collect();

        let cursor_id = format!("cursor-{}", state.next_id());
        state.cursors.insert(
            cursor_id.clone(),
            ListingCursor {
                entries,
                position: 0,
            },
        );
        self.next_page(&mut state, &cursor_id)
    }

    async fn list_folder_continue(&self, cursor: &str) -> Result<ListPage> {
        let mut state = self.lock();
        self.next_page(&mut state, cursor)
    }

    async fn delete(&self, path: &str) -> Result<RemoteEntry> {
        let mut state = self.lock();
        state.counts.deletes += 1;
        let entry = state
            .get(path)
            .map(StoredEntry::to_entry)
            .ok_or_else(|| api_error("path_lookup/not_found/"))?;
        for key in state.subtree_keys(path) {
            state.entries.remove(&key);
        }
        Ok(entry)
    }

    async fn create_folder(&self, path: &str, autorename: bool) -> Result<RemoteEntry> {
        validate_path(path)?;
        let mut state = self.lock();
        state.counts.folders_created += 1;

        let mut path = path.to_string();
        if state.get(&path).is_some() {
            if !autorename {
                return Err(api_error("path/conflict/folder/"));
            }
            path = state.free_name(&path);
        }
        state.ensure_parents(&path)?;

        let stored = StoredEntry {
            path: path.clone(),
            kind: EntryKind::Directory,
            data: Vec::new(),
            rev: None,
        };
        let entry = stored.to_entry();
        state.entries.insert(path.to_lowercase(), stored);
        Ok(entry)
    }

    async fn move_entry(&self, from: &str, to: &str) -> Result<RemoteEntry> {
        validate_path(to)?;
        let mut state = self.lock();
        state.counts.moves += 1;
        if state.get(from).is_none() {
            return Err(api_error("from_lookup/not_found/"));
        }
        if state.get(to).is_some() {
            return Err(api_error("to/conflict/"));
        }
        state.ensure_parents(to)?;

        let from_len = from.len();
        for key in state.subtree_keys(from) {
            if let Some(mut stored) = state.entries.remove(&key) {
                stored.path = format!("{}{}", to, &stored.path[from_len..]);
                state.entries.insert(stored.path.to_lowercase(), stored);
            }
        }

        state
            .get(to)
            .map(StoredEntry::to_entry)
            .ok_or(TransferError::InvalidResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_creates_parents() {
        let store = MemoryStore::new();
        store
            .upload(b"hi".to_vec(), &CommitInfo::new("/a/b/c.txt", WriteMode::Add))
            .await
            .unwrap();

        assert!(store.metadata("/a").await.unwrap().unwrap().is_directory());
        assert!(store.metadata("/A/B").await.unwrap().unwrap().is_directory());
        assert_eq!(store.file_content("/a/b/c.txt").unwrap(), b"hi");
        assert_eq!(store.counts().uploads, 1);
    }

    #[tokio::test]
    async fn test_add_mode_conflicts() {
        let store = MemoryStore::new();
        store.insert_file("/f.txt", "one").unwrap();

        let err = store
            .upload(b"two".to_vec(), &CommitInfo::new("/f.txt", WriteMode::Add))
            .await
            .unwrap_err();
        assert!(err.is_api(ApiErrorKind::Conflict));

        store
            .upload(b"two".to_vec(), &CommitInfo::new("/f.txt", WriteMode::Overwrite))
            .await
            .unwrap();
        assert_eq!(store.file_content("/f.txt").unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_session_rejects_wrong_offset() {
        let store = MemoryStore::new();
        let id = store.start_upload_session(Vec::new()).await.unwrap();
        let cursor = UploadCursor {
            session_id: id.clone(),
            offset: 0,
        };
        store
            .append_upload_session(&cursor, b"abc".to_vec())
            .await
            .unwrap();

        // Offset still 0, but 3 bytes are committed.
        let err = store
            .append_upload_session(&cursor, b"def".to_vec())
            .await
            .unwrap_err();
        assert!(err.is_api(ApiErrorKind::IncorrectOffset));

        let cursor = UploadCursor {
            session_id: id,
            offset: 3,
        };
        let entry = store
            .finish_upload_session(
                &cursor,
                b"def".to_vec(),
                &CommitInfo::new("/s.bin", WriteMode::Add),
            )
            .await
            .unwrap();
        assert_eq!(entry.size, 6);
        assert_eq!(store.file_content("/s.bin").unwrap(), b"abcdef");
    }

    #[tokio::test]
    async fn test_listing_pages() {
        let store = MemoryStore::with_page_size(2);
        for i in 0..5 {
            store.insert_file(&format!("/d/f{}.txt", i), "x").unwrap();
        }

        let first = store.list_folder("/d", false).await.unwrap();
        assert_eq!(first.entries.len(), 2);
        assert!(first.has_more);

        let second = store.list_folder_continue(&first.cursor).await.unwrap();
        let third = store.list_folder_continue(&second.cursor).await.unwrap();
        assert_eq!(third.entries.len(), 1);
        assert!(!third.has_more);
        assert_eq!(store.counts().list_pages, 3);
    }

    #[tokio::test]
    async fn test_recursive_listing_includes_folder() {
        let store = MemoryStore::new();
        store.insert_file("/d/top.txt", "x").unwrap();
        store.insert_file("/d/sub/deep.txt", "y").unwrap();

        let flat = store.list_folder("/d", false).await.unwrap();
        let names: Vec<_> = flat.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["sub", "top.txt"]);

        let deep = store.list_folder("/d", true).await.unwrap();
        let paths: Vec<_> = deep.entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["/d", "/d/sub", "/d/sub/deep.txt", "/d/top.txt"]);

        let err = store.list_folder("/missing", false).await.unwrap_err();
        assert!(err.is_api(ApiErrorKind::NotFound));
    }

    #[tokio::test]
    async fn test_create_folder_autorename() {
        let store = MemoryStore::new();
        store.create_folder("/x", false).await.unwrap();

        let err = store.create_folder("/x", false).await.unwrap_err();
        assert!(err.is_api(ApiErrorKind::Conflict));

        let renamed = store.create_folder("/x", true).await.unwrap();
        assert_eq!(renamed.path, "/x (1)");
    }

    #[tokio::test]
    async fn test_move_subtree() {
        let store = MemoryStore::new();
        store.insert_file("/tmp/a/b.txt", "b").unwrap();

        store.move_entry("/tmp", "/final").await.unwrap();

        assert!(!store.contains("/tmp"));
        assert_eq!(store.file_content("/final/a/b.txt").unwrap(), b"b");
    }

    #[tokio::test]
    async fn test_download_revision() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new();
        let first = store.insert_file("/r.txt", "v1").unwrap();
        store.insert_file("/r.txt", "v2").unwrap();

        let dest = dir.path().join("r.txt");
        store
            .download_to("/r.txt", first.rev.as_deref(), &dest)
            .await
            .unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"v1");

        store.download_to("/r.txt", None, &dest).await.unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"v2");
    }
}
