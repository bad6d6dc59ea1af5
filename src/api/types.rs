//! Wire types for the Dropbox v2 files endpoints.

use serde::{Deserialize, Serialize};

use crate::fs::{ListPage, RemoteEntry};
use crate::store::{CommitInfo, UploadCursor};

#[derive(Debug, Serialize)]
pub(crate) struct PathArg<'a> {
    pub path: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ListFolderArg<'a> {
    pub path: &'a str,
    pub recursive: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ListFolderContinueArg<'a> {
    pub cursor: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateFolderArg<'a> {
    pub path: &'a str,
    pub autorename: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct RelocationArg<'a> {
    pub from_path: &'a str,
    pub to_path: &'a str,
    pub autorename: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct SessionStartArg {
    pub close: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct SessionAppendArg<'a> {
    pub cursor: &'a UploadCursor,
    pub close: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct SessionFinishArg<'a> {
    pub cursor: &'a UploadCursor,
    pub commit: &'a CommitInfo,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SessionStartResult {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FileMetadata {
    pub name: String,
    pub path_display: Option<String>,
    pub size: u64,
    pub rev: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FolderMetadata {
    pub name: String,
    pub path_display: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeletedMetadata {}

/// Tagged metadata union returned by lookups and listings.
#[derive(Debug, Deserialize)]
#[serde(tag = ".tag", rename_all = "lowercase")]
pub(crate) enum Metadata {
    File(FileMetadata),
    Folder(FolderMetadata),
    Deleted(DeletedMetadata),
}

#[derive(Debug, Deserialize)]
pub(crate) struct MetadataResult {
    pub metadata: Metadata,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateFolderResult {
    pub metadata: FolderMetadata,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListFolderResult {
    pub entries: Vec<Metadata>,
    pub cursor: String,
    pub has_more: bool,
}

impl From<FileMetadata> for RemoteEntry {
    fn from(meta: FileMetadata) -> Self {
        let path = meta.path_display.unwrap_or(meta.name);
        RemoteEntry::file(path, meta.size, Some(meta.rev))
    }
}

impl From<FolderMetadata> for RemoteEntry {
    fn from(meta: FolderMetadata) -> Self {
        RemoteEntry::directory(meta.path_display.unwrap_or(meta.name))
    }
}

impl Metadata {
    /// Convert to an entry; deleted placeholders have none.
    pub fn into_entry(self) -> Option<RemoteEntry> {
        match self {
            Metadata::File(meta) => Some(meta.into()),
            Metadata::Folder(meta) => Some(meta.into()),
            Metadata::Deleted(_) => None,
        }
    }
}

impl From<ListFolderResult> for ListPage {
    fn from(result: ListFolderResult) -> Self {
        ListPage {
            entries: result
                .entries
                .into_iter()
                .filter_map(Metadata::into_entry)
                .collect(),
            cursor: result.cursor,
            has_more: result.has_more,
        }
    }
}
