//! Remote store backed by the Dropbox v2 HTTP API.

use std::path::Path;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::{CommitInfo, RemoteStore, UploadCursor};
use crate::api::types::{
    CreateFolderArg, CreateFolderResult, FileMetadata, ListFolderArg, ListFolderContinueArg,
    ListFolderResult, Metadata, MetadataResult, PathArg, RelocationArg, SessionAppendArg,
    SessionFinishArg, SessionStartArg, SessionStartResult,
};
use crate::api::{ApiClient, ApiErrorKind};
use crate::credentials::CredentialProvider;
use crate::error::{Result, TransferError};
use crate::fs::{ListPage, RemoteEntry};

/// Dropbox implementation of [`RemoteStore`].
#[derive(Debug)]
pub struct DropboxStore {
    api: ApiClient,
}

impl DropboxStore {
    /// Build a store from an already configured API client.
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Ask `credentials` for a token and build a store with it.
    pub fn connect(credentials: &dyn CredentialProvider) -> Result<Self> {
        let token = credentials.access_token()?;
        Ok(Self::new(ApiClient::new(token)))
    }

    /// Like [`DropboxStore::connect`], routing requests through a proxy.
    pub fn connect_with_proxy(credentials: &dyn CredentialProvider, proxy: &str) -> Result<Self> {
        let token = credentials.access_token()?;
        Ok(Self::new(ApiClient::with_proxy(token, proxy)?))
    }
}

/// Dropbox addresses a revision through the path argument.
fn download_path(path: &str, revision: Option<&str>) -> String {
    match revision {
        Some(rev) => format!("rev:{}", rev),
        None => path.to_string(),
    }
}

#[async_trait]
impl RemoteStore for DropboxStore {
    async fn metadata(&self, path: &str) -> Result<Option<RemoteEntry>> {
        // get_metadata does not accept the root.
        if path.is_empty() {
            return Ok(Some(RemoteEntry::directory("")));
        }

        match self
            .api
            .request::<_, Metadata>("files/get_metadata", &PathArg { path })
            .await
        {
            Ok(meta) => Ok(meta.into_entry()),
            Err(e) if e.is_api(ApiErrorKind::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn upload(&self, data: Vec<u8>, commit: &CommitInfo) -> Result<RemoteEntry> {
        let meta: FileMetadata = self.api.upload("files/upload", commit, data).await?;
        Ok(meta.into())
    }

    async fn start_upload_session(&self, data: Vec<u8>) -> Result<String> {
        let result: SessionStartResult = self
            .api
            .upload(
                "files/upload_session/start",
                &SessionStartArg { close: false },
                data,
            )
            .await?;
        debug!(session_id = %result.session_id, "upload session started");
        Ok(result.session_id)
    }

    async fn append_upload_session(&self, cursor: &UploadCursor, data: Vec<u8>) -> Result<()> {
        let arg = SessionAppendArg {
            cursor,
            close: false,
        };
        self.api
            .upload::<_, ()>("files/upload_session/append_v2", &arg, data)
            .await
    }

    async fn finish_upload_session(
        &self,
        cursor: &UploadCursor,
        data: Vec<u8>,
        commit: &CommitInfo,
    ) -> Result<RemoteEntry> {
        let arg = SessionFinishArg { cursor, commit };
        let meta: FileMetadata = self
            .api
            .upload("files/upload_session/finish", &arg, data)
            .await?;
        Ok(meta.into())
    }

    async fn download_to(&self, path: &str, revision: Option<&str>, dest: &Path) -> Result<u64> {
        let target = download_path(path, revision);
        let mut response = self
            .api
            .download("files/download", &PathArg { path: &target })
            .await?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }

    async fn list_folder(&self, path: &str, recursive: bool) -> Result<ListPage> {
        let result: ListFolderResult = self
            .api
            .request("files/list_folder", &ListFolderArg { path, recursive })
            .await?;
        Ok(result.into())
    }

    async fn list_folder_continue(&self, cursor: &str) -> Result<ListPage> {
        let result: ListFolderResult = self
            .api
            .request("files/list_folder/continue", &ListFolderContinueArg { cursor })
            .await?;
        Ok(result.into())
    }

    async fn delete(&self, path: &str) -> Result<RemoteEntry> {
        let result: MetadataResult = self
            .api
            .request("files/delete_v2", &PathArg { path })
            .await?;
        result
            .metadata
            .into_entry()
            .ok_or(TransferError::InvalidResponse)
    }

    async fn create_folder(&self, path: &str, autorename: bool) -> Result<RemoteEntry> {
        let result: CreateFolderResult = self
            .api
            .request("files/create_folder_v2", &CreateFolderArg { path, autorename })
            .await?;
        Ok(result.metadata.into())
    }

    async fn move_entry(&self, from: &str, to: &str) -> Result<RemoteEntry> {
        let arg = RelocationArg {
            from_path: from,
            to_path: to,
            autorename: false,
        };
        let result: MetadataResult = self.api.request("files/move_v2", &arg).await?;
        result
            .metadata
            .into_entry()
            .ok_or(TransferError::InvalidResponse)
    }
}
