//! The transfer manager.
//!
//! Operations live in `fs::operations` as `impl TransferManager` blocks, one
//! file per concern.

use crate::config::TransferConfig;
use crate::error::Result;
use crate::progress::{ProgressCallback, TransferProgress};
use crate::store::RemoteStore;

/// Moves files and directories between the local filesystem and a remote store.
///
/// Every remote call is awaited before the next one is issued.
///
/// # Example
/// ```no_run
/// # use dbx_transfer::{TransferManager, UploadOptions};
/// # use dbx_transfer::credentials::EnvToken;
/// # use dbx_transfer::store::DropboxStore;
/// # async fn example() -> dbx_transfer::error::Result<()> {
/// let store = DropboxStore::connect(&EnvToken::default())?;
/// let mut manager = TransferManager::new(store);
/// manager.upload("report.pdf", "/Reports", &UploadOptions::default()).await?;
/// # Ok(())
/// # }
/// ```
pub struct TransferManager<S: RemoteStore> {
    store: S,
    pub(crate) config: TransferConfig,
    progress: Option<ProgressCallback>,
}

impl<S: RemoteStore> TransferManager<S> {
    /// Create a manager with the default configuration.
    pub fn new(store: S) -> Self {
        Self {
            store,
            config: TransferConfig::default(),
            progress: None,
        }
    }

    /// Create a manager with a validated configuration.
    pub fn with_config(store: S, config: TransferConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            config,
            progress: None,
        })
    }

    /// Install a callback that receives progress after each content request.
    ///
    /// # Example
    /// ```no_run
    /// # use dbx_transfer::TransferManager;
    /// # use dbx_transfer::store::MemoryStore;
    /// let mut manager = TransferManager::new(MemoryStore::new());
    /// manager.watch_progress(Box::new(|p| {
    ///     println!("{}: {:.1}%", p.path, p.percent());
    /// }));
    /// ```
    pub fn watch_progress(&mut self, callback: ProgressCallback) {
        self.progress = Some(callback);
    }

    /// Remove the progress callback.
    pub fn clear_progress(&mut self) {
        self.progress = None;
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub(crate) fn report(&mut self, progress: TransferProgress) {
        if let Some(callback) = self.progress.as_mut() {
            callback(&progress);
        }
    }
}

impl<S: RemoteStore + std::fmt::Debug> std::fmt::Debug for TransferManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferManager")
            .field("store", &self.store)
            .field("config", &self.config)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}
