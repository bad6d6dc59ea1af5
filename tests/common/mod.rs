#![allow(dead_code)]

pub mod mock_dropbox;

use std::path::Path;

use dbx_transfer::store::MemoryStore;
use dbx_transfer::{TransferConfig, TransferManager};
use tempfile::TempDir;

pub const SMALL_CHUNK: u64 = 1024;

pub fn setup_temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

/// Manager over an empty in-memory store with a 1 KiB chunk size.
pub fn memory_manager() -> TransferManager<MemoryStore> {
    manager_over(MemoryStore::new())
}

pub fn manager_over(store: MemoryStore) -> TransferManager<MemoryStore> {
    let config = TransferConfig {
        chunk_size: SMALL_CHUNK,
        page_limit: 0,
    };
    TransferManager::with_config(store, config).expect("valid config")
}

/// Deterministic, non-repeating-looking content.
pub fn sample_data(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 31 + i / 7) % 251) as u8).collect()
}

/// Write `files` (slash-separated relative paths) below `root`.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (relative, content) in files {
        let path = relative
            .split('/')
            .fold(root.to_path_buf(), |acc, part| acc.join(part));
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&path, content).expect("Failed to write file");
    }
}
