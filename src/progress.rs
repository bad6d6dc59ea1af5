//! Progress reporting for file transfers.

/// Which way bytes are moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Upload,
    Download,
}

/// Progress information for uploads and downloads.
#[derive(Debug, Clone)]
pub struct TransferProgress {
    /// Bytes transferred so far
    pub done: u64,
    /// Total bytes to transfer
    pub total: u64,
    /// Remote path of the file being transferred
    pub path: String,
    pub direction: Direction,
}

impl TransferProgress {
    /// Create a new progress report.
    pub fn new(done: u64, total: u64, path: impl Into<String>, direction: Direction) -> Self {
        Self {
            done,
            total,
            path: path.into(),
            direction,
        }
    }

    /// Get progress as a percentage (0.0 to 100.0).
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.done as f64 / self.total as f64) * 100.0
    }

    /// Check if transfer is complete.
    pub fn is_complete(&self) -> bool {
        self.done >= self.total
    }
}

/// Type alias for progress callback function.
///
/// Called after every request that moves file content. Transfers cannot be
/// cancelled from the callback.
pub type ProgressCallback = Box<dyn FnMut(&TransferProgress) + Send>;
