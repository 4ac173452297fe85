//! Object storage for scan images.

pub mod filesystem;
pub mod path;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::StorageError;

pub use filesystem::FilesystemObjectStore;
pub use path::upload_path;

/// One progress report from an in-flight upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadSnapshot {
    pub bytes_transferred: u64,
    pub total_bytes: u64,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Streams `bytes` to `path`, sending a snapshot as data is accepted.
    ///
    /// Returns once the object is finalized. The progress sender is dropped
    /// on return, which ends any receiver loop.
    async fn put(
        &self,
        path: &str,
        bytes: &[u8],
        progress: mpsc::UnboundedSender<UploadSnapshot>,
    ) -> Result<(), StorageError>;

    /// Durable retrieval URL for a finalized object.
    async fn download_url(&self, path: &str) -> Result<String, StorageError>;
}
