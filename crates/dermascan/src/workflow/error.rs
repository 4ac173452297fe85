use thiserror::Error;

use crate::error::{RecordStoreError, StorageError};

/// Failures surfaced by the scan workflow.
///
/// Classification failures are not listed: they are absorbed into the
/// fallback label and the attempt carries on.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Rejected before any side effect.
    #[error("{0}")]
    Validation(String),

    /// Streaming or finalizing the object failed; nothing was recorded.
    #[error("Upload failed: {0}")]
    Upload(#[source] StorageError),

    /// The object is stored at `image_url` but the patient record was not
    /// fully updated.
    #[error("Saving scan record failed (image at {image_url}): {source}")]
    Persist {
        image_url: String,
        #[source]
        source: RecordStoreError,
    },

    /// The scan list was not rewritten; the local view is unchanged.
    #[error("Deleting scans failed: {0}")]
    Delete(#[source] RecordStoreError),

    /// The background task running the attempt panicked or was shut down
    /// with its runtime.
    #[error("Scan task ended abnormally: {0}")]
    Task(#[source] tokio::task::JoinError),
}
