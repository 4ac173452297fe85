use serde::{Deserialize, Serialize};

use crate::storage::UploadSnapshot;

/// `round(bytesTransferred * 100 / totalBytes)`, clamped to `0..=100`.
///
/// A zero total reports 0; the completion event is what marks an empty
/// upload as finished.
pub fn progress_ratio(snapshot: UploadSnapshot) -> u8 {
    if snapshot.total_bytes == 0 {
        return 0;
    }
    let transferred = u128::from(snapshot.bytes_transferred);
    let total = u128::from(snapshot.total_bytes);
    let rounded = (transferred * 100 + total / 2) / total;
    rounded.min(100) as u8
}

/// Upload progress of one attempt. Never moves backwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadProgress {
    ratio: u8,
}

impl UploadProgress {
    pub fn ratio(&self) -> u8 {
        self.ratio
    }

    pub fn stage(&self) -> UploadStage {
        UploadStage::from_ratio(self.ratio)
    }

    /// Folds in a snapshot. Returns true when the ratio advanced.
    pub fn observe(&mut self, snapshot: UploadSnapshot) -> bool {
        self.advance_to(progress_ratio(snapshot))
    }

    /// Raises the ratio to `ratio` if that is higher.
    pub fn advance_to(&mut self, ratio: u8) -> bool {
        let ratio = ratio.min(100);
        if ratio > self.ratio {
            self.ratio = ratio;
            true
        } else {
            false
        }
    }
}

/// Cosmetic label shown next to the progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStage {
    Uploading,
    Processing,
    Saving,
    AlmostDone,
}

impl UploadStage {
    pub fn from_ratio(ratio: u8) -> Self {
        match ratio {
            0..=29 => UploadStage::Uploading,
            30..=59 => UploadStage::Processing,
            60..=89 => UploadStage::Saving,
            _ => UploadStage::AlmostDone,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            UploadStage::Uploading => "Uploading image...",
            UploadStage::Processing => "Processing file...",
            UploadStage::Saving => "Saving to database...",
            UploadStage::AlmostDone => "Almost done...",
        }
    }
}

impl std::fmt::Display for UploadStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}
