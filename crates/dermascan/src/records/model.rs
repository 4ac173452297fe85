use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One persisted scan. Immutable once written; only ever appended to a
/// patient's list or filtered out of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    pub image_url: String,
    pub file_name: String,
    pub file_size_bytes: u64,
    pub predicted_label: String,
    #[serde(default)]
    pub clinical_note: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub name: String,
    /// Label of the most recent scan, whatever it was.
    #[serde(default)]
    pub current_disease: Option<String>,
    #[serde(default)]
    pub scans: Vec<ScanRecord>,
}

impl Patient {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            current_disease: None,
            scans: Vec::new(),
        }
    }

    /// Sum of the stored image sizes.
    pub fn total_scan_bytes(&self) -> u64 {
        self.scans.iter().map(|s| s.file_size_bytes).sum()
    }
}
