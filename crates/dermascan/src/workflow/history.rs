use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::error::ScanError;
use crate::error::RecordStoreError;
use crate::records::{Patient, PatientLocks, RecordStore, ScanRecord};

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;

/// What the user is asked to confirm.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmRequest {
    DeleteOne { index: usize, record: ScanRecord },
    DeleteAll { count: usize },
}

/// Interactive yes/no gate in front of destructive operations.
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, request: &ConfirmRequest) -> bool;
}

/// Confirms everything. For batch tools and tests.
pub struct AlwaysConfirm;

#[async_trait]
impl Confirm for AlwaysConfirm {
    async fn confirm(&self, _request: &ConfirmRequest) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted { remaining: usize },
    Cancelled,
    NothingToDelete,
}

/// In-memory view of one patient's scans with whole-list deletion.
pub struct ScanHistory {
    records: Arc<dyn RecordStore>,
    locks: PatientLocks,
    patient: Patient,
}

impl ScanHistory {
    pub async fn load(
        records: Arc<dyn RecordStore>,
        locks: PatientLocks,
        patient_id: &str,
    ) -> Result<Self, RecordStoreError> {
        let patient = records.get_patient(patient_id).await?;
        Ok(Self {
            records,
            locks,
            patient,
        })
    }

    pub fn patient(&self) -> &Patient {
        &self.patient
    }

    pub fn scans(&self) -> &[ScanRecord] {
        &self.patient.scans
    }

    /// Re-reads the patient. The view is unchanged on error.
    pub async fn refresh(&mut self) -> Result<(), RecordStoreError> {
        self.patient = self.records.get_patient(&self.patient.id).await?;
        Ok(())
    }

    /// Deletes the scan shown at `index`.
    ///
    /// The stored list is re-read under the patient lock and the target is
    /// located there by value, so scans appended since the view was loaded
    /// survive.
    pub async fn delete_one(
        &mut self,
        index: usize,
        confirm: &dyn Confirm,
    ) -> Result<DeleteOutcome, ScanError> {
        let Some(target) = self.patient.scans.get(index).cloned() else {
            return Err(ScanError::Validation(format!(
                "No scan at position {}",
                index
            )));
        };

        let request = ConfirmRequest::DeleteOne {
            index,
            record: target.clone(),
        };
        if !confirm.confirm(&request).await {
            return Ok(DeleteOutcome::Cancelled);
        }

        let remaining = {
            let guard = self.locks.lock(&self.patient.id).await;
            let mut stored = self
                .records
                .get_patient(&self.patient.id)
                .await
                .map_err(ScanError::Delete)?
                .scans;

            let position = if stored.get(index) == Some(&target) {
                Some(index)
            } else {
                stored.iter().position(|s| *s == target)
            };
            let Some(position) = position else {
                drop(guard);
                self.refresh_after_write().await;
                return Ok(DeleteOutcome::NothingToDelete);
            };

            stored.remove(position);
            self.records
                .replace_scans(&self.patient.id, &stored)
                .await
                .map_err(ScanError::Delete)?;
            stored
        };

        info!(patient_id = %self.patient.id, image_url = %target.image_url, "Scan deleted");
        let count = remaining.len();
        self.patient.scans = remaining;
        self.refresh_after_write().await;
        Ok(DeleteOutcome::Deleted { remaining: count })
    }

    /// Empties the patient's scan list.
    pub async fn delete_all(&mut self, confirm: &dyn Confirm) -> Result<DeleteOutcome, ScanError> {
        if self.patient.scans.is_empty() {
            return Ok(DeleteOutcome::NothingToDelete);
        }

        let request = ConfirmRequest::DeleteAll {
            count: self.patient.scans.len(),
        };
        if !confirm.confirm(&request).await {
            return Ok(DeleteOutcome::Cancelled);
        }

        {
            let _guard = self.locks.lock(&self.patient.id).await;
            self.records
                .replace_scans(&self.patient.id, &[])
                .await
                .map_err(ScanError::Delete)?;
        }

        info!(patient_id = %self.patient.id, "All scans deleted");
        self.patient.scans.clear();
        self.refresh_after_write().await;
        Ok(DeleteOutcome::Deleted { remaining: 0 })
    }

    async fn refresh_after_write(&mut self) {
        if let Err(e) = self.refresh().await {
            warn!(error = %e, patient_id = %self.patient.id, "Refresh after delete failed");
        }
    }

    /// Total stored image size: "0 MB" when there are no scans, otherwise
    /// KB below 1 MB, MB below 1 GB, then GB, with two decimals.
    pub fn total_size_label(&self) -> String {
        if self.patient.scans.is_empty() {
            return "0 MB".to_string();
        }
        format_total_size(self.patient.total_scan_bytes())
    }
}

fn format_total_size(bytes: u64) -> String {
    let bytes = bytes as f64;
    let mib = bytes / MIB;
    if mib < 1.0 {
        format!("{:.2} KB", bytes / KIB)
    } else if mib < 1024.0 {
        format!("{:.2} MB", mib)
    } else {
        format!("{:.2} GB", mib / 1024.0)
    }
}
