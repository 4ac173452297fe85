use async_trait::async_trait;

use super::model::{Patient, ScanRecord};
use crate::error::RecordStoreError;

/// Document-store operations the scan workflow relies on.
///
/// Writes are whole-document: the scan list is always read, modified in
/// memory and written back. Callers that need read-modify-write to be
/// atomic per patient hold a [`PatientLocks`](super::PatientLocks) guard.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get_patient(&self, patient_id: &str) -> Result<Patient, RecordStoreError>;

    async fn create_patient(&self, patient: &Patient) -> Result<(), RecordStoreError>;

    async fn replace_scans(
        &self,
        patient_id: &str,
        scans: &[ScanRecord],
    ) -> Result<(), RecordStoreError>;

    async fn set_current_disease(
        &self,
        patient_id: &str,
        disease: &str,
    ) -> Result<(), RecordStoreError>;

    async fn append_scan(
        &self,
        patient_id: &str,
        record: ScanRecord,
    ) -> Result<(), RecordStoreError> {
        let mut patient = self.get_patient(patient_id).await?;
        patient.scans.push(record);
        self.replace_scans(patient_id, &patient.scans).await
    }
}
