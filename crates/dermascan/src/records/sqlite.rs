use async_trait::async_trait;
use chrono::Utc;

use super::model::{Patient, ScanRecord};
use super::store::RecordStore;
use crate::db::patient_repo::{self, PatientRow};
use crate::db::Database;
use crate::error::RecordStoreError;

/// [`RecordStore`] over the local SQLite database.
#[derive(Clone)]
pub struct SqliteRecordStore {
    db: Database,
}

impl SqliteRecordStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

fn patient_from_row(row: PatientRow) -> Result<Patient, RecordStoreError> {
    let scans: Vec<ScanRecord> = serde_json::from_str(&row.scans_json)?;
    Ok(Patient {
        id: row.id,
        name: row.name,
        current_disease: row.current_disease,
        scans,
    })
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn get_patient(&self, patient_id: &str) -> Result<Patient, RecordStoreError> {
        let row = patient_repo::find(&self.db, patient_id)?
            .ok_or_else(|| RecordStoreError::PatientNotFound(patient_id.to_string()))?;
        patient_from_row(row)
    }

    async fn create_patient(&self, patient: &Patient) -> Result<(), RecordStoreError> {
        let now = Utc::now().to_rfc3339();
        let row = PatientRow {
            id: patient.id.clone(),
            name: patient.name.clone(),
            current_disease: patient.current_disease.clone(),
            scans_json: serde_json::to_string(&patient.scans)?,
            created_at: now.clone(),
            updated_at: now,
        };

        if !patient_repo::insert(&self.db, &row)? {
            return Err(RecordStoreError::PatientExists(patient.id.clone()));
        }
        log::debug!("Created patient {}", patient.id);
        Ok(())
    }

    async fn replace_scans(
        &self,
        patient_id: &str,
        scans: &[ScanRecord],
    ) -> Result<(), RecordStoreError> {
        let json = serde_json::to_string(scans)?;
        let now = Utc::now().to_rfc3339();
        if !patient_repo::replace_scans(&self.db, patient_id, &json, &now)? {
            return Err(RecordStoreError::PatientNotFound(patient_id.to_string()));
        }
        log::debug!("Wrote {} scans for patient {}", scans.len(), patient_id);
        Ok(())
    }

    async fn set_current_disease(
        &self,
        patient_id: &str,
        disease: &str,
    ) -> Result<(), RecordStoreError> {
        let now = Utc::now().to_rfc3339();
        if !patient_repo::set_current_disease(&self.db, patient_id, disease, &now)? {
            return Err(RecordStoreError::PatientNotFound(patient_id.to_string()));
        }
        Ok(())
    }
}
