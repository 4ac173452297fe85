//! Test harness wiring a scan service against an in-memory database.

#![allow(dead_code)]

use std::sync::Arc;

use tempfile::TempDir;

use dermascan::classifier::Classifier;
use dermascan::records::{
    Patient, PatientLocks, RecordStore, ScanRecord, SqliteOrphanLedger, SqliteRecordStore,
};
use dermascan::storage::{FilesystemObjectStore, ObjectStore};
use dermascan::workflow::{ScanController, ScanHistory, ScanService};
use dermascan::Database;

use super::fakes::FlakyRecordStore;

pub const PATIENT_ID: &str = "patient-001";

pub struct TestHarness {
    pub temp_dir: TempDir,
    pub db: Database,
    pub records: Arc<FlakyRecordStore>,
    pub orphans: Arc<SqliteOrphanLedger>,
    pub locks: PatientLocks,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db = Database::open_in_memory().expect("Failed to open in-memory database");
        let sqlite: Arc<dyn RecordStore> = Arc::new(SqliteRecordStore::new(db.clone()));

        Self {
            temp_dir,
            records: Arc::new(FlakyRecordStore::new(sqlite)),
            orphans: Arc::new(SqliteOrphanLedger::new(db.clone())),
            db,
            locks: PatientLocks::new(),
        }
    }

    /// Harness with the default patient already registered.
    pub async fn with_patient() -> Self {
        let harness = Self::new();
        harness.seed_patient(PATIENT_ID).await;
        harness
    }

    pub async fn seed_patient(&self, id: &str) {
        self.records
            .create_patient(&Patient::new(id, "Test Patient"))
            .await
            .expect("Failed to seed patient");
    }

    pub async fn seed_scans(&self, id: &str, scans: &[ScanRecord]) {
        self.records
            .replace_scans(id, scans)
            .await
            .expect("Failed to seed scans");
    }

    pub async fn patient(&self, id: &str) -> Patient {
        self.records
            .get_patient(id)
            .await
            .expect("Patient should exist")
    }

    pub fn service(
        &self,
        classifier: Arc<dyn Classifier>,
        objects: Arc<dyn ObjectStore>,
    ) -> Arc<ScanService> {
        Arc::new(
            ScanService::new(
                classifier,
                objects,
                self.records.clone(),
                self.orphans.clone(),
            )
            .with_locks(self.locks.clone()),
        )
    }

    pub fn controller(
        &self,
        classifier: Arc<dyn Classifier>,
        objects: Arc<dyn ObjectStore>,
    ) -> ScanController {
        ScanController::new(self.service(classifier, objects))
    }

    /// Real filesystem store rooted in the harness temp dir.
    pub fn filesystem_store(&self) -> Arc<FilesystemObjectStore> {
        Arc::new(
            FilesystemObjectStore::new(self.temp_dir.path(), "https://cdn.example.com/scans", 4096)
                .expect("Failed to create object store"),
        )
    }

    pub async fn history(&self, id: &str) -> ScanHistory {
        ScanHistory::load(self.records.clone(), self.locks.clone(), id)
            .await
            .expect("Failed to load history")
    }
}
