//! Objects that reached storage but never made it into a patient record.
//!
//! They are not deleted automatically. Each one is written to a ledger so
//! an operator can reclaim it or re-attach it to the patient.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::orphan_repo::{self, OrphanRow};
use crate::db::{Database, DatabaseError};
use crate::error::RecordStoreError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrphanedObject {
    pub patient_id: String,
    pub storage_path: String,
    pub image_url: String,
    pub reason: String,
    pub recorded_at: DateTime<Utc>,
}

#[async_trait]
pub trait OrphanLedger: Send + Sync {
    async fn record(&self, orphan: &OrphanedObject) -> Result<(), RecordStoreError>;
}

/// Ledger that only emits a warning. Used when no database is available.
pub struct LogOrphanLedger;

#[async_trait]
impl OrphanLedger for LogOrphanLedger {
    async fn record(&self, orphan: &OrphanedObject) -> Result<(), RecordStoreError> {
        tracing::warn!(
            patient_id = %orphan.patient_id,
            storage_path = %orphan.storage_path,
            image_url = %orphan.image_url,
            reason = %orphan.reason,
            "Orphaned object left in storage"
        );
        Ok(())
    }
}

#[derive(Clone)]
pub struct SqliteOrphanLedger {
    db: Database,
}

impl SqliteOrphanLedger {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Every unresolved entry, oldest first, with its ledger id.
    pub fn list(&self) -> Result<Vec<(i64, OrphanedObject)>, DatabaseError> {
        orphan_repo::list(&self.db)?
            .into_iter()
            .map(orphan_from_row)
            .collect()
    }

    /// Marks an entry as handled.
    pub fn resolve(&self, id: i64) -> Result<bool, DatabaseError> {
        orphan_repo::delete(&self.db, id)
    }
}

fn orphan_from_row(row: OrphanRow) -> Result<(i64, OrphanedObject), DatabaseError> {
    let recorded_at = DateTime::parse_from_rfc3339(&row.created_at)
        .map_err(|_| DatabaseError::InvalidTimestamp {
            table: "orphaned_objects",
            value: row.created_at.clone(),
        })?
        .with_timezone(&Utc);

    Ok((
        row.id,
        OrphanedObject {
            patient_id: row.patient_id,
            storage_path: row.storage_path,
            image_url: row.image_url,
            reason: row.reason,
            recorded_at,
        },
    ))
}

#[async_trait]
impl OrphanLedger for SqliteOrphanLedger {
    async fn record(&self, orphan: &OrphanedObject) -> Result<(), RecordStoreError> {
        let id = orphan_repo::insert(
            &self.db,
            &orphan.patient_id,
            &orphan.storage_path,
            &orphan.image_url,
            &orphan.reason,
            &orphan.recorded_at.to_rfc3339(),
        )?;
        tracing::warn!(
            ledger_id = id,
            patient_id = %orphan.patient_id,
            storage_path = %orphan.storage_path,
            "Orphaned object recorded"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn orphan() -> OrphanedObject {
        OrphanedObject {
            patient_id: "p1".to_string(),
            storage_path: "Uploads/1700000000000_x.jpg".to_string(),
            image_url: "https://store/x.jpg".to_string(),
            reason: "Record store unavailable: offline".to_string(),
            recorded_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_sqlite_ledger_round_trip() {
        let ledger = SqliteOrphanLedger::new(Database::open_in_memory().unwrap());
        ledger.record(&orphan()).await.unwrap();

        let entries = ledger.list().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].1, orphan());

        assert!(ledger.resolve(entries[0].0).unwrap());
        assert!(ledger.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_log_ledger_never_fails() {
        assert!(LogOrphanLedger.record(&orphan()).await.is_ok());
    }

    #[test]
    fn test_bad_timestamp_is_reported() {
        let row = OrphanRow {
            id: 1,
            patient_id: "p1".to_string(),
            storage_path: "Uploads/x".to_string(),
            image_url: "https://store/x".to_string(),
            reason: "r".to_string(),
            created_at: "yesterday".to_string(),
        };
        assert!(matches!(
            orphan_from_row(row),
            Err(DatabaseError::InvalidTimestamp { .. })
        ));
    }
}
