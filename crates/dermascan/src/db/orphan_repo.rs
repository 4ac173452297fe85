//! Ledger of uploaded objects whose patient record was never written.

use rusqlite::params;

use super::{Database, DatabaseError};

#[derive(Debug, Clone)]
pub struct OrphanRow {
    pub id: i64,
    pub patient_id: String,
    pub storage_path: String,
    pub image_url: String,
    pub reason: String,
    pub created_at: String,
}

/// Records an orphaned object and returns its ledger id.
pub fn insert(
    db: &Database,
    patient_id: &str,
    storage_path: &str,
    image_url: &str,
    reason: &str,
    created_at: &str,
) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO orphaned_objects (patient_id, storage_path, image_url, reason, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![patient_id, storage_path, image_url, reason, created_at],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// All entries, oldest first.
pub fn list(db: &Database) -> Result<Vec<OrphanRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, patient_id, storage_path, image_url, reason, created_at
             FROM orphaned_objects ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(OrphanRow {
                    id: row.get(0)?,
                    patient_id: row.get(1)?,
                    storage_path: row.get(2)?,
                    image_url: row.get(3)?,
                    reason: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Removes an entry once the object has been reclaimed by hand.
pub fn delete(db: &Database, id: i64) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute("DELETE FROM orphaned_objects WHERE id = ?1", params![id])?;
        Ok(changed == 1)
    })
}
