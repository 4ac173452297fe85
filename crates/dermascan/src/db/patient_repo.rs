//! Patient repository: CRUD for the `patients` table.
//!
//! The scan list is kept as a single JSON document column and is always
//! rewritten whole; callers own (de)serialization.

use rusqlite::{params, OptionalExtension};

use super::{Database, DatabaseError};

/// A raw patient row.
#[derive(Debug, Clone)]
pub struct PatientRow {
    pub id: String,
    pub name: String,
    pub current_disease: Option<String>,
    pub scans_json: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Inserts a new patient. Returns `false` if the id is already taken.
pub fn insert(db: &Database, row: &PatientRow) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let inserted = conn.execute(
            "INSERT INTO patients (id, name, current_disease, scans, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO NOTHING",
            params![
                row.id,
                row.name,
                row.current_disease,
                row.scans_json,
                row.created_at,
                row.updated_at,
            ],
        )?;
        Ok(inserted == 1)
    })
}

pub fn find(db: &Database, id: &str) -> Result<Option<PatientRow>, DatabaseError> {
    db.with_conn(|conn| {
        let row = conn
            .query_row(
                "SELECT id, name, current_disease, scans, created_at, updated_at
                 FROM patients WHERE id = ?1",
                params![id],
                |row| {
                    Ok(PatientRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        current_disease: row.get(2)?,
                        scans_json: row.get(3)?,
                        created_at: row.get(4)?,
                        updated_at: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    })
}

/// Overwrites the whole scan list. Returns `false` when no such patient.
pub fn replace_scans(
    db: &Database,
    id: &str,
    scans_json: &str,
    updated_at: &str,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE patients SET scans = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, scans_json, updated_at],
        )?;
        Ok(changed == 1)
    })
}

/// Returns `false` when no such patient.
pub fn set_current_disease(
    db: &Database,
    id: &str,
    disease: &str,
    updated_at: &str,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE patients SET current_disease = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, disease, updated_at],
        )?;
        Ok(changed == 1)
    })
}
