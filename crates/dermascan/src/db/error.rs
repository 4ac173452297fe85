use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Cannot create database directory '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Migration v{version} failed: {reason}")]
    Migration { version: u32, reason: String },

    /// A stored timestamp did not parse as RFC 3339.
    #[error("Invalid timestamp '{value}' in table '{table}'")]
    InvalidTimestamp { table: &'static str, value: String },

    #[error("Database lock poisoned")]
    LockPoisoned,
}
