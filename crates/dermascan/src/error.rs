use std::path::PathBuf;
use thiserror::Error;

use crate::secrets::SecretError;

#[derive(Error, Debug)]
pub enum DermascanError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Scan error: {0}")]
    Scan(#[from] crate::workflow::ScanError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("Treatment lookup error: {0}")]
    Treatment(#[from] TreatmentError),

    #[error("Record store error: {0}")]
    Records(#[from] RecordStoreError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Chat error: {0}")]
    Chat(#[from] crate::chat::ChatError),

    #[error("Secret error: {0}")]
    Secret(#[from] SecretError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Unknown classifier backend '{name}'")]
    UnknownBackend { name: String },

    #[error("Invalid URL for '{field}': {reason}")]
    InvalidUrl { field: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("Failed to resolve secret: {0}")]
    Secret(#[from] SecretError),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write object '{path}': {source}")]
    WriteObject {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid object path: {0}")]
    InvalidPath(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid public base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Upload rejected by storage backend: {0}")]
    Rejected(String),
}

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Classifier request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Classifier returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Classifier response contained no prediction")]
    MissingPrediction,

    #[error("Invalid MIME type '{0}' for classifier upload")]
    InvalidMimeType(String),

    #[error("Classifier unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum TreatmentError {
    #[error("Treatment request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Treatment service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("No treatment information for '{0}'")]
    NotFound(String),

    #[error("Invalid treatment base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

#[derive(Error, Debug)]
pub enum RecordStoreError {
    #[error("Patient '{0}' not found")]
    PatientNotFound(String),

    #[error("Patient '{0}' already exists")]
    PatientExists(String),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Failed to (de)serialize scan list: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Record store unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, DermascanError>;
