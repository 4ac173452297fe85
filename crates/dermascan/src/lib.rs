pub mod chat;
pub mod classifier;
pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod logging;
pub mod records;
pub mod sanitize;
pub mod secrets;
pub mod storage;
pub mod treatment;
pub mod workflow;

pub use chat::{ChatError, ChatRole, ChatSession, ChatTurn, CompletionClient, GeminiClient};
pub use classifier::{Classifier, HttpClassifier, SourceFile, DIAGNOSIS_NOT_AVAILABLE};
pub use config::{load_config, load_config_from_str, Config};
pub use db::Database;
pub use error::{
    ClassifierError, ConfigError, DermascanError, RecordStoreError, Result, StorageError,
    TreatmentError,
};
pub use records::{
    OrphanLedger, OrphanedObject, Patient, PatientLocks, RecordStore, ScanRecord,
    SqliteOrphanLedger, SqliteRecordStore,
};
pub use secrets::{SecretError, SecretSource};
pub use storage::{FilesystemObjectStore, ObjectStore, UploadSnapshot};
pub use treatment::{TreatmentClient, TreatmentInfo};
pub use workflow::{
    AttemptId, AttemptPhase, FailedStage, ScanController, ScanError, ScanEvent,
    ScanEventBroadcaster, ScanHistory, ScanOutcome, ScanService, UploadStage,
};
