use std::sync::Arc;

use chrono::Utc;
use futures_util::future::join;
use tokio::sync::mpsc;
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::attempt::{AttemptId, AttemptPhase, FailedStage};
use super::error::ScanError;
use super::events::{ScanEvent, ScanEventKind, ScanReporter};
use super::progress::UploadProgress;
use crate::classifier::{Classifier, HttpClassifier, SourceFile, DIAGNOSIS_NOT_AVAILABLE};
use crate::config::Config;
use crate::db::Database;
use crate::error::{ConfigError, DermascanError, RecordStoreError, StorageError};
use crate::http::build_http_client;
use crate::records::{
    OrphanLedger, OrphanedObject, PatientLocks, RecordStore, ScanRecord, SqliteOrphanLedger,
    SqliteRecordStore,
};
use crate::sanitize::redact_file_name;
use crate::storage::{upload_path, FilesystemObjectStore, ObjectStore};

/// Longest clinical note accepted with a scan, in characters.
pub const MAX_CLINICAL_NOTE_CHARS: usize = 500;

#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub attempt_id: AttemptId,
    pub patient_id: String,
    pub file: SourceFile,
    pub clinical_note: String,
}

impl ScanRequest {
    pub fn new(patient_id: impl Into<String>, file: SourceFile) -> Self {
        Self {
            attempt_id: AttemptId::new(),
            patient_id: patient_id.into(),
            file,
            clinical_note: String::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.clinical_note = note.into();
        self
    }

    pub fn validate(&self) -> Result<(), ScanError> {
        if self.patient_id.trim().is_empty() {
            return Err(ScanError::Validation("Patient id is required".to_string()));
        }
        if self.file.is_empty() {
            return Err(ScanError::Validation(
                "Please select a file first".to_string(),
            ));
        }
        let note_chars = self.clinical_note.chars().count();
        if note_chars > MAX_CLINICAL_NOTE_CHARS {
            return Err(ScanError::Validation(format!(
                "Clinical note is {} characters; the limit is {}",
                note_chars, MAX_CLINICAL_NOTE_CHARS
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub attempt_id: AttemptId,
    pub record: ScanRecord,
    pub storage_path: String,
    pub classification_fell_back: bool,
}

/// Runs scan attempts: classify, upload, then record against the patient.
///
/// Holds no per-attempt state, so one instance serves every surface of the
/// application. Everything an attempt produces is reported as events
/// tagged with its [`AttemptId`].
pub struct ScanService {
    classifier: Arc<dyn Classifier>,
    objects: Arc<dyn ObjectStore>,
    records: Arc<dyn RecordStore>,
    orphans: Arc<dyn OrphanLedger>,
    locks: PatientLocks,
}

impl ScanService {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        objects: Arc<dyn ObjectStore>,
        records: Arc<dyn RecordStore>,
        orphans: Arc<dyn OrphanLedger>,
    ) -> Self {
        Self {
            classifier,
            objects,
            records,
            orphans,
            locks: PatientLocks::new(),
        }
    }

    /// Shares a lock table with other writers of the same store.
    pub fn with_locks(mut self, locks: PatientLocks) -> Self {
        self.locks = locks;
        self
    }

    /// Production constructor: HTTP classifier for the active backend,
    /// filesystem object store, SQLite records and orphan ledger.
    pub fn from_config(config: &Config) -> Result<Self, DermascanError> {
        let client = build_http_client(&config.http)?;
        let classifier = HttpClassifier::from_config(&config.classifier, client)?;
        let objects = FilesystemObjectStore::from_config(&config.storage)?;

        let db_path = config
            .database
            .resolved_path()
            .ok_or_else(|| ConfigError::Validation {
                message: "No database path configured and no home directory found".to_string(),
            })?;
        let db = Database::open(&db_path)?;

        info!(
            backend = classifier.backend_name(),
            storage_root = %objects.root().display(),
            "Scan service ready"
        );

        Ok(Self::new(
            Arc::new(classifier),
            Arc::new(objects),
            Arc::new(SqliteRecordStore::new(db.clone())),
            Arc::new(SqliteOrphanLedger::new(db)),
        ))
    }

    pub fn records(&self) -> Arc<dyn RecordStore> {
        Arc::clone(&self.records)
    }

    pub fn locks(&self) -> &PatientLocks {
        &self.locks
    }

    /// Runs one attempt to a terminal state.
    ///
    /// A classification failure is not an error: the placeholder label is
    /// used and the attempt carries on. Upload and persist failures end the
    /// attempt; nothing is retried and an uploaded object is never removed.
    pub async fn run(
        &self,
        request: ScanRequest,
        reporter: &dyn ScanReporter,
    ) -> Result<ScanOutcome, ScanError> {
        request.validate()?;

        let span = info_span!("scan",
            attempt_id = %request.attempt_id,
            patient_id = %request.patient_id,
            file_name = %redact_file_name(&request.file.file_name),
            bytes = request.file.size(),
        );
        self.run_steps(request, reporter).instrument(span).await
    }

    async fn run_steps(
        &self,
        request: ScanRequest,
        reporter: &dyn ScanReporter,
    ) -> Result<ScanOutcome, ScanError> {
        let id = request.attempt_id;

        // Step 1: Classify
        reporter.report(ScanEvent::phase(id, AttemptPhase::Classifying));
        let (label, fell_back) = self
            .step_classify(&request.file)
            .instrument(info_span!("classify"))
            .await;
        reporter.report(ScanEvent::new(
            id,
            ScanEventKind::PredictionReady {
                label: label.clone(),
                fallback: fell_back,
            },
        ));

        // Step 2: Upload
        reporter.report(ScanEvent::phase(id, AttemptPhase::Uploading));
        let (storage_path, image_url) = match self
            .step_upload(&request, reporter)
            .instrument(info_span!("upload"))
            .await
        {
            Ok(uploaded) => uploaded,
            Err(e) => {
                warn!(error = %e, "Upload failed");
                reporter.report(ScanEvent::failed(id, FailedStage::Upload, &e.to_string()));
                return Err(ScanError::Upload(e));
            }
        };
        reporter.report(ScanEvent::new(
            id,
            ScanEventKind::Uploaded {
                image_url: image_url.clone(),
            },
        ));

        // Step 3: Persist
        reporter.report(ScanEvent::phase(id, AttemptPhase::Persisting));
        let record = match self
            .step_persist(&request, &label, &storage_path, &image_url, reporter)
            .instrument(info_span!("persist"))
            .await
        {
            Ok(record) => record,
            Err(e) => {
                reporter.report(ScanEvent::failed(id, FailedStage::Persist, &e.to_string()));
                return Err(e);
            }
        };

        info!(label = %label, fell_back, "Scan recorded");
        reporter.report(ScanEvent::new(
            id,
            ScanEventKind::Completed {
                record: record.clone(),
            },
        ));

        Ok(ScanOutcome {
            attempt_id: id,
            record,
            storage_path,
            classification_fell_back: fell_back,
        })
    }

    /// Returns the label and whether it is the placeholder.
    async fn step_classify(&self, file: &SourceFile) -> (String, bool) {
        match self.classifier.classify(file).await {
            Ok(label) => {
                debug!(label = %label, "Classification succeeded");
                (label, false)
            }
            Err(e) => {
                warn!(error = %e, "Classification failed, continuing without diagnosis");
                (DIAGNOSIS_NOT_AVAILABLE.to_string(), true)
            }
        }
    }

    /// Streams the image to storage while forwarding progress, then fetches
    /// its retrieval URL.
    async fn step_upload(
        &self,
        request: &ScanRequest,
        reporter: &dyn ScanReporter,
    ) -> Result<(String, String), StorageError> {
        let id = request.attempt_id;
        let path = upload_path(Utc::now(), &request.file.file_name);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let put = self.objects.put(&path, &request.file.bytes[..], tx);
        let forward_progress = async {
            let mut progress = UploadProgress::default();
            while let Some(snapshot) = rx.recv().await {
                if progress.observe(snapshot) {
                    reporter.report(ScanEvent::new(
                        id,
                        ScanEventKind::UploadProgress {
                            ratio: progress.ratio(),
                            stage: progress.stage(),
                            bytes_transferred: snapshot.bytes_transferred,
                            total_bytes: snapshot.total_bytes,
                        },
                    ));
                }
            }
        };

        let (stored, ()) = join(put, forward_progress).await;
        stored?;

        let url = self.objects.download_url(&path).await?;
        debug!(path = %path, "Upload finalized");
        Ok((path, url))
    }

    /// Appends the record and updates the patient's current disease under
    /// the patient's lock.
    async fn step_persist(
        &self,
        request: &ScanRequest,
        label: &str,
        storage_path: &str,
        image_url: &str,
        reporter: &dyn ScanReporter,
    ) -> Result<ScanRecord, ScanError> {
        let record = ScanRecord {
            image_url: image_url.to_string(),
            file_name: redact_file_name(&request.file.file_name),
            file_size_bytes: request.file.size(),
            predicted_label: label.to_string(),
            clinical_note: request.clinical_note.clone(),
            created_at: Utc::now(),
        };

        let _guard = self.locks.lock(&request.patient_id).await;

        if let Err(e) = self
            .records
            .append_scan(&request.patient_id, record.clone())
            .await
        {
            warn!(error = %e, "Failed to append scan record");
            self.record_orphan(request, storage_path, image_url, &e, reporter)
                .await;
            return Err(ScanError::Persist {
                image_url: image_url.to_string(),
                source: e,
            });
        }

        // The record is already written; it references the object, so a
        // failure here leaves nothing orphaned.
        if let Err(e) = self
            .records
            .set_current_disease(&request.patient_id, label)
            .await
        {
            warn!(error = %e, "Scan recorded but current disease not updated");
            return Err(ScanError::Persist {
                image_url: image_url.to_string(),
                source: e,
            });
        }

        Ok(record)
    }

    async fn record_orphan(
        &self,
        request: &ScanRequest,
        storage_path: &str,
        image_url: &str,
        cause: &RecordStoreError,
        reporter: &dyn ScanReporter,
    ) {
        let orphan = OrphanedObject {
            patient_id: request.patient_id.clone(),
            storage_path: storage_path.to_string(),
            image_url: image_url.to_string(),
            reason: cause.to_string(),
            recorded_at: Utc::now(),
        };

        if let Err(e) = self.orphans.record(&orphan).await {
            error!(
                error = %e,
                storage_path,
                image_url,
                "Failed to record orphaned object"
            );
        }

        reporter.report(ScanEvent::new(
            request.attempt_id,
            ScanEventKind::OrphanedObject { orphan },
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(bytes: usize) -> SourceFile {
        SourceFile::new("lesion.jpg", None, vec![7u8; bytes])
    }

    #[test]
    fn test_request_validation() {
        assert!(ScanRequest::new("p1", file(10)).validate().is_ok());
        assert!(matches!(
            ScanRequest::new("  ", file(10)).validate(),
            Err(ScanError::Validation(_))
        ));
        assert!(matches!(
            ScanRequest::new("p1", file(0)).validate(),
            Err(ScanError::Validation(_))
        ));
    }

    #[test]
    fn test_clinical_note_limit_counts_chars() {
        let at_limit = "é".repeat(MAX_CLINICAL_NOTE_CHARS);
        assert!(ScanRequest::new("p1", file(1))
            .with_note(at_limit)
            .validate()
            .is_ok());

        let over = "a".repeat(MAX_CLINICAL_NOTE_CHARS + 1);
        assert!(matches!(
            ScanRequest::new("p1", file(1)).with_note(over).validate(),
            Err(ScanError::Validation(msg)) if msg.contains("501")
        ));
    }
}
