//! Scripted stand-ins for the remote collaborators.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{mpsc, Notify};

use dermascan::classifier::{Classifier, SourceFile};
use dermascan::error::{ClassifierError, RecordStoreError, StorageError};
use dermascan::records::{Patient, RecordStore, ScanRecord};
use dermascan::storage::{ObjectStore, UploadSnapshot};
use dermascan::workflow::{Confirm, ConfirmRequest, ScanEvent, ScanEventKind, ScanReporter};

/// Blocks until `release` is called. Used to hold a remote call open.
#[derive(Clone, Default)]
pub struct Gate {
    notify: Arc<Notify>,
    open: Arc<AtomicBool>,
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn release(&self) {
        self.open.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            if self.open.load(Ordering::SeqCst) {
                return;
            }
            notified.await;
        }
    }
}

enum ClassifierMode {
    Label(String),
    Fail(String),
}

pub struct ScriptedClassifier {
    mode: ClassifierMode,
    gate: Option<Gate>,
    calls: AtomicUsize,
}

impl ScriptedClassifier {
    pub fn label(label: &str) -> Self {
        Self {
            mode: ClassifierMode::Label(label.to_string()),
            gate: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            mode: ClassifierMode::Fail(reason.to_string()),
            gate: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn gated(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(&self, _file: &SourceFile) -> Result<String, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.wait().await;
        }
        match &self.mode {
            ClassifierMode::Label(label) => Ok(label.clone()),
            ClassifierMode::Fail(reason) => Err(ClassifierError::Unavailable(reason.clone())),
        }
    }
}

#[derive(Clone)]
enum StoreFailure {
    None,
    /// Fails after reporting this many bytes.
    MidStream(u64),
    /// Accepts every byte, then fails to finalize.
    Finalize,
}

/// Object store that keeps objects in memory and reports scripted
/// progress.
pub struct FakeObjectStore {
    url: Option<String>,
    progress: Option<Vec<u64>>,
    failure: StoreFailure,
    gate: Option<Gate>,
    objects: Mutex<Vec<(String, usize)>>,
}

impl FakeObjectStore {
    pub fn new() -> Self {
        Self {
            url: None,
            progress: None,
            failure: StoreFailure::None,
            gate: None,
            objects: Mutex::new(Vec::new()),
        }
    }

    /// Every object gets this URL instead of `https://store/{path}`.
    pub fn with_url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }

    /// Reports exactly these `bytes_transferred` values.
    pub fn with_progress(mut self, transferred: Vec<u64>) -> Self {
        self.progress = Some(transferred);
        self
    }

    pub fn failing_mid_stream(mut self, after_bytes: u64) -> Self {
        self.failure = StoreFailure::MidStream(after_bytes);
        self
    }

    pub fn failing_on_finalize(mut self) -> Self {
        self.failure = StoreFailure::Finalize;
        self
    }

    pub fn gated(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn stored_paths(&self) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .map(|(p, _)| p.clone())
            .collect()
    }
}

#[async_trait]
impl ObjectStore for FakeObjectStore {
    async fn put(
        &self,
        path: &str,
        bytes: &[u8],
        progress: mpsc::UnboundedSender<UploadSnapshot>,
    ) -> Result<(), StorageError> {
        if let Some(gate) = &self.gate {
            gate.wait().await;
        }

        let total_bytes = bytes.len() as u64;
        let script = self
            .progress
            .clone()
            .unwrap_or_else(|| (0..=4).map(|q| total_bytes * q / 4).collect());

        for transferred in script {
            if let StoreFailure::MidStream(limit) = self.failure {
                if transferred > limit {
                    return Err(StorageError::Rejected("connection reset".to_string()));
                }
            }
            let _ = progress.send(UploadSnapshot {
                bytes_transferred: transferred,
                total_bytes,
            });
            tokio::task::yield_now().await;
        }

        if let StoreFailure::Finalize = self.failure {
            return Err(StorageError::Rejected("finalize failed".to_string()));
        }

        self.objects
            .lock()
            .unwrap()
            .push((path.to_string(), bytes.len()));
        Ok(())
    }

    async fn download_url(&self, path: &str) -> Result<String, StorageError> {
        let known = self.objects.lock().unwrap().iter().any(|(p, _)| p == path);
        if !known {
            return Err(StorageError::NotFound(path.to_string()));
        }
        Ok(self
            .url
            .clone()
            .unwrap_or_else(|| format!("https://store/{}", path)))
    }
}

/// Wraps a real store and fails selected operations on demand.
pub struct FlakyRecordStore {
    inner: Arc<dyn RecordStore>,
    pub fail_append: AtomicBool,
    pub fail_set_disease: AtomicBool,
    pub fail_replace: AtomicBool,
}

impl FlakyRecordStore {
    pub fn new(inner: Arc<dyn RecordStore>) -> Self {
        Self {
            inner,
            fail_append: AtomicBool::new(false),
            fail_set_disease: AtomicBool::new(false),
            fail_replace: AtomicBool::new(false),
        }
    }

    fn check(flag: &AtomicBool) -> Result<(), RecordStoreError> {
        if flag.load(Ordering::SeqCst) {
            Err(RecordStoreError::Unavailable("store offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RecordStore for FlakyRecordStore {
    async fn get_patient(&self, patient_id: &str) -> Result<Patient, RecordStoreError> {
        self.inner.get_patient(patient_id).await
    }

    async fn create_patient(&self, patient: &Patient) -> Result<(), RecordStoreError> {
        self.inner.create_patient(patient).await
    }

    async fn replace_scans(
        &self,
        patient_id: &str,
        scans: &[ScanRecord],
    ) -> Result<(), RecordStoreError> {
        Self::check(&self.fail_replace)?;
        self.inner.replace_scans(patient_id, scans).await
    }

    async fn set_current_disease(
        &self,
        patient_id: &str,
        disease: &str,
    ) -> Result<(), RecordStoreError> {
        Self::check(&self.fail_set_disease)?;
        self.inner.set_current_disease(patient_id, disease).await
    }

    async fn append_scan(
        &self,
        patient_id: &str,
        record: ScanRecord,
    ) -> Result<(), RecordStoreError> {
        Self::check(&self.fail_append)?;
        self.inner.append_scan(patient_id, record).await
    }
}

/// Keeps every reported event.
#[derive(Default)]
pub struct CollectingReporter {
    events: Mutex<Vec<ScanEvent>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ScanEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn progress_ratios(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|e| match e.kind {
                ScanEventKind::UploadProgress { ratio, .. } => Some(ratio),
                _ => None,
            })
            .collect()
    }
}

impl ScanReporter for CollectingReporter {
    fn report(&self, event: ScanEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Answers every confirmation with a fixed choice and remembers the asks.
pub struct ScriptedConfirm {
    answer: bool,
    asked: Mutex<Vec<ConfirmRequest>>,
}

impl ScriptedConfirm {
    pub fn yes() -> Self {
        Self {
            answer: true,
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn no() -> Self {
        Self {
            answer: false,
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> Vec<ConfirmRequest> {
        self.asked.lock().unwrap().clone()
    }
}

#[async_trait]
impl Confirm for ScriptedConfirm {
    async fn confirm(&self, request: &ConfirmRequest) -> bool {
        self.asked.lock().unwrap().push(request.clone());
        self.answer
    }
}

pub fn source_file(name: &str, size: usize) -> SourceFile {
    SourceFile::new(name, None, vec![0xA5u8; size])
}
