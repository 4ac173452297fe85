//! Scan workflow events and their fan-out to subscribers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use super::attempt::{AttemptId, AttemptPhase, FailedStage};
use super::progress::UploadStage;
use crate::records::{OrphanedObject, ScanRecord};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ScanEventKind {
    PhaseChanged {
        phase: AttemptPhase,
    },
    PreviewReady {
        data_uri: String,
    },
    /// `fallback` is set when classification failed and the placeholder
    /// label is used instead.
    PredictionReady {
        label: String,
        fallback: bool,
    },
    UploadProgress {
        ratio: u8,
        stage: UploadStage,
        bytes_transferred: u64,
        total_bytes: u64,
    },
    /// The storage backend confirmed the object and returned its URL.
    Uploaded {
        image_url: String,
    },
    Completed {
        record: ScanRecord,
    },
    Failed {
        stage: FailedStage,
        error: String,
    },
    OrphanedObject {
        orphan: OrphanedObject,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanEvent {
    pub attempt_id: AttemptId,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: ScanEventKind,
}

impl ScanEvent {
    pub fn new(attempt_id: AttemptId, kind: ScanEventKind) -> Self {
        Self {
            attempt_id,
            timestamp: Utc::now(),
            kind,
        }
    }

    pub fn phase(attempt_id: AttemptId, phase: AttemptPhase) -> Self {
        Self::new(attempt_id, ScanEventKind::PhaseChanged { phase })
    }

    pub fn failed(attempt_id: AttemptId, stage: FailedStage, error: &str) -> Self {
        Self::new(
            attempt_id,
            ScanEventKind::Failed {
                stage,
                error: error.to_string(),
            },
        )
    }
}

/// Receives events as a scan attempt progresses.
pub trait ScanReporter: Send + Sync {
    fn report(&self, event: ScanEvent);
}

/// Discards every event.
pub struct NoopReporter;

impl ScanReporter for NoopReporter {
    fn report(&self, _event: ScanEvent) {}
}

/// Broadcasts scan events to any number of subscribers.
#[derive(Clone)]
pub struct ScanEventBroadcaster {
    sender: Arc<broadcast::Sender<ScanEvent>>,
}

impl ScanEventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn send(&self, event: ScanEvent) {
        // no subscribers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ScanEvent> {
        self.sender.subscribe()
    }
}

impl Default for ScanEventBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}

impl ScanReporter for ScanEventBroadcaster {
    fn report(&self, event: ScanEvent) {
        self.send(event);
    }
}
