use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::events::{ScanEvent, ScanEventKind};
use super::progress::UploadProgress;
use crate::classifier::SourceFile;

/// Identifies one scan attempt. Results carrying another id are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttemptId(Uuid);

impl AttemptId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AttemptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedStage {
    Upload,
    Persist,
}

impl std::fmt::Display for FailedStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailedStage::Upload => write!(f, "upload"),
            FailedStage::Persist => write!(f, "persist"),
        }
    }
}

/// `Idle → Selecting → Classifying → Uploading → Persisting → Done`, with
/// `Failed` reachable from `Uploading` and `Persisting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "stage", rename_all = "snake_case")]
pub enum AttemptPhase {
    Idle,
    Selecting,
    Classifying,
    Uploading,
    Persisting,
    Done,
    Failed(FailedStage),
}

impl AttemptPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AttemptPhase::Done | AttemptPhase::Failed(_))
    }

    pub fn can_transition_to(&self, next: AttemptPhase) -> bool {
        use AttemptPhase::*;
        matches!(
            (*self, next),
            (Idle, Selecting)
                | (Selecting, Classifying)
                | (Classifying, Uploading)
                | (Uploading, Persisting)
                | (Uploading, Failed(FailedStage::Upload))
                | (Persisting, Done)
                | (Persisting, Failed(FailedStage::Persist))
        )
    }
}

impl std::fmt::Display for AttemptPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptPhase::Idle => write!(f, "Idle"),
            AttemptPhase::Selecting => write!(f, "Selecting"),
            AttemptPhase::Classifying => write!(f, "Classifying"),
            AttemptPhase::Uploading => write!(f, "Uploading"),
            AttemptPhase::Persisting => write!(f, "Persisting"),
            AttemptPhase::Done => write!(f, "Done"),
            AttemptPhase::Failed(stage) => write!(f, "Failed ({})", stage),
        }
    }
}

/// Session-side view of one attempt, built up from its events.
#[derive(Debug, Clone)]
pub struct ScanAttempt {
    pub id: AttemptId,
    pub source: SourceFile,
    pub preview_data_uri: Option<String>,
    pub predicted_label: Option<String>,
    pub upload: UploadProgress,
    pub storage_url: Option<String>,
    pub phase: AttemptPhase,
    pub error: Option<String>,
}

impl ScanAttempt {
    /// A fresh attempt in `Selecting`. Nothing carries over from earlier
    /// attempts.
    pub fn new(source: SourceFile) -> Self {
        Self {
            id: AttemptId::new(),
            source,
            preview_data_uri: None,
            predicted_label: None,
            upload: UploadProgress::default(),
            storage_url: None,
            phase: AttemptPhase::Selecting,
            error: None,
        }
    }

    /// Moves to `next` if that is a legal step. Repeating the current phase
    /// is accepted as a no-op.
    pub fn transition(&mut self, next: AttemptPhase) -> bool {
        if self.phase == next {
            return true;
        }
        if !self.phase.can_transition_to(next) {
            tracing::debug!(attempt_id = %self.id, from = %self.phase, to = %next, "Ignoring phase change");
            return false;
        }
        self.phase = next;
        true
    }

    /// Applies an event of this attempt. Events of other attempts are
    /// ignored.
    pub fn apply(&mut self, event: &ScanEvent) {
        if event.attempt_id != self.id {
            return;
        }

        match &event.kind {
            ScanEventKind::PhaseChanged { phase } => {
                self.transition(*phase);
            }
            ScanEventKind::PreviewReady { data_uri } => {
                self.preview_data_uri = Some(data_uri.clone());
            }
            ScanEventKind::PredictionReady { label, .. } => {
                self.predicted_label = Some(label.clone());
            }
            ScanEventKind::UploadProgress { ratio, .. } => {
                self.upload.advance_to(*ratio);
            }
            ScanEventKind::Uploaded { image_url } => {
                self.storage_url = Some(image_url.clone());
            }
            ScanEventKind::Completed { .. } => {
                self.transition(AttemptPhase::Done);
            }
            ScanEventKind::Failed { stage, error } => {
                if self.transition(AttemptPhase::Failed(*stage)) {
                    self.error = Some(error.clone());
                }
            }
            ScanEventKind::OrphanedObject { .. } => {}
        }
    }
}
