//! The scan workflow: select an image, preview it, classify it, upload it,
//! and record it against a patient.
//!
//! [`ScanService`] runs one attempt end to end and reports what happens as
//! [`ScanEvent`]s. [`ScanController`] owns the session's current attempt and
//! drops events from attempts that have since been replaced or removed.
//! [`ScanHistory`] handles deletion from a patient's scan list.

mod attempt;
mod controller;
mod error;
mod events;
mod history;
mod preview;
mod progress;
mod service;

pub use attempt::{AttemptId, AttemptPhase, FailedStage, ScanAttempt};
pub use controller::ScanController;
pub use error::ScanError;
pub use events::{NoopReporter, ScanEvent, ScanEventBroadcaster, ScanEventKind, ScanReporter};
pub use history::{AlwaysConfirm, Confirm, ConfirmRequest, DeleteOutcome, ScanHistory};
pub use preview::{render_preview, PREVIEW_MAX_DIMENSION};
pub use progress::{progress_ratio, UploadProgress, UploadStage};
pub use service::{ScanOutcome, ScanRequest, ScanService, MAX_CLINICAL_NOTE_CHARS};
