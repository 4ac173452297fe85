use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{broadcast, watch};
use tracing::{debug, trace};

use super::attempt::{AttemptId, AttemptPhase, ScanAttempt};
use super::error::ScanError;
use super::events::{ScanEvent, ScanEventBroadcaster, ScanEventKind, ScanReporter};
use super::preview::render_preview;
use super::service::{ScanOutcome, ScanRequest, ScanService};
use crate::classifier::SourceFile;

/// One user's scan session: at most one current attempt.
///
/// Selecting a new file or removing the current one replaces the attempt.
/// Work still running for the old attempt finishes, but its events no
/// longer touch session state and are not broadcast.
#[derive(Clone)]
pub struct ScanController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    service: Arc<ScanService>,
    current: Mutex<Option<ScanAttempt>>,
    broadcaster: ScanEventBroadcaster,
    latest_disease: watch::Sender<Option<String>>,
}

impl ControllerInner {
    fn current(&self) -> MutexGuard<'_, Option<ScanAttempt>> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ScanReporter for ControllerInner {
    fn report(&self, event: ScanEvent) {
        {
            let mut current = self.current();
            match current.as_mut() {
                Some(attempt) if attempt.id == event.attempt_id => attempt.apply(&event),
                _ => {
                    trace!(attempt_id = %event.attempt_id, "Dropping event of a stale attempt");
                    return;
                }
            }
        }

        if let ScanEventKind::PredictionReady {
            label,
            fallback: false,
        } = &event.kind
        {
            self.latest_disease.send_replace(Some(label.clone()));
        }
        self.broadcaster.send(event);
    }
}

impl ScanController {
    pub fn new(service: Arc<ScanService>) -> Self {
        Self::with_broadcaster(service, ScanEventBroadcaster::default())
    }

    pub fn with_broadcaster(service: Arc<ScanService>, broadcaster: ScanEventBroadcaster) -> Self {
        let (latest_disease, _) = watch::channel(None);
        Self {
            inner: Arc::new(ControllerInner {
                service,
                current: Mutex::new(None),
                broadcaster,
                latest_disease,
            }),
        }
    }

    /// Starts a new attempt for `file`, discarding any current one.
    ///
    /// The preview is rendered in the background when a Tokio runtime is
    /// available and arrives as a `PreviewReady` event.
    pub fn select_file(&self, file: SourceFile) -> Result<AttemptId, ScanError> {
        if file.is_empty() {
            return Err(ScanError::Validation(
                "Please select a file first".to_string(),
            ));
        }

        let attempt = ScanAttempt::new(file);
        let id = attempt.id;
        let bytes = Arc::clone(&attempt.source.bytes);

        let previous = self.inner.current().replace(attempt);
        if let Some(previous) = previous {
            debug!(previous = %previous.id, current = %id, "Replacing scan attempt");
        }
        self.inner
            .broadcaster
            .send(ScanEvent::phase(id, AttemptPhase::Selecting));

        self.spawn_preview(id, bytes);
        Ok(id)
    }

    fn spawn_preview(&self, id: AttemptId, bytes: Arc<[u8]>) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!(attempt_id = %id, "No runtime, skipping preview");
            return;
        };

        let inner = Arc::clone(&self.inner);
        handle.spawn(async move {
            let rendered = tokio::task::spawn_blocking(move || render_preview(&bytes)).await;
            if let Ok(Some(data_uri)) = rendered {
                inner.report(ScanEvent::new(
                    id,
                    ScanEventKind::PreviewReady { data_uri },
                ));
            }
        });
    }

    /// Discards the current attempt. Late results for it are ignored.
    pub fn remove_file(&self) {
        if let Some(previous) = self.inner.current().take() {
            debug!(attempt_id = %previous.id, "Scan attempt removed");
        }
    }

    /// Runs the current attempt for `patient_id`.
    ///
    /// Fails with `Validation` when no file is selected or the attempt was
    /// already submitted. The attempt runs on its own task: dropping the
    /// returned future abandons the attempt but does not cancel it, so it
    /// still reaches `Done` or `Failed`.
    pub async fn submit(
        &self,
        patient_id: &str,
        clinical_note: &str,
    ) -> Result<ScanOutcome, ScanError> {
        let request = {
            let mut current = self.inner.current();
            let attempt = current
                .as_mut()
                .ok_or_else(|| ScanError::Validation("Please select a file first".to_string()))?;

            if attempt.phase != AttemptPhase::Selecting {
                return Err(ScanError::Validation(format!(
                    "Scan already submitted ({})",
                    attempt.phase
                )));
            }

            let request = ScanRequest {
                attempt_id: attempt.id,
                patient_id: patient_id.trim().to_string(),
                file: attempt.source.clone(),
                clinical_note: clinical_note.trim().to_string(),
            };
            request.validate()?;

            attempt.transition(AttemptPhase::Classifying);
            request
        };

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move { inner.service.run(request, &*inner).await });
        task.await.map_err(ScanError::Task)?
    }

    /// Copy of the current attempt, if any.
    pub fn snapshot(&self) -> Option<ScanAttempt> {
        self.inner.current().clone()
    }

    pub fn current_phase(&self) -> AttemptPhase {
        self.inner
            .current()
            .as_ref()
            .map(|a| a.phase)
            .unwrap_or(AttemptPhase::Idle)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ScanEvent> {
        self.inner.broadcaster.subscribe()
    }

    /// Most recent real classification of an attempt that was current
    /// when its result arrived.
    pub fn latest_disease(&self) -> watch::Receiver<Option<String>> {
        self.inner.latest_disease.subscribe()
    }

    pub fn service(&self) -> &Arc<ScanService> {
        &self.inner.service
    }
}
