use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Per-patient async locks serializing read-modify-write of a scan list.
///
/// Two writers for different patients never contend; two writers for the
/// same patient queue in arrival order (tokio's mutex is fair).
#[derive(Clone, Default)]
pub struct PatientLocks {
    inner: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

/// Exclusive access to one patient's scan list. The table entry goes away
/// with the last guard, so the table only holds patients in use.
pub struct PatientGuard {
    guard: Option<OwnedMutexGuard<()>>,
    locks: PatientLocks,
    patient_id: String,
}

impl Drop for PatientGuard {
    fn drop(&mut self) {
        // The mutex must be unlocked before the entry can be released.
        drop(self.guard.take());
        self.locks.release(&self.patient_id);
    }
}

impl PatientLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for and returns the guard for `patient_id`.
    pub async fn lock(&self, patient_id: &str) -> PatientGuard {
        let entry = {
            let mut map = self.table();
            map.entry(patient_id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        let guard = entry.lock_owned().await;
        PatientGuard {
            guard: Some(guard),
            locks: self.clone(),
            patient_id: patient_id.to_string(),
        }
    }

    fn table(&self) -> MutexGuard<'_, HashMap<String, Arc<AsyncMutex<()>>>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Removes the entry for `patient_id` once only the table refers to it.
    fn release(&self, patient_id: &str) {
        let mut map = self.table();
        if map
            .get(patient_id)
            .is_some_and(|m| Arc::strong_count(m) == 1)
        {
            map.remove(patient_id);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
