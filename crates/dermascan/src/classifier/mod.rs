//! Remote skin-lesion classification.

mod http;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ClassifierError;

pub use http::{extract_prediction, HttpClassifier};

/// Label recorded when classification fails. The scan is still stored.
pub const DIAGNOSIS_NOT_AVAILABLE: &str = "Diagnosis Not Available";

/// The image a clinician picked, shared cheaply between workflow steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Arc<[u8]>,
}

impl SourceFile {
    /// Guesses the MIME type from the file name when none is supplied.
    pub fn new(
        file_name: impl Into<String>,
        mime_type: Option<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        let file_name = file_name.into();
        let mime_type = mime_type.filter(|m| !m.is_empty()).unwrap_or_else(|| {
            mime_guess::from_path(&file_name)
                .first_or_octet_stream()
                .to_string()
        });
        Self {
            file_name,
            mime_type,
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[async_trait]
pub trait Classifier: Send + Sync {
    /// Returns the predicted disease label for the image.
    async fn classify(&self, file: &SourceFile) -> Result<String, ClassifierError>;
}
