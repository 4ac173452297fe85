use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;

use super::{Classifier, SourceFile};
use crate::config::{ClassifierBackend, ClassifierConfig};
use crate::error::{ClassifierError, ConfigError};
use crate::http::truncate_error_body;
use crate::sanitize::{redact_file_name, redact_url};

/// Multipart field the prediction services read the image from.
const UPLOAD_FIELD: &str = "fileup";

/// Fields tried, in order, when the backend does not name one.
const DEFAULT_RESPONSE_FIELDS: &[&str] = &["prediction", "predicted_class"];

/// Client for a `POST {url}` multipart prediction endpoint.
pub struct HttpClassifier {
    client: Client,
    backend_name: String,
    url: String,
    response_field: Option<String>,
}

impl HttpClassifier {
    pub fn new(client: Client, backend_name: &str, backend: &ClassifierBackend) -> Self {
        Self {
            client,
            backend_name: backend_name.to_string(),
            url: backend.url.clone(),
            response_field: backend.response_field.clone(),
        }
    }

    /// Builds a client for the configured active backend.
    pub fn from_config(config: &ClassifierConfig, client: Client) -> Result<Self, ConfigError> {
        let backend = config
            .active_backend()
            .ok_or_else(|| ConfigError::UnknownBackend {
                name: config.active.clone(),
            })?;
        Ok(Self::new(client, &config.active, backend))
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }
}

/// Pulls the label out of a prediction response.
///
/// Services disagree on the field name, so an explicit field is used when
/// configured and the known names are tried otherwise. Blank labels count
/// as missing.
pub fn extract_prediction(body: &Value, field: Option<&str>) -> Result<String, ClassifierError> {
    let candidates: Vec<&str> = match field {
        Some(f) => vec![f],
        None => DEFAULT_RESPONSE_FIELDS.to_vec(),
    };

    candidates
        .into_iter()
        .filter_map(|name| body.get(name).and_then(Value::as_str))
        .map(str::trim)
        .find(|label| !label.is_empty())
        .map(str::to_string)
        .ok_or(ClassifierError::MissingPrediction)
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, file: &SourceFile) -> Result<String, ClassifierError> {
        let part = Part::bytes(file.bytes.to_vec())
            .file_name(redact_file_name(&file.file_name))
            .mime_str(&file.mime_type)
            .map_err(|_| ClassifierError::InvalidMimeType(file.mime_type.clone()))?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        tracing::debug!(
            backend = %self.backend_name,
            url = %redact_url(&self.url),
            bytes = file.bytes.len(),
            "Sending image for classification"
        );

        let response = self.client.post(&self.url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Status {
                status: status.as_u16(),
                body: truncate_error_body(&body),
            });
        }

        let body: Value = response.json().await?;
        extract_prediction(&body, self.response_field.as_deref())
    }
}
