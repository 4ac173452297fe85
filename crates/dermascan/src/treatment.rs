//! Treatment information lookup by disease name.

use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::config::TreatmentConfig;
use crate::error::TreatmentError;
use crate::http::truncate_error_body;

/// Raw payload of `GET {baseUrl}/{diseaseName}`.
#[derive(Debug, Clone, Deserialize)]
struct TreatmentResponse {
    #[serde(default)]
    image_url: Option<String>,
    disease_name: String,
    #[serde(default)]
    description: String,
    /// Comma-separated list.
    #[serde(default)]
    symptoms: String,
    #[serde(default)]
    treatment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentInfo {
    pub image_url: Option<String>,
    pub disease_name: String,
    pub description: String,
    pub symptoms: Vec<String>,
    pub treatment: String,
}

impl From<TreatmentResponse> for TreatmentInfo {
    fn from(raw: TreatmentResponse) -> Self {
        Self {
            image_url: raw.image_url.filter(|u| !u.is_empty()),
            disease_name: raw.disease_name,
            description: raw.description,
            symptoms: split_symptoms(&raw.symptoms),
            treatment: raw.treatment,
        }
    }
}

fn split_symptoms(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub struct TreatmentClient {
    client: Client,
    base_url: Url,
}

impl TreatmentClient {
    pub fn new(client: Client, base_url: &str) -> Result<Self, TreatmentError> {
        let base_url = Url::parse(base_url).map_err(|e| TreatmentError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(TreatmentError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "URL cannot be a base".to_string(),
            });
        }
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &TreatmentConfig, client: Client) -> Result<Self, TreatmentError> {
        Self::new(client, &config.base_url)
    }

    /// `{baseUrl}/{disease}`, with the disease name as one encoded segment.
    pub fn lookup_url(&self, disease: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(disease);
        }
        url
    }

    pub async fn lookup(&self, disease: &str) -> Result<TreatmentInfo, TreatmentError> {
        let disease = disease.trim();
        if disease.is_empty() {
            return Err(TreatmentError::NotFound(String::new()));
        }

        let url = self.lookup_url(disease);
        tracing::debug!(%url, "Looking up treatment");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(TreatmentError::NotFound(disease.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TreatmentError::Status {
                status: status.as_u16(),
                body: truncate_error_body(&body),
            });
        }

        let raw: TreatmentResponse = response.json().await?;
        Ok(raw.into())
    }
}
