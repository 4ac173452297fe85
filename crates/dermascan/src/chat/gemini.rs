use async_trait::async_trait;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};

use super::session::{ChatRole, ChatTurn, CompletionClient};
use super::ChatError;
use crate::config::ChatConfig;
use crate::http::truncate_error_body;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl From<&ChatConfig> for GenerationSettings {
    fn from(config: &ChatConfig) -> Self {
        Self {
            temperature: config.temperature,
            top_k: config.top_k,
            top_p: config.top_p,
            max_output_tokens: config.max_output_tokens,
        }
    }
}

/// `generateContent` client for Gemini-style models.
pub struct GeminiClient {
    client: Client,
    url: Url,
    api_key: SecretString,
    settings: GenerationSettings,
}

impl GeminiClient {
    pub fn new(
        client: Client,
        endpoint: &str,
        model: &str,
        api_key: SecretString,
        settings: GenerationSettings,
    ) -> Result<Self, ChatError> {
        let raw = format!(
            "{}/{}:generateContent",
            endpoint.trim_end_matches('/'),
            model
        );
        let url = Url::parse(&raw).map_err(|e| ChatError::InvalidEndpoint {
            url: raw.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            url,
            api_key,
            settings,
        })
    }

    /// Resolves the API key from the configured secret sources.
    pub fn from_config(config: &ChatConfig, client: Client) -> Result<Self, ChatError> {
        let api_key = config.api_key.resolve()?;
        Self::new(
            client,
            &config.endpoint,
            &config.model,
            api_key,
            GenerationSettings::from(config),
        )
    }

    /// Request URL without the key.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

pub fn build_request_body(transcript: &[ChatTurn], settings: &GenerationSettings) -> Value {
    let contents: Vec<Value> = transcript
        .iter()
        .map(|turn| {
            let role = match turn.role {
                ChatRole::User => "user",
                ChatRole::Model => "model",
            };
            json!({ "role": role, "parts": [{ "text": turn.text }] })
        })
        .collect();

    json!({
        "contents": contents,
        "generationConfig": {
            "temperature": settings.temperature,
            "topK": settings.top_k,
            "topP": settings.top_p,
            "maxOutputTokens": settings.max_output_tokens,
        }
    })
}

/// `candidates[0].content.parts[0].text`
pub fn extract_reply(body: &Value) -> Result<String, ChatError> {
    body.pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(ChatError::MissingReply)
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn complete(&self, transcript: &[ChatTurn]) -> Result<String, ChatError> {
        let body = build_request_body(transcript, &self.settings);

        let mut url = self.url.clone();
        url.query_pairs_mut()
            .append_pair("key", self.api_key.expose_secret());

        tracing::debug!(url = %self.url, turns = transcript.len(), "Requesting chat completion");

        let response = self.client.post(url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Status {
                status: status.as_u16(),
                body: truncate_error_body(&body),
            });
        }

        let reply: Value = response.json().await?;
        extract_reply(&reply)
    }
}
