use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::secrets::SecretSource;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub version: String,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub treatment: TreatmentConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Named prediction backends; exactly one is active at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifierConfig {
    #[serde(default = "default_backend_name")]
    pub active: String,
    #[serde(default = "default_backends")]
    pub backends: BTreeMap<String, ClassifierBackend>,
}

impl ClassifierConfig {
    pub fn active_backend(&self) -> Option<&ClassifierBackend> {
        self.backends.get(&self.active)
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            active: default_backend_name(),
            backends: default_backends(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifierBackend {
    pub url: String,
    /// Response field carrying the label. When unset, `prediction` and then
    /// `predicted_class` are tried.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_field: Option<String>,
}

fn default_backend_name() -> String {
    "local".to_string()
}

fn default_backends() -> BTreeMap<String, ClassifierBackend> {
    let mut backends = BTreeMap::new();
    backends.insert(
        default_backend_name(),
        ClassifierBackend {
            url: "http://127.0.0.1:5000/predict".to_string(),
            response_field: None,
        },
    );
    backends
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentConfig {
    #[serde(default = "default_treatment_url")]
    pub base_url: String,
}

fn default_treatment_url() -> String {
    "http://localhost:3000/api/disease".to_string()
}

impl Default for TreatmentConfig {
    fn default() -> Self {
        Self {
            base_url: default_treatment_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    pub root: String,
    pub public_base_url: String,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_chunk_size() -> usize {
    64 * 1024
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConfig {
    #[serde(default)]
    pub path: Option<String>,
}

impl DatabaseConfig {
    /// Configured path, or `~/.dermascan/data/dermascan.db`.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        match &self.path {
            Some(p) if !p.is_empty() => Some(PathBuf::from(p)),
            _ => crate::db::default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatConfig {
    #[serde(default = "default_chat_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_chat_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_api_key")]
    pub api_key: SecretSource,
}

fn default_chat_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1/models".to_string()
}

fn default_chat_model() -> String {
    "gemini-2.5-flash-lite".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_k() -> u32 {
    40
}

fn default_top_p() -> f32 {
    0.95
}

fn default_max_output_tokens() -> u32 {
    1024
}

fn default_api_key() -> SecretSource {
    SecretSource::from_env_var("DERMASCAN_CHAT_API_KEY")
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: default_chat_endpoint(),
            model: default_chat_model(),
            temperature: default_temperature(),
            top_k: default_top_k(),
            top_p: default_top_p(),
            max_output_tokens: default_max_output_tokens(),
            api_key: default_api_key(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// No request timeout unless set; large uploads may take a while.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
