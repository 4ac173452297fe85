use std::path::Path;

use reqwest::Url;

use crate::config::schema::Config;
use crate::error::ConfigError;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.classifier.backends.is_empty() {
        return Err(ConfigError::Validation {
            message: "At least one classifier backend must be configured".to_string(),
        });
    }

    if config.classifier.active_backend().is_none() {
        return Err(ConfigError::UnknownBackend {
            name: config.classifier.active.clone(),
        });
    }

    for (name, backend) in &config.classifier.backends {
        validate_http_url(&format!("classifier.backends.{}.url", name), &backend.url)?;
    }

    validate_http_url("treatment.baseUrl", &config.treatment.base_url)?;
    validate_http_url("storage.publicBaseUrl", &config.storage.public_base_url)?;
    validate_http_url("chat.endpoint", &config.chat.endpoint)?;

    if config.storage.root.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "storage.root must not be empty".to_string(),
        });
    }

    if config.storage.chunk_size == 0 {
        return Err(ConfigError::Validation {
            message: "storage.chunkSize must be greater than zero".to_string(),
        });
    }

    let chat = &config.chat;
    if !(0.0..=2.0).contains(&chat.temperature) {
        return Err(ConfigError::Validation {
            message: format!("chat.temperature out of range: {}", chat.temperature),
        });
    }
    if !(0.0..=1.0).contains(&chat.top_p) {
        return Err(ConfigError::Validation {
            message: format!("chat.topP out of range: {}", chat.top_p),
        });
    }
    if chat.max_output_tokens == 0 {
        return Err(ConfigError::Validation {
            message: "chat.maxOutputTokens must be greater than zero".to_string(),
        });
    }

    if config.http.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation {
            message: "http.connectTimeoutSecs must be greater than zero".to_string(),
        });
    }

    Ok(())
}

fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
        field: field.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidUrl {
            field: field.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}
