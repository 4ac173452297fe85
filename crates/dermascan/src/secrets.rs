//! Secret resolution for service credentials (the chat API key today).
//!
//! A secret may be given in three ways, checked in this order:
//!
//! 1. **Direct value** in the config file, for local testing.
//! 2. **File reference**, for the Docker secrets pattern.
//! 3. **Environment variable**, for production deployments.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No secret source provided (need one of: value, file, or env var)")]
    NoSourceProvided,

    #[error("Failed to read secret from file '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Environment variable '{name}' not set")]
    EnvVarNotSet { name: String },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },
}

/// Where a secret can be read from. All fields are optional in config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_var: Option<String>,
}

impl SecretSource {
    pub fn from_env_var(name: &str) -> Self {
        Self {
            env_var: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// True when at least one non-empty source is configured.
    pub fn is_configured(&self) -> bool {
        [&self.value, &self.file, &self.env_var]
            .iter()
            .any(|s| s.as_deref().is_some_and(|s| !s.is_empty()))
    }

    pub fn resolve(&self) -> Result<SecretString, SecretError> {
        if let Some(value) = non_empty(&self.value) {
            return Ok(SecretString::from(value.to_string()));
        }

        if let Some(path) = non_empty(&self.file) {
            let expanded = expand_home(path);
            return fs::read_to_string(&expanded)
                .map(|content| SecretString::from(content.trim().to_string()))
                .map_err(|source| SecretError::FileRead {
                    path: expanded,
                    source,
                });
        }

        if let Some(name) = non_empty(&self.env_var) {
            return match std::env::var(name) {
                // env vars often carry a trailing newline when set from files
                Ok(value) => Ok(SecretString::from(value.trim().to_string())),
                Err(std::env::VarError::NotPresent) => Err(SecretError::EnvVarNotSet {
                    name: name.to_string(),
                }),
                Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
                    name: name.to_string(),
                }),
            };
        }

        Err(SecretError::NoSourceProvided)
    }

    /// Like [`resolve`](Self::resolve) but a missing source is `Ok(None)`.
    pub fn resolve_optional(&self) -> Result<Option<SecretString>, SecretError> {
        match self.resolve() {
            Ok(secret) => Ok(Some(secret)),
            Err(SecretError::NoSourceProvided) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Expands a leading `~` to the current user's home directory.
fn expand_home(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_direct_value_wins() {
        let source = SecretSource {
            value: Some("direct".to_string()),
            file: Some("/nonexistent".to_string()),
            env_var: Some("DERMASCAN_TEST_UNUSED".to_string()),
        };
        assert_eq!(source.resolve().unwrap().expose_secret(), "direct");
    }

    #[test]
    fn test_file_is_trimmed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  from-file  ").unwrap();

        let source = SecretSource {
            file: Some(file.path().to_string_lossy().to_string()),
            ..SecretSource::default()
        };
        assert_eq!(source.resolve().unwrap().expose_secret(), "from-file");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let source = SecretSource {
            file: Some("/definitely/not/here".to_string()),
            ..SecretSource::default()
        };
        assert!(matches!(
            source.resolve(),
            Err(SecretError::FileRead { .. })
        ));
    }

    #[test]
    #[serial]
    fn test_env_var_source() {
        std::env::set_var("DERMASCAN_TEST_SECRET", "from-env\n");
        let source = SecretSource::from_env_var("DERMASCAN_TEST_SECRET");
        assert_eq!(source.resolve().unwrap().expose_secret(), "from-env");
        std::env::remove_var("DERMASCAN_TEST_SECRET");
    }

    #[test]
    #[serial]
    fn test_unset_env_var() {
        std::env::remove_var("DERMASCAN_TEST_MISSING");
        let source = SecretSource::from_env_var("DERMASCAN_TEST_MISSING");
        assert!(matches!(
            source.resolve(),
            Err(SecretError::EnvVarNotSet { .. })
        ));
    }

    #[test]
    fn test_empty_sources_are_ignored() {
        let source = SecretSource {
            value: Some(String::new()),
            file: None,
            env_var: Some(String::new()),
        };
        assert!(!source.is_configured());
        assert!(source.resolve_optional().unwrap().is_none());
    }
}
