//! Shared reqwest client construction for the remote collaborators.

use std::time::Duration;

use crate::config::HttpConfig;
use crate::error::ConfigError;

/// Longest slice of a remote error body kept for logs and errors.
const MAX_ERROR_BODY_LENGTH: usize = 200;

/// Builds the client used by the classifier, treatment and chat clients.
///
/// Only the connect phase is bounded by default; a request timeout is
/// applied when configured.
pub fn build_http_client(config: &HttpConfig) -> Result<reqwest::Client, ConfigError> {
    let mut builder = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs));

    if let Some(secs) = config.request_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    builder.build().map_err(ConfigError::HttpClient)
}

/// Truncates an error response body on a char boundary.
pub fn truncate_error_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated)", &body[..end])
}
