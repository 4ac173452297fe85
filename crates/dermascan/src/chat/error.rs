use thiserror::Error;

use crate::secrets::SecretError;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Prompt is empty")]
    EmptyPrompt,

    #[error("Chat request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Chat service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Chat response contained no reply text")]
    MissingReply,

    #[error("Invalid chat endpoint '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("Chat API key unavailable: {0}")]
    ApiKey(#[from] SecretError),
}
