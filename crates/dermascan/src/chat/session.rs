use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ChatError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

impl ChatRole {
    fn export_label(self) -> &'static str {
        match self {
            ChatRole::User => "You",
            ChatRole::Model => "Assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// Produces the next model turn for a whole transcript.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, transcript: &[ChatTurn]) -> Result<String, ChatError>;
}

/// Append-only conversation. Every request carries the full transcript.
pub struct ChatSession<C> {
    client: C,
    transcript: Vec<ChatTurn>,
}

impl<C: CompletionClient> ChatSession<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            transcript: Vec::new(),
        }
    }

    /// Sends a prompt and returns the reply.
    ///
    /// On failure the user turn is removed again, so the transcript keeps
    /// alternating user and model turns.
    pub async fn send(&mut self, prompt: &str) -> Result<String, ChatError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ChatError::EmptyPrompt);
        }

        self.transcript.push(ChatTurn {
            role: ChatRole::User,
            text: prompt.to_string(),
            at: Utc::now(),
        });

        match self.client.complete(&self.transcript).await {
            Ok(reply) => {
                self.transcript.push(ChatTurn {
                    role: ChatRole::Model,
                    text: reply.clone(),
                    at: Utc::now(),
                });
                Ok(reply)
            }
            Err(e) => {
                self.transcript.pop();
                tracing::warn!(error = %e, "Chat completion failed");
                Err(e)
            }
        }
    }

    pub fn clear(&mut self) {
        self.transcript.clear();
    }

    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    /// Plain-text export, one block per turn.
    pub fn export_text(&self) -> String {
        self.transcript
            .iter()
            .map(|turn| {
                format!(
                    "[{}] {}: {}",
                    turn.at.format("%Y-%m-%d %H:%M:%S"),
                    turn.role.export_label(),
                    turn.text
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
