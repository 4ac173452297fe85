//! Generative chat assistant with a client-side transcript.

mod error;
mod gemini;
mod session;

pub use error::ChatError;
pub use gemini::{build_request_body, extract_reply, GeminiClient, GenerationSettings};
pub use session::{ChatRole, ChatSession, ChatTurn, CompletionClient};
