#![allow(dead_code)]

/// LLM port — the single seam between the app and any chat-completion provider.
///
/// ARCHITECTURAL RULE: no other module may talk to a provider API directly.
/// Everything goes through `ChatCompletionPort`, and provider quirks (JSON
/// mode support, fence-wrapped output, SSE framing) are flattened inside the
/// implementation so downstream code never special-cases a provider.
use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

pub mod groq;

/// Role tag for a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// One role-tagged message in a chat-completion request.
#[derive(Debug, Clone)]
pub struct Message {
    pub role: ChatRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Per-call options for a chat completion.
#[derive(Debug, Clone, Copy)]
pub struct ChatOptions {
    /// Ask the provider to constrain output to a single JSON object.
    pub json_mode: bool,
    pub temperature: f32,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            json_mode: false,
            temperature: 0.0,
        }
    }
}

/// One incremental text fragment from a streaming response.
#[derive(Debug, Clone)]
pub struct Delta {
    pub text: String,
}

/// Ordered, lazy, finite sequence of deltas terminated by end-of-stream.
pub type DeltaStream = BoxStream<'static, Result<Delta, TransportError>>;

/// Failure at the provider/connection level, before or during a call.
/// Distinct from decode/validation failures: a dropped stream must never be
/// reported as unparseable output.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("Provider returned empty content")]
    EmptyContent,

    #[error("Stream ended unexpectedly: {0}")]
    StreamClosed(String),
}

/// Abstract chat-completion capability: one-shot or streaming.
#[async_trait]
pub trait ChatCompletionPort: Send + Sync {
    /// Sends the messages and returns the full response text.
    async fn send(&self, messages: &[Message], options: ChatOptions)
        -> Result<String, TransportError>;

    /// Sends the messages and returns a stream of text deltas.
    /// Deltas arrive in provider order; the stream is finite and not restartable.
    async fn stream(
        &self,
        messages: &[Message],
        options: ChatOptions,
    ) -> Result<DeltaStream, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_as_str() {
        assert_eq!(ChatRole::System.as_str(), "system");
        assert_eq!(ChatRole::User.as_str(), "user");
        assert_eq!(ChatRole::Assistant.as_str(), "assistant");
    }

    #[test]
    fn test_default_options_are_deterministic() {
        let options = ChatOptions::default();
        assert!(!options.json_mode);
        assert_eq!(options.temperature, 0.0);
    }
}
