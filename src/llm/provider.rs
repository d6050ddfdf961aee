//! LLM provider trait definition.

use super::types::{CompletionResponse, FinishReason, Message};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Options for a completion request.
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    /// Temperature for sampling (0.0 = deterministic, 1.0 = creative).
    pub temperature: f32,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Request timeout for a single HTTP attempt.
    pub timeout: Duration,
    /// Cancelling this token aborts the in-flight request.
    pub cancellation: CancellationToken,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: None,
            timeout: Duration::from_secs(120),
            cancellation: CancellationToken::new(),
        }
    }
}

impl CompletionOptions {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }
}

/// Errors that can occur when interacting with an LLM provider.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Rate limited")]
    RateLimited,

    #[error("Request timeout")]
    Timeout,

    #[error("Request cancelled")]
    Cancelled,

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl LlmError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Connection(_) | LlmError::RateLimited | LlmError::Timeout => true,
            LlmError::Api { status, .. } => *status >= 500,
            LlmError::InvalidResponse(_)
            | LlmError::EmptyResponse
            | LlmError::Cancelled
            | LlmError::Serialization(_) => false,
        }
    }

    /// Map a transport error from reqwest.
    pub(crate) fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Connection(e.to_string())
        }
    }
}

/// Trait for LLM providers.
///
/// Cloud and local backends are interchangeable behind this trait. Implementations
/// must stop work promptly once `options.cancellation` fires.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider's name (e.g., "ollama", "openai").
    fn name(&self) -> &str;

    /// Get the model being used.
    fn model(&self) -> &str;

    /// Complete a conversation.
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, LlmError>;

    /// Run a single system + user exchange and return the assistant text.
    ///
    /// Blank output is an error. Output cut by the token limit is still
    /// returned, with a warning, so callers can decide what to do with it.
    async fn invoke(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, LlmError> {
        let messages = [Message::system(system_prompt), Message::user(user_prompt)];
        let response = self.complete(&messages, options).await?;

        let content = response.message.content.trim().to_string();
        if content.is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        if response.finish_reason == FinishReason::MaxTokens {
            warn!(
                provider = self.name(),
                model = self.model(),
                chars = content.len(),
                "Completion hit the token limit, returning partial output"
            );
        }

        Ok(content)
    }
}
