//! LLM provider abstraction layer.
//!
//! This module provides a trait-based abstraction for LLM providers,
//! allowing the engine to work with a cloud backend (OpenAI-compatible)
//! or a local one (Ollama) interchangeably.

mod bounded;
mod http;
mod ollama;
mod openai;
mod provider;
mod retry_policy;
mod source;
mod types;

pub use bounded::{invoke_bounded, invoke_with_retry};
pub use ollama::OllamaProvider;
pub use openai::{ApiKeySource, OpenAIProvider};
pub use provider::{CompletionOptions, LlmError, LlmProvider};
pub use retry_policy::{RetryPolicy, MAX_ATTEMPTS_CAP};
pub use source::{CloudBackend, HttpProviderSource, ProviderKind, ProviderSource};
pub use types::{CompletionResponse, FinishReason, Message, MessageRole, TokenUsage};
