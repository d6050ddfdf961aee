//! Ollama LLM provider implementation.

use super::http;
use super::provider::{CompletionOptions, LlmError, LlmProvider};
use super::types::{CompletionResponse, FinishReason, Message, TokenUsage};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Ollama LLM provider.
///
/// Connects to a local Ollama server and uses its `/api/chat` endpoint
/// for non-streaming completions.
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    /// Create a new Ollama provider.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the Ollama server (e.g., "http://localhost:11434").
    /// * `model` - Model to use (e.g., "llama3.1:8b").
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url, model)
    }

    /// Create a provider that shares an existing HTTP client.
    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    /// Convert our messages to Ollama's format.
    fn to_ollama_messages(messages: &[Message]) -> Vec<OllamaMessage> {
        messages.iter().map(|m| m.into()).collect()
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, LlmError> {
        let url = format!("{}/api/chat", self.base_url);

        let request = OllamaChatRequest {
            model: self.model.clone(),
            messages: Self::to_ollama_messages(messages),
            stream: false,
            options: Some(OllamaOptions {
                temperature: Some(options.temperature),
                num_predict: options.max_tokens.map(|n| n as i32),
            }),
        };

        debug!(
            model = %self.model,
            message_count = messages.len(),
            "Sending completion request to Ollama"
        );

        let builder = self
            .client
            .post(&url)
            .json(&request)
            .timeout(options.timeout);

        let response = http::send(builder, &options.cancellation).await?;
        let response = http::check_status(response, &options.cancellation).await?;
        let ollama_response: OllamaChatResponse =
            http::read_json(response, &options.cancellation, "Ollama").await?;

        let finish_reason = if ollama_response.done_reason.as_deref() == Some("length") {
            FinishReason::MaxTokens
        } else {
            FinishReason::Stop
        };

        let usage = Some(TokenUsage {
            prompt_tokens: ollama_response.prompt_eval_count.unwrap_or(0),
            completion_tokens: ollama_response.eval_count.unwrap_or(0),
            total_tokens: ollama_response.prompt_eval_count.unwrap_or(0)
                + ollama_response.eval_count.unwrap_or(0),
        });

        debug!(
            finish_reason = ?finish_reason,
            "Received completion response from Ollama"
        );

        Ok(CompletionResponse {
            message: Message::assistant(ollama_response.message.content),
            finish_reason,
            usage,
        })
    }
}

// Ollama API types

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

impl From<&Message> for OllamaMessage {
    fn from(msg: &Message) -> Self {
        OllamaMessage {
            role: msg.role.as_str().to_string(),
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}
