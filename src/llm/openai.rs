//! Cloud provider speaking the `/chat/completions` wire format.
//!
//! The same client serves any hosted backend that accepts that format; only
//! the base URL and the bearer token differ.

use super::http;
use super::provider::{CompletionOptions, LlmError, LlmProvider};
use super::types::{CompletionResponse, FinishReason, Message, TokenUsage};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

const KEY_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the bearer token comes from.
#[derive(Debug, Clone)]
pub enum ApiKeySource {
    None,
    Static(String),
    /// Re-run on every request, so short-lived tokens stay fresh.
    Command(String),
}

impl ApiKeySource {
    /// A literal key beats a key command.
    pub fn from_config(api_key: Option<String>, api_key_command: Option<String>) -> Self {
        if let Some(key) = api_key {
            return ApiKeySource::Static(key);
        }
        api_key_command.map_or(ApiKeySource::None, ApiKeySource::Command)
    }

    async fn resolve(&self) -> Result<Option<String>, LlmError> {
        match self {
            ApiKeySource::None => Ok(None),
            ApiKeySource::Static(key) => Ok(Some(key.clone())),
            ApiKeySource::Command(cmd) => run_key_command(cmd).await.map(Some),
        }
    }
}

async fn run_key_command(cmd: &str) -> Result<String, LlmError> {
    debug!(command = %cmd, "Resolving API key");
    let child = Command::new("sh")
        .arg("-c")
        .arg(cmd)
        .kill_on_drop(true)
        .output();

    let output = tokio::time::timeout(KEY_COMMAND_TIMEOUT, child)
        .await
        .map_err(|_| {
            warn!(command = %cmd, "Key command did not finish in time");
            LlmError::Timeout
        })?
        .map_err(|e| LlmError::Connection(format!("cannot run key command: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!(command = %cmd, status = %output.status, "Key command failed");
        return Err(LlmError::Connection(format!(
            "key command exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    let key = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if key.is_empty() {
        return Err(LlmError::Connection("key command printed nothing".to_string()));
    }
    Ok(key)
}

/// Hosted chat model.
pub struct OpenAIProvider {
    client: Client,
    base_url: String,
    model: String,
    api_key: ApiKeySource,
}

impl OpenAIProvider {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: ApiKeySource,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        }
    }

    async fn build_request(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<RequestBuilder, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: messages.iter().map(WireMessage::from).collect(),
            temperature: Some(options.temperature),
            max_tokens: options.max_tokens,
        };
        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .timeout(options.timeout)
            .json(&body);
        if let Some(key) = self.api_key.resolve().await? {
            builder = builder.bearer_auth(key);
        }
        Ok(builder)
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, LlmError> {
        let request = self.build_request(messages, options).await?;
        debug!(model = %self.model, messages = messages.len(), "Cloud completion request");

        let response = http::send(request, &options.cancellation).await?;
        let response = http::check_status(response, &options.cancellation).await?;
        let reply: ChatResponse =
            http::read_json(response, &options.cancellation, "chat completion").await?;

        let completion = reply.into_completion()?;
        debug!(model = %self.model, finish_reason = ?completion.finish_reason, "Cloud completion done");
        Ok(completion)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> From<&'a Message> for WireMessage<'a> {
    fn from(message: &'a Message) -> Self {
        Self {
            role: message.role.as_str(),
            content: &message.content,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl ChatResponse {
    fn into_completion(self) -> Result<CompletionResponse, LlmError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("reply has no choices".to_string()))?;

        Ok(CompletionResponse {
            message: Message::assistant(choice.message.content.unwrap_or_default()),
            finish_reason: match choice.finish_reason.as_deref() {
                Some("length") => FinishReason::MaxTokens,
                _ => FinishReason::Stop,
            },
            usage: self.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_message_roles() {
        let user = Message::user("Hello");
        let wire = WireMessage::from(&user);
        assert_eq!(wire.role, "user");
        assert_eq!(wire.content, "Hello");

        let system = Message::system("You are a lyricist");
        assert_eq!(WireMessage::from(&system).role, "system");
    }

    #[test]
    fn test_api_key_source_from_config() {
        assert!(matches!(
            ApiKeySource::from_config(Some("k".into()), Some("cmd".into())),
            ApiKeySource::Static(_)
        ));
        assert!(matches!(
            ApiKeySource::from_config(None, Some("cmd".into())),
            ApiKeySource::Command(_)
        ));
        assert!(matches!(
            ApiKeySource::from_config(None, None),
            ApiKeySource::None
        ));
    }

    #[test]
    fn test_reply_to_completion() {
        let json = r#"{
            "choices": [{"message": {"content": "Paper Moons"}, "finish_reason": "length"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 3, "total_tokens": 13}
        }"#;
        let reply: ChatResponse = serde_json::from_str(json).unwrap();
        let completion = reply.into_completion().unwrap();
        assert_eq!(completion.message.content, "Paper Moons");
        assert_eq!(completion.finish_reason, FinishReason::MaxTokens);
        assert_eq!(completion.usage.unwrap().total_tokens, 13);
    }

    #[test]
    fn test_reply_without_choices_is_invalid() {
        let reply: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            reply.into_completion(),
            Err(LlmError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_static_key_is_returned() {
        let source = ApiKeySource::Static("secret".to_string());
        assert_eq!(source.resolve().await.unwrap(), Some("secret".to_string()));
        assert_eq!(ApiKeySource::None.resolve().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_command_key_is_trimmed() {
        let source = ApiKeySource::Command("echo '  rotating-token  '".to_string());
        assert_eq!(
            source.resolve().await.unwrap(),
            Some("rotating-token".to_string())
        );
    }

    #[tokio::test]
    async fn test_command_empty_key_is_error() {
        let source = ApiKeySource::Command("true".to_string());
        assert!(matches!(
            source.resolve().await,
            Err(LlmError::Connection(_))
        ));
    }
}
