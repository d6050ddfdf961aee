//! Where the engine gets its providers from.

use super::ollama::OllamaProvider;
use super::openai::{ApiKeySource, OpenAIProvider};
use super::provider::LlmProvider;
use reqwest::Client;
use std::str::FromStr;
use std::sync::Arc;

/// Hands out providers for one generation call.
pub trait ProviderSource: Send + Sync {
    /// The cloud provider for `model`, if one is configured.
    fn cloud(&self, model: &str) -> Option<Arc<dyn LlmProvider>>;

    /// A provider talking to the local model server at `endpoint`.
    fn local(&self, endpoint: &str, model: &str) -> Arc<dyn LlmProvider>;
}

/// Wire protocol of the cloud backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Ollama,
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "openai-compatible" => Ok(ProviderKind::OpenAi),
            "ollama" => Ok(ProviderKind::Ollama),
            other => Err(format!(
                "unknown provider kind '{}' (expected 'openai' or 'ollama')",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CloudBackend {
    pub kind: ProviderKind,
    pub base_url: String,
    pub api_key: ApiKeySource,
}

/// Builds HTTP providers that share one `reqwest::Client`.
pub struct HttpProviderSource {
    client: Client,
    cloud: Option<CloudBackend>,
}

impl HttpProviderSource {
    pub fn new(cloud: Option<CloudBackend>) -> Self {
        Self::with_client(Client::new(), cloud)
    }

    pub fn with_client(client: Client, cloud: Option<CloudBackend>) -> Self {
        Self { client, cloud }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl ProviderSource for HttpProviderSource {
    fn cloud(&self, model: &str) -> Option<Arc<dyn LlmProvider>> {
        let backend = self.cloud.as_ref()?;
        let provider: Arc<dyn LlmProvider> = match backend.kind {
            ProviderKind::OpenAi => Arc::new(OpenAIProvider::new(
                self.client.clone(),
                &backend.base_url,
                model,
                backend.api_key.clone(),
            )),
            ProviderKind::Ollama => Arc::new(OllamaProvider::with_client(
                self.client.clone(),
                &backend.base_url,
                model,
            )),
        };
        Some(provider)
    }

    fn local(&self, endpoint: &str, model: &str) -> Arc<dyn LlmProvider> {
        Arc::new(OllamaProvider::with_client(
            self.client.clone(),
            endpoint,
            model,
        ))
    }
}
