//! Ollama availability probe via `/api/tags`.

use super::{ModelProbe, ProbeStatus};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

pub struct OllamaProbe {
    client: Client,
    timeout: Duration,
}

impl OllamaProbe {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            timeout: PROBE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Whether `installed` satisfies `required`.
///
/// Ollama reports untagged models as `name:latest`, so `llama3` matches
/// `llama3:latest` and vice versa.
pub(crate) fn model_matches(installed: &str, required: &str) -> bool {
    fn normalize(name: &str) -> String {
        let name = name.trim().to_lowercase();
        if name.contains(':') {
            name
        } else {
            format!("{}:latest", name)
        }
    }
    normalize(installed) == normalize(required)
}

#[async_trait]
impl ModelProbe for OllamaProbe {
    async fn check_available(&self, endpoint: &str, model: &str) -> ProbeStatus {
        let url = format!("{}/api/tags", endpoint.trim_end_matches('/'));

        let response = match self.client.get(&url).timeout(self.timeout).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(endpoint = %endpoint, error = %e, "Local model server unreachable");
                return ProbeStatus::unreachable();
            }
        };

        if !response.status().is_success() {
            warn!(
                endpoint = %endpoint,
                status = response.status().as_u16(),
                "Local model server returned an error"
            );
            return ProbeStatus::unreachable();
        }

        let tags: OllamaTagsResponse = match response.json().await {
            Ok(tags) => tags,
            Err(e) => {
                warn!(endpoint = %endpoint, error = %e, "Failed to parse tags response");
                return ProbeStatus::unreachable();
            }
        };

        let has_required_model = tags.models.iter().any(|m| model_matches(&m.name, model));
        if !has_required_model {
            warn!(
                model = %model,
                available_models = ?tags.models.iter().map(|m| &m.name).collect::<Vec<_>>(),
                "Configured model not found in Ollama"
            );
        } else {
            debug!(model = %model, endpoint = %endpoint, "Local model available");
        }

        ProbeStatus {
            available: true,
            has_required_model,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<OllamaModel>,
}

#[derive(Debug, Deserialize)]
struct OllamaModel {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_matching() {
        assert!(model_matches("llama3.1:8b", "llama3.1:8b"));
        assert!(model_matches("llama3:latest", "llama3"));
        assert!(model_matches("llama3", "llama3:latest"));
        assert!(model_matches("Mistral:Latest", "mistral"));
        assert!(!model_matches("llama3.1:70b", "llama3.1:8b"));
        assert!(!model_matches("llama3", "llama3.1"));
    }

    #[test]
    fn test_tags_parsing() {
        let json = r#"{"models": [{"name": "llama3.1:8b", "size": 123}, {"name": "qwen2:7b"}]}"#;
        let tags: OllamaTagsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(tags.models.len(), 2);
        assert_eq!(tags.models[1].name, "qwen2:7b");

        let empty: OllamaTagsResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.models.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let probe = OllamaProbe::new(Client::new()).with_timeout(Duration::from_millis(200));
        // Nothing listens on port 1 of the loopback interface.
        let status = probe
            .check_available("http://127.0.0.1:1", "llama3.1:8b")
            .await;
        assert_eq!(status, ProbeStatus::unreachable());
    }
}
