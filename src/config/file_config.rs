use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Generation settings (can override CLI)
    pub max_mode: Option<bool>,
    pub lyrics_mode: Option<bool>,
    pub use_local_llm: Option<bool>,
    pub use_suno_tags: Option<bool>,
    pub debug_mode: Option<bool>,
    pub creativity_level: Option<u8>,

    // Sections
    pub llm: Option<LlmConfig>,
    pub local: Option<LocalConfig>,
    pub engine: Option<EngineConfig>,
}

/// `[llm]`: the cloud provider.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct LlmConfig {
    /// "openai" or "ollama"
    pub provider: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    /// Shell command printing the API key, for rotating tokens.
    pub api_key_command: Option<String>,
    pub temperature: Option<f32>,
    pub request_timeout_secs: Option<u64>,
}

/// `[local]`: the local model server used by the offline path.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct LocalConfig {
    pub endpoint: Option<String>,
    pub model: Option<String>,
}

/// `[engine]`: per-step budgets and retries.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct EngineConfig {
    pub thematic_timeout_ms: Option<u64>,
    pub genre_timeout_ms: Option<u64>,
    pub title_timeout_ms: Option<u64>,
    pub lyrics_timeout_ms: Option<u64>,
    pub max_retries: Option<u32>,
    pub initial_backoff_ms: Option<u64>,
    pub max_backoff_ms: Option<u64>,
    pub backoff_multiplier: Option<f64>,
    pub max_prompt_chars: Option<usize>,
    pub probe_ttl_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
