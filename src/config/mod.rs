mod file_config;

pub use file_config::{EngineConfig, FileConfig, LocalConfig, LlmConfig};

use crate::generation::{
    EngineSettings, GenerationConfig, ModeFlags, DEFAULT_CLOUD_MODEL, DEFAULT_CREATIVITY_LEVEL,
    DEFAULT_LOCAL_ENDPOINT, DEFAULT_LOCAL_MODEL,
};
use crate::llm::{ApiKeySource, CloudBackend, ProviderKind, RetryPolicy, MAX_ATTEMPTS_CAP};
use anyhow::{bail, Result};
use std::time::Duration;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub max_mode: bool,
    pub lyrics_mode: bool,
    pub use_local_llm: bool,
    pub use_suno_tags: bool,
    pub debug_mode: bool,
    pub creativity_level: u8,
    pub provider: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub local_endpoint: Option<String>,
    pub local_model: Option<String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            max_mode: false,
            lyrics_mode: false,
            use_local_llm: false,
            use_suno_tags: false,
            debug_mode: false,
            creativity_level: DEFAULT_CREATIVITY_LEVEL,
            provider: None,
            base_url: None,
            model: None,
            api_key: None,
            local_endpoint: None,
            local_model: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub generation: GenerationConfig,
    pub llm: LlmSettings,
    pub engine: EngineSettings,
}

/// Connection settings for the cloud provider.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub kind: ProviderKind,
    pub base_url: String,
    pub api_key: Option<String>,
    pub api_key_command: Option<String>,
    /// False when nothing points at a usable cloud backend; the engine then
    /// runs its deterministic steps only.
    pub configured: bool,
}

impl LlmSettings {
    pub fn backend(&self) -> Option<CloudBackend> {
        if !self.configured {
            return None;
        }
        Some(CloudBackend {
            kind: self.kind,
            base_url: self.base_url.clone(),
            api_key: ApiKeySource::from_config(
                self.api_key.clone(),
                self.api_key_command.clone(),
            ),
        })
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let creativity_level = file.creativity_level.unwrap_or(cli.creativity_level);
        if creativity_level > 100 {
            bail!(
                "creativity_level must be between 0 and 100, got {}",
                creativity_level
            );
        }

        let flags = ModeFlags {
            max_mode: file.max_mode.unwrap_or(cli.max_mode),
            lyrics_mode: file.lyrics_mode.unwrap_or(cli.lyrics_mode),
            use_local_llm: file.use_local_llm.unwrap_or(cli.use_local_llm),
            use_suno_tags: file.use_suno_tags.unwrap_or(cli.use_suno_tags),
            debug_mode: file.debug_mode.unwrap_or(cli.debug_mode),
        };

        // LLM settings - TOML [llm] section takes precedence over CLI args
        let llm_file = file.llm.unwrap_or_default();
        let provider_name = llm_file.provider.or_else(|| cli.provider.clone());
        let kind = match &provider_name {
            Some(name) => match name.parse::<ProviderKind>() {
                Ok(kind) => kind,
                Err(e) => bail!("Invalid [llm] provider: {}", e),
            },
            None => ProviderKind::default(),
        };
        let explicit_base_url = llm_file.base_url.or_else(|| cli.base_url.clone());
        let api_key = llm_file.api_key.or_else(|| cli.api_key.clone());
        let api_key_command = llm_file.api_key_command;
        let configured = provider_name.is_some()
            || explicit_base_url.is_some()
            || api_key.is_some()
            || api_key_command.is_some();
        let base_url = explicit_base_url.unwrap_or_else(|| match kind {
            ProviderKind::OpenAi => DEFAULT_OPENAI_BASE_URL.to_string(),
            ProviderKind::Ollama => DEFAULT_LOCAL_ENDPOINT.to_string(),
        });
        let llm = LlmSettings {
            kind,
            base_url,
            api_key,
            api_key_command,
            configured,
        };

        let local_file = file.local.unwrap_or_default();
        let generation = GenerationConfig {
            flags,
            creativity_level,
            cloud_model: llm_file
                .model
                .or_else(|| cli.model.clone())
                .unwrap_or_else(|| DEFAULT_CLOUD_MODEL.to_string()),
            local_model: local_file
                .model
                .or_else(|| cli.local_model.clone())
                .unwrap_or_else(|| DEFAULT_LOCAL_MODEL.to_string()),
            local_endpoint: local_file
                .endpoint
                .or_else(|| cli.local_endpoint.clone())
                .unwrap_or_else(|| DEFAULT_LOCAL_ENDPOINT.to_string()),
        };

        // Engine settings - merge file config with defaults
        let defaults = EngineSettings::default();
        let engine_file = file.engine.unwrap_or_default();
        let engine = EngineSettings {
            thematic_budget: millis_or(engine_file.thematic_timeout_ms, defaults.thematic_budget),
            genre_budget: millis_or(engine_file.genre_timeout_ms, defaults.genre_budget),
            title_budget: millis_or(engine_file.title_timeout_ms, defaults.title_budget),
            lyrics_budget: millis_or(engine_file.lyrics_timeout_ms, defaults.lyrics_budget),
            retry: RetryPolicy {
                max_attempts: engine_file
                    .max_retries
                    .map(|r| r.saturating_add(1))
                    .unwrap_or(defaults.retry.max_attempts),
                initial_backoff: millis_or(
                    engine_file.initial_backoff_ms,
                    defaults.retry.initial_backoff,
                ),
                max_backoff: millis_or(engine_file.max_backoff_ms, defaults.retry.max_backoff),
                backoff_multiplier: engine_file
                    .backoff_multiplier
                    .unwrap_or(defaults.retry.backoff_multiplier),
            },
            temperature: llm_file.temperature.unwrap_or(defaults.temperature),
            request_timeout: llm_file
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            max_prompt_chars: engine_file
                .max_prompt_chars
                .unwrap_or(defaults.max_prompt_chars),
            probe_ttl: engine_file
                .probe_ttl_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.probe_ttl),
        };
        validate_engine(&engine)?;

        Ok(Self {
            generation,
            llm,
            engine,
        })
    }
}

fn millis_or(value: Option<u64>, default: Duration) -> Duration {
    value.map(Duration::from_millis).unwrap_or(default)
}

fn validate_engine(engine: &EngineSettings) -> Result<()> {
    for (name, budget) in [
        ("thematic_timeout_ms", engine.thematic_budget),
        ("genre_timeout_ms", engine.genre_budget),
        ("title_timeout_ms", engine.title_budget),
        ("lyrics_timeout_ms", engine.lyrics_budget),
        ("request_timeout_secs", engine.request_timeout),
    ] {
        if budget.is_zero() {
            bail!("{} must be greater than zero", name);
        }
    }
    if engine.retry.max_attempts > MAX_ATTEMPTS_CAP {
        bail!(
            "max_retries must be at most {}, got {}",
            MAX_ATTEMPTS_CAP - 1,
            engine.retry.max_attempts - 1
        );
    }
    if engine.retry.backoff_multiplier < 1.0 {
        bail!(
            "backoff_multiplier must be at least 1.0, got {}",
            engine.retry.backoff_multiplier
        );
    }
    if !(0.0..=2.0).contains(&engine.temperature) {
        bail!("temperature must be between 0.0 and 2.0, got {}", engine.temperature);
    }
    if engine.max_prompt_chars == 0 {
        bail!("max_prompt_chars must be greater than zero");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_resolve_cli_only() {
        let cli = CliConfig {
            max_mode: true,
            lyrics_mode: true,
            creativity_level: 75,
            model: Some("gpt-4o".to_string()),
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, None).unwrap();

        assert!(config.generation.flags.max_mode);
        assert!(config.generation.flags.lyrics_mode);
        assert!(!config.generation.flags.use_local_llm);
        assert_eq!(config.generation.creativity_level, 75);
        assert_eq!(config.generation.cloud_model, "gpt-4o");
        assert_eq!(config.generation.local_model, DEFAULT_LOCAL_MODEL);
        assert_eq!(config.llm.kind, ProviderKind::OpenAi);
        assert_eq!(config.llm.base_url, DEFAULT_OPENAI_BASE_URL);
        assert!(config.llm.backend().is_some());
        assert_eq!(config.engine, EngineSettings::default());
    }

    #[test]
    fn test_no_cloud_backend_without_credentials() {
        let config = AppConfig::resolve(&CliConfig::default(), None).unwrap();
        assert!(!config.llm.configured);
        assert!(config.llm.backend().is_none());
    }

    #[test]
    fn test_resolve_toml_overrides_cli() {
        let cli = CliConfig {
            creativity_level: 20,
            model: Some("cli-model".to_string()),
            local_endpoint: Some("http://cli:11434".to_string()),
            ..Default::default()
        };
        let file = write_config(
            r#"
lyrics_mode = true
use_local_llm = true
creativity_level = 90

[llm]
provider = "ollama"
base_url = "http://gpu-box:11434"
model = "file-model"
temperature = 0.4

[local]
endpoint = "http://file:11434"
model = "mistral"

[engine]
thematic_timeout_ms = 2500
max_retries = 1
probe_ttl_secs = 5
"#,
        );

        let file_config = FileConfig::load(file.path()).unwrap();
        let config = AppConfig::resolve(&cli, Some(file_config)).unwrap();

        assert!(config.generation.flags.lyrics_mode);
        assert!(config.generation.flags.use_local_llm);
        assert_eq!(config.generation.creativity_level, 90);
        assert_eq!(config.generation.cloud_model, "file-model");
        assert_eq!(config.generation.local_model, "mistral");
        assert_eq!(config.generation.local_endpoint, "http://file:11434");
        assert_eq!(config.llm.kind, ProviderKind::Ollama);
        assert_eq!(config.llm.base_url, "http://gpu-box:11434");
        assert_eq!(config.engine.thematic_budget, Duration::from_millis(2500));
        assert_eq!(config.engine.retry.max_attempts, 2);
        assert_eq!(config.engine.probe_ttl, Duration::from_secs(5));
        assert_eq!(config.engine.temperature, 0.4);
        assert_eq!(
            config.engine.lyrics_budget,
            EngineSettings::default().lyrics_budget
        );
    }

    #[test]
    fn test_rejects_out_of_range_creativity() {
        let file = FileConfig {
            creativity_level: Some(101),
            ..Default::default()
        };
        let err = AppConfig::resolve(&CliConfig::default(), Some(file)).unwrap_err();
        assert!(err.to_string().contains("creativity_level"));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let file = FileConfig {
            engine: Some(EngineConfig {
                lyrics_timeout_ms: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = AppConfig::resolve(&CliConfig::default(), Some(file)).unwrap_err();
        assert!(err.to_string().contains("lyrics_timeout_ms"));
    }

    #[test]
    fn test_rejects_unknown_provider() {
        let cli = CliConfig {
            provider: Some("carrier-pigeon".to_string()),
            ..Default::default()
        };
        let err = AppConfig::resolve(&cli, None).unwrap_err();
        assert!(err.to_string().contains("carrier-pigeon"));
    }

    #[test]
    fn test_rejects_too_many_retries() {
        let file = FileConfig {
            engine: Some(EngineConfig {
                max_retries: Some(25),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&CliConfig::default(), Some(file)).is_err());
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let file = write_config("creativity_level = \"very\"");
        let err = FileConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
