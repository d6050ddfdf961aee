//! Per-call generation configuration snapshot.

use serde::{Deserialize, Serialize};

pub const DEFAULT_CREATIVITY_LEVEL: u8 = 50;
pub const DEFAULT_CLOUD_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_LOCAL_MODEL: &str = "llama3.2";
pub const DEFAULT_LOCAL_ENDPOINT: &str = "http://localhost:11434";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModeFlags {
    /// Render the prompt in Max Mode format.
    pub max_mode: bool,
    /// Generate lyrics alongside the prompt.
    pub lyrics_mode: bool,
    /// Use the local model server instead of the cloud provider.
    pub use_local_llm: bool,
    /// Ask for bracketed section tags in lyrics.
    pub use_suno_tags: bool,
    /// Attach the decision trace to the result.
    pub debug_mode: bool,
}

/// Read-only settings for one `generate()` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationConfig {
    pub flags: ModeFlags,
    /// 0-100. Coherence rules are enforced up to 60 and bypassed above.
    pub creativity_level: u8,
    pub cloud_model: String,
    pub local_model: String,
    pub local_endpoint: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            flags: ModeFlags::default(),
            creativity_level: DEFAULT_CREATIVITY_LEVEL,
            cloud_model: DEFAULT_CLOUD_MODEL.to_string(),
            local_model: DEFAULT_LOCAL_MODEL.to_string(),
            local_endpoint: DEFAULT_LOCAL_ENDPOINT.to_string(),
        }
    }
}

impl GenerationConfig {
    /// The model that LLM-backed steps will use.
    pub fn model(&self) -> &str {
        if self.flags.use_local_llm {
            &self.local_model
        } else {
            &self.cloud_model
        }
    }

    pub fn local_endpoint(&self) -> &str {
        &self.local_endpoint
    }

    pub fn with_flags(mut self, flags: ModeFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_creativity(mut self, level: u8) -> Self {
        self.creativity_level = level.min(100);
        self
    }
}
