//! Local model availability probing.
//!
//! The offline generation path must know, before doing anything else, whether
//! the local model server is reachable and has the configured model installed.

mod cache;
mod ollama_probe;

pub use cache::{CachedProbe, Clock, SystemClock};
pub use ollama_probe::OllamaProbe;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result of a local model availability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeStatus {
    /// The local server answered.
    pub available: bool,
    /// The required model is installed on the server.
    pub has_required_model: bool,
}

impl ProbeStatus {
    pub fn ready() -> Self {
        Self {
            available: true,
            has_required_model: true,
        }
    }

    pub fn unreachable() -> Self {
        Self::default()
    }

    pub fn missing_model() -> Self {
        Self {
            available: true,
            has_required_model: false,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.available && self.has_required_model
    }
}

/// Checks whether a local model endpoint can serve a given model.
///
/// Probes never fail: transport problems are reported as `available = false`.
#[async_trait]
pub trait ModelProbe: Send + Sync {
    async fn check_available(&self, endpoint: &str, model: &str) -> ProbeStatus;

    /// Drop any cached knowledge. No-op for uncached probes.
    fn invalidate(&self) {}
}
