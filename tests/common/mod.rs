//! Common test infrastructure
//!
//! Scripted model providers, a fixed probe and helpers for building engines.
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{engine_with, Reply, Script, ScriptedProvider, StaticProbe};
//!
//! #[tokio::test]
//! async fn test_title() {
//!     let provider = ScriptedProvider::new(Script::default().title(Reply::text("Neon Rain")));
//!     let (engine, _source, _probe) = engine_with(Some(provider), StaticProbe::ready());
//! }
//! ```

mod constants;
mod fakes;

pub use constants::*;
pub use fakes::{FakeProviderSource, Reply, Script, ScriptedProvider, StaticProbe};

use songsmith::generation::{EngineSettings, GenerationEngine};
use songsmith::llm::RetryPolicy;
use std::sync::Arc;
use std::time::Duration;

/// Settings with test-sized budgets and no retries.
pub fn fast_settings() -> EngineSettings {
    EngineSettings {
        thematic_budget: Duration::from_millis(400),
        genre_budget: Duration::from_millis(400),
        title_budget: Duration::from_millis(400),
        lyrics_budget: Duration::from_millis(400),
        retry: RetryPolicy::no_retry(),
        ..Default::default()
    }
}

/// An engine over a fake provider source and probe.
pub fn engine_with(
    provider: Option<Arc<ScriptedProvider>>,
    probe: StaticProbe,
) -> (GenerationEngine, Arc<FakeProviderSource>, Arc<StaticProbe>) {
    let source = Arc::new(FakeProviderSource::new(provider));
    let probe = Arc::new(probe);
    let engine = GenerationEngine::new(source.clone(), probe.clone()).with_settings(fast_settings());
    (engine, source, probe)
}
