//! Hybrid prompt generation engine.
//!
//! A deterministic template builder, optionally enriched by a language model,
//! gated by coherence rules, with fallbacks that keep every call usable when
//! the model is slow or missing.

mod coherence;
mod config;
mod content;
mod error;
mod orchestrator;
mod request;
mod resolver;
mod rng;
mod step;
mod template;
mod thematic;

pub use coherence::{
    check_coherence, is_strict, rules, validate_and_fix_coherence, CoherenceCheckResult,
    CoherenceFix, CoherenceRule, STRICT_THRESHOLD,
};
pub use config::{
    GenerationConfig, ModeFlags, DEFAULT_CLOUD_MODEL, DEFAULT_CREATIVITY_LEVEL, DEFAULT_LOCAL_ENDPOINT,
    DEFAULT_LOCAL_MODEL,
};
pub use content::{
    clean_title, deterministic_title, fallback_lyrics, generate_lyrics, generate_title,
    ContentBrief, FALLBACK_TITLE,
};
pub use error::GenerationError;
pub use orchestrator::{
    generate, select_path, EngineSettings, GenerationEngine, GenerationPath, GenerationResult,
    GenerationRuntime,
};
pub use request::{GenerationRequest, MAX_LOCKED_PHRASE_CHARS, MAX_LYRICS_TOPIC_CHARS, MAX_STYLES};
pub use resolver::{extract_mood, resolve_genre, GenreResolution, GenreSource};
pub use rng::{PromptRng, SeededRng};
pub use step::LlmStep;
pub use template::{
    DeterministicPromptResult, DirectInput, PromptMetadata, PromptMode, PromptSkeleton,
    ProductionDescriptor, TemplateInput, TemplateSelector, MAX_MODE_HEADER, MAX_PROMPT_CHARS,
};
pub use thematic::{extract_thematic_context, keyword_context, TempoHint, ThematicContext};
