//! Songsmith
//!
//! Turns a free-text song description into a generation prompt, a title and
//! optionally lyrics. The library exposes the engine and its collaborators
//! for embedding and testing.

pub mod config;
pub mod generation;
pub mod llm;
pub mod probe;
pub mod registry;
pub mod trace;

// Re-export commonly used types for convenience
pub use generation::{
    generate, GenerationConfig, GenerationEngine, GenerationError, GenerationRequest,
    GenerationResult, GenerationRuntime,
};
pub use trace::{DecisionEvent, DecisionTracer};
