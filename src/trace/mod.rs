//! Decision tracing.
//!
//! Every branch the engine takes is recorded here with its rationale. The
//! trace is a side channel: it never influences what gets generated.

mod tracer;

pub use tracer::{DecisionEvent, DecisionTracer};

/// Trace domains used by the engine.
pub mod domain {
    pub const PATH: &str = "path";
    pub const VALIDATION: &str = "validation";
    pub const PREFLIGHT: &str = "preflight";
    pub const GENRE: &str = "genre";
    pub const MOOD: &str = "mood";
    pub const TEMPLATE: &str = "template";
    pub const COHERENCE: &str = "coherence";
    pub const THEMATIC: &str = "thematic";
    pub const CONTENT: &str = "content";
}
