//! Append-only decision tracer.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// A single recorded decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DecisionEvent {
    /// Unique identifier for this event.
    pub id: String,
    /// Append order within the tracer (0-indexed).
    pub sequence: u64,
    /// Unix timestamp (milliseconds).
    pub timestamp_ms: i64,
    /// Subsystem that made the decision (see [`super::domain`]).
    pub domain: String,
    /// What was being decided.
    pub key: String,
    /// Which branch was taken.
    pub branch_taken: String,
    /// Human-readable reason for the branch.
    pub rationale: String,
    /// Additional selection metadata (JSON).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Collects decision events from concurrently running generation steps.
///
/// Recording is best-effort: it never panics and never blocks generation on a
/// poisoned lock (the event is dropped instead). Events land in completion
/// order; [`DecisionTracer::events`] sorts by timestamp for display.
pub struct DecisionTracer {
    events: Mutex<Vec<DecisionEvent>>,
    sequence: AtomicU64,
}

impl DecisionTracer {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            sequence: AtomicU64::new(0),
        }
    }

    /// Record a decision.
    pub fn record(
        &self,
        domain: &str,
        key: &str,
        branch_taken: impl Into<String>,
        rationale: impl Into<String>,
    ) {
        self.push(domain, key, branch_taken.into(), rationale.into(), None);
    }

    /// Record a decision with metadata about the selection.
    pub fn record_with_metadata(
        &self,
        domain: &str,
        key: &str,
        branch_taken: impl Into<String>,
        rationale: impl Into<String>,
        metadata: serde_json::Value,
    ) {
        self.push(
            domain,
            key,
            branch_taken.into(),
            rationale.into(),
            Some(metadata),
        );
    }

    fn push(
        &self,
        domain: &str,
        key: &str,
        branch_taken: String,
        rationale: String,
        metadata: Option<serde_json::Value>,
    ) {
        debug!(
            domain = %domain,
            key = %key,
            branch = %branch_taken,
            rationale = %rationale,
            "decision"
        );

        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        let event = DecisionEvent {
            id: Uuid::new_v4().to_string(),
            sequence,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            domain: domain.to_string(),
            key: key.to_string(),
            branch_taken,
            rationale,
            metadata,
        };

        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    /// Snapshot of all events, sorted by timestamp then append order.
    pub fn events(&self) -> Vec<DecisionEvent> {
        let mut events = match self.events.lock() {
            Ok(events) => events.clone(),
            Err(_) => return Vec::new(),
        };
        events.sort_by_key(|e| (e.timestamp_ms, e.sequence));
        events
    }

    /// Take all events (sorted), leaving the tracer empty.
    pub fn take_events(&self) -> Vec<DecisionEvent> {
        let mut events = match self.events.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(_) => return Vec::new(),
        };
        events.sort_by_key(|e| (e.timestamp_ms, e.sequence));
        events
    }

    /// Events recorded for one domain, sorted.
    pub fn events_for(&self, domain: &str) -> Vec<DecisionEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.domain == domain)
            .collect()
    }

    /// Latest event for `(domain, key)` in append order.
    pub fn find(&self, domain: &str, key: &str) -> Option<DecisionEvent> {
        let events = self.events.lock().ok()?;
        events
            .iter()
            .filter(|e| e.domain == domain && e.key == key)
            .max_by_key(|e| e.sequence)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DecisionTracer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DecisionTracer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionTracer")
            .field("events", &self.len())
            .finish()
    }
}
