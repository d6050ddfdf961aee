//! Retry policy for LLM calls.
//!
//! Implements exponential backoff with configurable parameters.

use super::provider::LlmError;
use std::time::Duration;

/// Hard ceiling on attempts, whatever the configuration says.
pub const MAX_ATTEMPTS_CAP: u32 = 10;

/// Retry policy implementing exponential backoff.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one (capped at `MAX_ATTEMPTS_CAP`).
    pub max_attempts: u32,
    /// Backoff before the first retry.
    pub initial_backoff: Duration,
    /// Maximum backoff (cap for exponential growth).
    pub max_backoff: Duration,
    /// Multiplier applied to backoff after each retry.
    pub backoff_multiplier: f64,
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Effective attempt budget after applying the hard cap.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.clamp(1, MAX_ATTEMPTS_CAP)
    }

    /// Check if an error should be retried after `attempt` attempts (1-based).
    ///
    /// Returns true if:
    /// - The error type is retryable (e.g., not a cancellation)
    /// - The attempt budget is not exhausted
    pub fn should_retry(&self, error: &LlmError, attempt: u32) -> bool {
        error.is_retryable() && attempt < self.attempts()
    }

    /// Backoff to wait after `attempt` attempts (1-based).
    ///
    /// `initial_backoff * multiplier^(attempt - 1)`, capped at `max_backoff`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let backoff_ms =
            self.initial_backoff.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        let capped_ms = backoff_ms.min(self.max_backoff.as_millis() as f64);
        Duration::from_millis(capped_ms.max(0.0) as u64)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
            backoff_multiplier: 2.0,
        }
    }
}
