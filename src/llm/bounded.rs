//! Bounded, cancellable LLM invocation with retries.

use super::provider::{CompletionOptions, LlmError, LlmProvider};
use super::retry_policy::RetryPolicy;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Invoke `provider`, retrying transient failures according to `retry`.
///
/// Backoff sleeps observe `options.cancellation`, so a cancelled call never
/// schedules another attempt.
pub async fn invoke_with_retry(
    provider: &dyn LlmProvider,
    system_prompt: &str,
    user_prompt: &str,
    retry: &RetryPolicy,
    options: &CompletionOptions,
) -> Result<String, LlmError> {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match provider.invoke(system_prompt, user_prompt, options).await {
            Ok(text) => return Ok(text),
            Err(e) if retry.should_retry(&e, attempt) => {
                let delay = retry.backoff(attempt);
                warn!(
                    provider = provider.name(),
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "LLM call failed, retrying"
                );
                tokio::select! {
                    biased;
                    _ = options.cancellation.cancelled() => return Err(LlmError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            Err(e) => return Err(e),
        }
    }
}

/// Invoke `provider` under a wall-clock `budget`.
///
/// A child of `options.cancellation` is armed for the call. When the budget
/// expires the token is cancelled and the in-flight request future is dropped,
/// so the connection is closed rather than left running in the background.
/// The same happens if the returned future is itself dropped.
pub async fn invoke_bounded(
    provider: &dyn LlmProvider,
    system_prompt: &str,
    user_prompt: &str,
    budget: Duration,
    retry: &RetryPolicy,
    options: &CompletionOptions,
) -> Result<String, LlmError> {
    let token = options.cancellation.child_token();
    let _guard = token.clone().drop_guard();
    let attempt_timeout = options.timeout.min(budget);
    let options = options
        .clone()
        .with_timeout(attempt_timeout)
        .with_cancellation(token.clone());

    let started = Instant::now();
    let outcome = tokio::time::timeout(
        budget,
        invoke_with_retry(provider, system_prompt, user_prompt, retry, &options),
    )
    .await;

    match outcome {
        Ok(result) => {
            debug!(
                provider = provider.name(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                ok = result.is_ok(),
                "Bounded LLM call finished"
            );
            result
        }
        Err(_) => {
            token.cancel();
            warn!(
                provider = provider.name(),
                budget_ms = budget.as_millis() as u64,
                "LLM call exceeded its budget, cancelled"
            );
            Err(LlmError::Timeout)
        }
    }
}
