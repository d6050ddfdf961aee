//! One bounded LLM-backed step.

use crate::llm::{invoke_bounded, CompletionOptions, LlmError, LlmProvider, RetryPolicy};
use std::time::Duration;

/// A provider plus the budget and retry policy for one engine step.
#[derive(Clone)]
pub struct LlmStep<'a> {
    provider: &'a dyn LlmProvider,
    budget: Duration,
    retry: &'a RetryPolicy,
    options: CompletionOptions,
}

impl<'a> LlmStep<'a> {
    pub fn new(
        provider: &'a dyn LlmProvider,
        budget: Duration,
        retry: &'a RetryPolicy,
        options: CompletionOptions,
    ) -> Self {
        Self {
            provider,
            budget,
            retry,
            options,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Same step with a token limit.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.options = self.options.with_max_tokens(max_tokens);
        self
    }

    pub async fn invoke(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError> {
        invoke_bounded(
            self.provider,
            system_prompt,
            user_prompt,
            self.budget,
            self.retry,
            &self.options,
        )
        .await
    }
}
