use thiserror::Error;

/// Errors that abort a `generate()` call.
///
/// Transient LLM failures never show up here: they are recovered by the
/// per-step fallbacks and only logged.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Local model server at {endpoint} is not reachable: {reason}")]
    LocalProviderUnavailable { endpoint: String, reason: String },

    #[error("Model '{model}' is not installed on {endpoint} (try `ollama pull {model}`)")]
    LocalModelMissing { model: String, endpoint: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GenerationError {
    /// Whether the user can fix this by changing the request or local setup.
    pub fn is_user_actionable(&self) -> bool {
        !matches!(self, GenerationError::Internal(_))
    }
}
