//! Cancellable HTTP helpers shared by the HTTP-backed providers.
//!
//! Each helper races the reqwest future against the cancellation token. The
//! losing future is dropped, which tears down the underlying connection.

use super::provider::LlmError;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

/// Send a request, aborting it if `cancellation` fires first.
pub(crate) async fn send(
    request: RequestBuilder,
    cancellation: &CancellationToken,
) -> Result<Response, LlmError> {
    tokio::select! {
        biased;
        _ = cancellation.cancelled() => Err(LlmError::Cancelled),
        result = request.send() => result.map_err(LlmError::from_transport),
    }
}

/// Turn a non-success status into an `LlmError`, reading the body for context.
pub(crate) async fn check_status(
    response: Response,
    cancellation: &CancellationToken,
) -> Result<Response, LlmError> {
    let status = response.status();
    if status.as_u16() == 429 {
        return Err(LlmError::RateLimited);
    }
    if status.is_success() {
        return Ok(response);
    }

    let body = tokio::select! {
        biased;
        _ = cancellation.cancelled() => return Err(LlmError::Cancelled),
        body = response.text() => body.unwrap_or_default(),
    };
    Err(LlmError::Api {
        status: status.as_u16(),
        message: body,
    })
}

/// Read and decode a JSON body, aborting if `cancellation` fires first.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: Response,
    cancellation: &CancellationToken,
    what: &str,
) -> Result<T, LlmError> {
    tokio::select! {
        biased;
        _ = cancellation.cancelled() => Err(LlmError::Cancelled),
        parsed = response.json::<T>() => parsed.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout
            } else {
                LlmError::InvalidResponse(format!("Failed to parse {} response: {}", what, e))
            }
        }),
    }
}
