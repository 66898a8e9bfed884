//! Upstream error types.

use thiserror::Error;

/// Errors that can occur while talking to the upstream API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// HTTP request failed (connect, write, or read).
    #[error("http request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Transport failed for a reason other than the HTTP client.
    #[error("upstream transport failed: {0}")]
    Transport(String),

    /// Upstream answered with a body that is not valid JSON.
    #[error("failed to parse upstream response")]
    Parse(#[source] serde_json::Error),

    /// Outbound payload could not be serialized.
    #[error("failed to encode upstream request: {0}")]
    Encode(#[source] serde_json::Error),
}
