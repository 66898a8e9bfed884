//! Request-boundary errors and the JSON error envelope.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::upstream::UpstreamError;

/// Errors surfaced to the caller as `{"error": {"message", "type"}}`.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No upstream API key configured.
    #[error("OPENAI_API_KEY is not configured")]
    Configuration,

    /// Upstream unreachable or returned something unusable.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Request body could not be read as the expected JSON shape.
    #[error("{0}")]
    InvalidRequest(String),
}

impl GatewayError {
    /// Value of the envelope's `type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Configuration => "configuration_error",
            GatewayError::Upstream(_) => "gateway_error",
            GatewayError::InvalidRequest(_) => "invalid_request_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Configuration | GatewayError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<JsonRejection> for GatewayError {
    fn from(rejection: JsonRejection) -> Self {
        GatewayError::InvalidRequest(rejection.body_text())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        error!(kind, error = %self, "Error processing request");

        let envelope = ErrorEnvelope {
            error: ErrorBody {
                message: self.to_string(),
                kind,
            },
        };
        (self.status(), Json(envelope)).into_response()
    }
}
