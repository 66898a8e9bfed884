//! Completion endpoints: rewrite the request, then relay it upstream.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use tracing::debug;

use crate::directive::{inject, inject_prompt};
use crate::error::GatewayError;
use crate::relay::{CHAT_COMPLETIONS_PATH, COMPLETIONS_PATH};
use crate::server::AppState;
use crate::upstream::{ChatCompletionRequest, CompletionRequest};

/// POST /v1/chat/completions
///
/// The directive becomes (or is merged into) the first system message.
/// A truthy `stream` switches to an event-stream relay.
pub async fn chat_completions(
    State(state): State<AppState>,
    payload: Result<Json<ChatCompletionRequest>, JsonRejection>,
) -> Result<Response, GatewayError> {
    let Json(mut request) = payload?;

    request.messages = inject(std::mem::take(&mut request.messages), &state.directive);
    if request.model.is_none() {
        request.model = Some(state.default_model.to_string());
    }

    debug!(
        model = request.model.as_deref(),
        messages = request.messages.len(),
        stream = request.is_stream(),
        "Relaying chat completion"
    );

    if request.is_stream() {
        let stream = state.relay.forward_stream(CHAT_COMPLETIONS_PATH, &request)?;
        return Ok(stream.into_response());
    }

    let relayed = state.relay.forward(CHAT_COMPLETIONS_PATH, &request).await?;
    Ok(relayed.into_response())
}

/// POST /v1/completions
///
/// Legacy prompt shape. The directive is prepended to `prompt`. Always
/// relayed buffered.
pub async fn completions(
    State(state): State<AppState>,
    payload: Result<Json<CompletionRequest>, JsonRejection>,
) -> Result<Response, GatewayError> {
    let Json(mut request) = payload?;

    let prompt = inject_prompt(request.prompt.as_ref(), &state.directive);
    request.prompt = Some(Value::String(prompt));
    if request.model.is_none() {
        request.model = Some(state.default_model.to_string());
    }

    debug!(model = request.model.as_deref(), "Relaying completion");

    let relayed = state.relay.forward(COMPLETIONS_PATH, &request).await?;
    Ok(relayed.into_response())
}
