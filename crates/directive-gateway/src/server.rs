use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::{Config, ServerConfig};
use crate::directive::Directive;
use crate::handlers;
use crate::relay::Relay;
use crate::upstream::Transport;

/// Shared application state. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub directive: Directive,
    pub default_model: Arc<str>,
    pub relay: Relay,
}

impl AppState {
    pub fn new(config: &Config, transport: Arc<dyn Transport>) -> Self {
        Self {
            directive: config.directive(),
            default_model: Arc::from(config.upstream.default_model.as_str()),
            relay: Relay::new(transport, config.upstream.api_key()),
        }
    }
}

pub fn build_app(state: AppState, server: &ServerConfig) -> Router {
    let api_v1 = Router::new()
        .route("/models", get(handlers::list_models))
        .route("/chat/completions", post(handlers::chat_completions))
        .route("/completions", post(handlers::completions))
        .with_state(state);

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/v1", api_v1)
        .layer(DefaultBodyLimit::max(server.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(server.request_timeout_seconds),
        ))
}
