use axum::Json;
use serde::Serialize;

pub const SERVICE_NAME: &str = "LLM Gateway";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: String,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: format!("{SERVICE_NAME} is running"),
    })
}
