//! Static model listing.

use axum::Json;
use axum::extract::State;
use chrono::Utc;
use serde::Serialize;

use crate::server::AppState;

const OWNED_BY: &str = "llm-gateway";

#[derive(Debug, Serialize)]
pub struct ModelList {
    pub object: &'static str,
    pub data: Vec<ModelCard>,
}

#[derive(Debug, Serialize)]
pub struct ModelCard {
    pub id: String,
    pub object: &'static str,
    /// Unix seconds.
    pub created: i64,
    pub owned_by: &'static str,
}

/// GET /v1/models
///
/// Lists only the configured default model. No upstream call is made.
pub async fn list_models(State(state): State<AppState>) -> Json<ModelList> {
    Json(ModelList {
        object: "list",
        data: vec![ModelCard {
            id: state.default_model.to_string(),
            object: "model",
            created: Utc::now().timestamp(),
            owned_by: OWNED_BY,
        }],
    })
}
