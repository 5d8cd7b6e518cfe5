use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "embedding_model": state.config.embedding_model,
        "qa_model": state.config.qa_model,
        "generation_models": state.config.generation_models,
    }))
}
