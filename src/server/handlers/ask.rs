use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::core::errors::ApiError;
use crate::pipeline::{AnswerResult, AskRequest};
use crate::state::AppState;

pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AnswerResult>, ApiError> {
    let result = state.pipeline.answer(request).await?;
    Ok(Json(result))
}
