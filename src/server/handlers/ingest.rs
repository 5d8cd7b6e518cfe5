//! Ingestion of pre-chunked email sections.
//!
//! Chunking stays with the caller; this endpoint embeds each section
//! through the same `EmbeddingClient` the question path uses and stores
//! the rows with their document order.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::core::errors::ApiError;
use crate::search::NewSection;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
    pub sections: Vec<IngestSection>,
}

#[derive(Debug, Deserialize)]
pub struct IngestSection {
    pub content: String,
    #[serde(default)]
    pub section_order: Option<i64>,
}

pub async fn ingest(
    State(state): State<Arc<AppState>>,
    Json(request): Json<IngestRequest>,
) -> Result<Json<Value>, ApiError> {
    if request.sections.is_empty() {
        return Err(ApiError::BadRequest("sections must not be empty".to_string()));
    }

    let document_id = request
        .document_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut rows = Vec::with_capacity(request.sections.len());
    for (index, section) in request.sections.iter().enumerate() {
        let content = section.content.trim();
        if content.is_empty() {
            continue;
        }

        let embedding = state
            .embedder
            .embed(content, &state.config.embedding_model)
            .await
            .map_err(ApiError::internal)?;

        rows.push(NewSection {
            document_id: document_id.clone(),
            section_order: section.section_order.unwrap_or(index as i64),
            section_content: content.to_string(),
            email_address: request.email_address.clone(),
            embedding,
            ingested_at: Utc::now(),
        });
    }

    let inserted = rows.len();
    state
        .store
        .insert_sections(rows)
        .await
        .map_err(ApiError::internal)?;

    tracing::info!(%document_id, inserted, "sections ingested");
    Ok(Json(json!({
        "document_id": document_id,
        "inserted": inserted,
    })))
}
