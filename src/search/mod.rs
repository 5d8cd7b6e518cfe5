//! Similarity search contract.
//!
//! The vector search itself lives in the data store. The pipeline only
//! depends on this trait: query vector in, ranked sections out, any error
//! fatal to the request. The remote implementation is `SupabaseGateway`.

pub mod supabase;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use supabase::SupabaseGateway;

/// A stored email passage returned by the similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSection {
    pub section_content: String,
    #[serde(default)]
    pub document_id: Option<String>,
    /// Position within the source document, assigned at ingestion time.
    #[serde(default)]
    pub section_order: Option<i64>,
    /// Relevance score from the search stage.
    #[serde(default)]
    pub score: Option<f32>,
}

/// A section prepared for insertion, embedding included.
#[derive(Debug, Clone, Serialize)]
pub struct NewSection {
    pub document_id: String,
    pub section_order: i64,
    pub section_content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    pub embedding: Vec<f32>,
    pub ingested_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("similarity search failed: {0}")]
    Upstream(String),
}

#[async_trait]
pub trait SearchGateway: Send + Sync {
    /// Ranked sections for a query vector. `email_address` scopes the
    /// search to one correspondent; `None` disables the filter.
    async fn search(
        &self,
        query_embedding: &[f32],
        match_threshold: f32,
        match_count: usize,
        email_address: Option<&str>,
    ) -> Result<Vec<ContextSection>, SearchError>;
}

/// Ingestion-side insertion of embedded sections.
#[async_trait]
pub trait SectionStore: Send + Sync {
    async fn insert_sections(&self, sections: Vec<NewSection>) -> Result<(), SearchError>;
}
