//! Supabase REST client for the `email_sections` store.
//!
//! Search goes through the `match_email_sections` RPC (pgvector cosine
//! match); ingestion inserts rows into the table directly. Both use the
//! service-role key. Errors here are surfaced as-is — availability and
//! retry for the store are that system's concern, not the pipeline's.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::{ContextSection, NewSection, SearchError, SearchGateway, SectionStore};

pub struct SupabaseGateway {
    base_url: String,
    service_key: String,
    client: Client,
}

impl SupabaseGateway {
    pub fn new(base_url: &str, service_key: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
            client,
        })
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }
}

#[async_trait]
impl SearchGateway for SupabaseGateway {
    async fn search(
        &self,
        query_embedding: &[f32],
        match_threshold: f32,
        match_count: usize,
        email_address: Option<&str>,
    ) -> Result<Vec<ContextSection>, SearchError> {
        let url = format!("{}/rest/v1/rpc/match_email_sections", self.base_url);
        let body = json!({
            "query_embedding": query_embedding,
            "match_threshold": match_threshold,
            "match_count": match_count,
            "email_address": email_address,
        });

        let res = self
            .request(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SearchError::Upstream(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let detail = res.text().await.unwrap_or_default();
            return Err(SearchError::Upstream(format!("{status}: {detail}")));
        }

        res.json::<Vec<ContextSection>>()
            .await
            .map_err(|e| SearchError::Upstream(format!("malformed search response: {e}")))
    }
}

#[async_trait]
impl SectionStore for SupabaseGateway {
    async fn insert_sections(&self, sections: Vec<NewSection>) -> Result<(), SearchError> {
        if sections.is_empty() {
            return Ok(());
        }

        let url = format!("{}/rest/v1/email_sections", self.base_url);
        let res = self
            .request(&url)
            .header("Prefer", "return=minimal")
            .json(&sections)
            .send()
            .await
            .map_err(|e| SearchError::Upstream(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let detail = res.text().await.unwrap_or_default();
            return Err(SearchError::Upstream(format!("insert failed {status}: {detail}")));
        }

        tracing::debug!(inserted = sections.len(), "sections stored");
        Ok(())
    }
}
