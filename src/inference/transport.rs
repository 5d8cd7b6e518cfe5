//! Transport seam for the remote inference service.
//!
//! Every inference call (embedding, extractive QA, generation) goes through
//! the `InferenceTransport` trait so retry and fallback logic stays
//! independent of HTTP plumbing and testable with scripted responses.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Connect(String),
    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Status plus parsed body of one inference call.
///
/// Error bodies are not always JSON; those are carried as a JSON string
/// value so callers can still log them.
#[derive(Debug, Clone)]
pub struct InferenceResponse {
    pub status: u16,
    pub body: Value,
}

impl InferenceResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait InferenceTransport: Send + Sync {
    /// POST a JSON body to a route relative to the service base URL.
    async fn post(&self, route: &str, body: &Value) -> Result<InferenceResponse, TransportError>;
}

/// Hugging Face Inference API transport.
pub struct HfTransport {
    base_url: String,
    token: String,
    client: Client,
}

impl HfTransport {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            client,
        })
    }
}

#[async_trait]
impl InferenceTransport for HfTransport {
    async fn post(&self, route: &str, body: &Value) -> Result<InferenceResponse, TransportError> {
        let url = format!("{}/{}", self.base_url, route);
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let status = res.status().as_u16();
        let text = res
            .text()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

        Ok(InferenceResponse { status, body })
    }
}
