//! Remote embedding client.
//!
//! One client serves both the question path and ingestion-time section
//! embedding. For each model it knows an ordered list of endpoint
//! variants; per endpoint it retries transient failures under the shared
//! `RetryPolicy`, while a permanent status or an unrecognized body shape
//! advances straight to the next endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;

use super::retry::{classify_status, RetryPolicy, StatusClass};
use super::shapes::decode_embedding;
use super::transport::InferenceTransport;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("no embedding endpoint produced a vector for model {model}")]
    Exhausted { model: String },
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str, model: &str) -> Result<Vec<f32>, EmbeddingError>;
}

pub struct EmbeddingClient {
    transport: Arc<dyn InferenceTransport>,
    retry: RetryPolicy,
    expected_dim: usize,
}

impl EmbeddingClient {
    pub fn new(transport: Arc<dyn InferenceTransport>, retry: RetryPolicy, expected_dim: usize) -> Self {
        Self {
            transport,
            retry,
            expected_dim,
        }
    }

    /// Endpoint variants for one model: the feature-extraction pipeline
    /// route first, then the plain model route.
    fn endpoint_routes(model: &str) -> [String; 2] {
        [
            format!("pipeline/feature-extraction/{model}"),
            format!("models/{model}"),
        ]
    }
}

#[async_trait]
impl Embedder for EmbeddingClient {
    async fn embed(&self, text: &str, model: &str) -> Result<Vec<f32>, EmbeddingError> {
        let body = json!({ "inputs": text });

        for route in Self::endpoint_routes(model) {
            let mut attempt = 1u32;
            loop {
                let response = match self.transport.post(&route, &body).await {
                    Ok(response) => response,
                    Err(err) => {
                        // Connection-level failures are retried like 5xx.
                        if !self.retry.has_attempts_left(attempt) {
                            tracing::warn!(%route, error = %err, "embedding endpoint unreachable");
                            break;
                        }
                        tracing::debug!(%route, attempt, error = %err, "embedding call failed, retrying");
                        tokio::time::sleep(self.retry.delay_for(attempt)).await;
                        attempt += 1;
                        continue;
                    }
                };

                match classify_status(response.status) {
                    StatusClass::Success => match decode_embedding(&response.body) {
                        Some(vector) => {
                            if vector.len() != self.expected_dim {
                                tracing::warn!(
                                    %route,
                                    got = vector.len(),
                                    expected = self.expected_dim,
                                    "embedding dimension mismatch"
                                );
                            }
                            return Ok(vector);
                        }
                        None => {
                            // Shape errors are not retryable on this endpoint.
                            tracing::warn!(%route, "unrecognized embedding response shape");
                            break;
                        }
                    },
                    StatusClass::Transient => {
                        if !self.retry.has_attempts_left(attempt) {
                            tracing::warn!(%route, status = response.status, "embedding retries exhausted");
                            break;
                        }
                        tracing::debug!(%route, attempt, status = response.status, "transient embedding failure");
                        tokio::time::sleep(self.retry.delay_for(attempt)).await;
                        attempt += 1;
                    }
                    StatusClass::Permanent => {
                        tracing::warn!(%route, status = response.status, "embedding endpoint rejected request");
                        break;
                    }
                }
            }
        }

        Err(EmbeddingError::Exhausted {
            model: model.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::transport::{InferenceResponse, TransportError};
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<InferenceResponse, TransportError>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Result<InferenceResponse, TransportError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl InferenceTransport for ScriptedTransport {
        async fn post(&self, route: &str, _body: &Value) -> Result<InferenceResponse, TransportError> {
            self.calls.lock().unwrap().push(route.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Connect("script exhausted".to_string())))
        }
    }

    fn ok(body: Value) -> Result<InferenceResponse, TransportError> {
        Ok(InferenceResponse { status: 200, body })
    }

    fn status(code: u16) -> Result<InferenceResponse, TransportError> {
        Ok(InferenceResponse {
            status: code,
            body: json!({"error": "upstream"}),
        })
    }

    fn client(transport: Arc<ScriptedTransport>) -> EmbeddingClient {
        EmbeddingClient::new(transport, RetryPolicy::new(3, Duration::ZERO), 3)
    }

    #[tokio::test]
    async fn two_transient_failures_then_success_stays_on_endpoint() {
        let transport = ScriptedTransport::new(vec![
            status(500),
            status(500),
            ok(json!([0.1, 0.2, 0.3])),
        ]);
        let vector = client(transport.clone())
            .embed("q", "m")
            .await
            .unwrap();
        assert_eq!(vector.len(), 3);
        assert_eq!(
            transport.calls(),
            vec![
                "pipeline/feature-extraction/m",
                "pipeline/feature-extraction/m",
                "pipeline/feature-extraction/m",
            ]
        );
    }

    #[tokio::test]
    async fn shape_error_advances_to_next_endpoint_without_retry() {
        let transport = ScriptedTransport::new(vec![
            ok(json!({"unexpected": true})),
            ok(json!([[0.5, 0.5, 0.5]])),
        ]);
        let vector = client(transport.clone()).embed("q", "m").await.unwrap();
        assert_eq!(vector, vec![0.5, 0.5, 0.5]);
        assert_eq!(
            transport.calls(),
            vec!["pipeline/feature-extraction/m", "models/m"]
        );
    }

    #[tokio::test]
    async fn permanent_status_skips_to_next_endpoint() {
        let transport = ScriptedTransport::new(vec![status(404), ok(json!([1.0, 2.0, 3.0]))]);
        let vector = client(transport.clone()).embed("q", "m").await.unwrap();
        assert_eq!(vector, vec![1.0, 2.0, 3.0]);
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test]
    async fn all_endpoints_exhausted_is_an_error() {
        let transport = ScriptedTransport::new(vec![
            status(500),
            status(500),
            status(500),
            status(404),
        ]);
        let err = client(transport.clone()).embed("q", "m").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Exhausted { .. }));
        // 3 attempts on the first endpoint, a single rejected attempt on the second.
        assert_eq!(transport.calls().len(), 4);
    }

    #[tokio::test]
    async fn dimension_mismatch_is_not_fatal() {
        let transport = ScriptedTransport::new(vec![ok(json!([0.1, 0.2]))]);
        let vector = client(transport).embed("q", "m").await.unwrap();
        assert_eq!(vector.len(), 2);
    }
}
