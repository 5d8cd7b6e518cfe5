//! Extractive question answering against the remote QA model.
//!
//! Extraction failure is an expected branch, not a fault: any transport
//! error, bad status, unrecognized shape, or blank answer comes back as
//! `None` and the pipeline falls through to generation.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::shapes::{decode_qa_answer, AnswerCandidate};
use super::transport::InferenceTransport;

#[async_trait]
pub trait ExtractiveQa: Send + Sync {
    async fn extract(&self, question: &str, context: &str) -> Option<AnswerCandidate>;
}

pub struct ExtractiveQaEngine {
    transport: Arc<dyn InferenceTransport>,
    model: String,
}

impl ExtractiveQaEngine {
    pub fn new(transport: Arc<dyn InferenceTransport>, model: String) -> Self {
        Self { transport, model }
    }
}

#[async_trait]
impl ExtractiveQa for ExtractiveQaEngine {
    async fn extract(&self, question: &str, context: &str) -> Option<AnswerCandidate> {
        let route = format!("models/{}", self.model);
        let body = json!({
            "inputs": {
                "question": question,
                "context": context,
            }
        });

        let response = match self.transport.post(&route, &body).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(model = %self.model, error = %err, "extractive call failed");
                return None;
            }
        };

        if !response.is_success() {
            tracing::warn!(model = %self.model, status = response.status, "extractive model returned an error status");
            return None;
        }

        match decode_qa_answer(&response.body) {
            Some(candidate) => {
                let answer = candidate.answer.trim();
                if answer.is_empty() {
                    tracing::debug!(model = %self.model, "extractive model returned a blank answer");
                    return None;
                }
                Some(AnswerCandidate {
                    answer: answer.to_string(),
                    score: candidate.score,
                })
            }
            None => {
                tracing::debug!(model = %self.model, "unrecognized extractive response shape");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::transport::{InferenceResponse, TransportError};
    use serde_json::Value;
    use std::sync::Mutex;

    struct OneShotTransport {
        response: Mutex<Option<Result<InferenceResponse, TransportError>>>,
    }

    impl OneShotTransport {
        fn new(response: Result<InferenceResponse, TransportError>) -> Arc<Self> {
            Arc::new(Self {
                response: Mutex::new(Some(response)),
            })
        }
    }

    #[async_trait]
    impl InferenceTransport for OneShotTransport {
        async fn post(&self, _route: &str, _body: &Value) -> Result<InferenceResponse, TransportError> {
            self.response
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Err(TransportError::Connect("spent".to_string())))
        }
    }

    fn engine(response: Result<InferenceResponse, TransportError>) -> ExtractiveQaEngine {
        ExtractiveQaEngine::new(OneShotTransport::new(response), "qa-model".to_string())
    }

    fn ok(body: Value) -> Result<InferenceResponse, TransportError> {
        Ok(InferenceResponse { status: 200, body })
    }

    #[tokio::test]
    async fn array_answer_with_score() {
        let candidate = engine(ok(json!([{"answer": " Paris ", "score": 0.8}])))
            .extract("q", "ctx")
            .await
            .unwrap();
        assert_eq!(candidate.answer, "Paris");
        assert_eq!(candidate.score, Some(0.8));
    }

    #[tokio::test]
    async fn whitespace_answer_is_unusable() {
        let result = engine(ok(json!({"answer": "   "}))).extract("q", "ctx").await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn error_status_yields_none() {
        let result = engine(Ok(InferenceResponse {
            status: 503,
            body: json!({"error": "loading"}),
        }))
        .extract("q", "ctx")
        .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn transport_error_yields_none() {
        let result = engine(Err(TransportError::Connect("refused".to_string())))
            .extract("q", "ctx")
            .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn unrecognized_shape_yields_none() {
        let result = engine(ok(json!({"generated_text": "hello"})))
            .extract("q", "ctx")
            .await;
        assert!(result.is_none());
    }
}
