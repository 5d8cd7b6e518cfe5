//! Ordered multi-model generation fallback chain.
//!
//! Each candidate model is tried under two modes before the chain moves
//! on: free-form text generation first, then sequence-to-sequence with the
//! same decoding budget. Decoding is deterministic (no sampling, bounded
//! new-token count). The first success anywhere terminates the loop.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

use super::shapes::{decode_generated_text, truncated_dump};
use super::transport::InferenceTransport;

/// Cap on the raw-body dump returned when no recognized text field is
/// present. The lenient policy is observed upstream behavior: a service
/// that answered anything beats advancing the chain.
const RAW_DUMP_LIMIT: usize = 500;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("all generation models were exhausted")]
    ModelsExhausted,
}

#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str, models: &[String]) -> Result<String, GenerationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GenerationMode {
    TextGeneration,
    Text2Text,
}

impl GenerationMode {
    const ORDER: [GenerationMode; 2] = [GenerationMode::TextGeneration, GenerationMode::Text2Text];

    fn route(&self, model: &str) -> String {
        match self {
            GenerationMode::TextGeneration => format!("pipeline/text-generation/{model}"),
            GenerationMode::Text2Text => format!("pipeline/text2text-generation/{model}"),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            GenerationMode::TextGeneration => "text-generation",
            GenerationMode::Text2Text => "text2text-generation",
        }
    }
}

pub struct GenerativeFallbackEngine {
    transport: Arc<dyn InferenceTransport>,
    max_new_tokens: u32,
}

impl GenerativeFallbackEngine {
    pub fn new(transport: Arc<dyn InferenceTransport>, max_new_tokens: u32) -> Self {
        Self {
            transport,
            max_new_tokens,
        }
    }

    fn request_body(&self, mode: GenerationMode, prompt: &str) -> Value {
        let mut parameters = json!({
            "max_new_tokens": self.max_new_tokens,
            "do_sample": false,
        });
        if mode == GenerationMode::TextGeneration {
            parameters["return_full_text"] = json!(false);
        }
        json!({
            "inputs": prompt,
            "parameters": parameters,
        })
    }
}

#[async_trait]
impl Generator for GenerativeFallbackEngine {
    async fn generate(&self, prompt: &str, models: &[String]) -> Result<String, GenerationError> {
        for model in models {
            for mode in GenerationMode::ORDER {
                let route = mode.route(model);
                let body = self.request_body(mode, prompt);

                let response = match self.transport.post(&route, &body).await {
                    Ok(response) => response,
                    Err(err) => {
                        tracing::warn!(%model, mode = mode.label(), error = %err, "generation call failed");
                        continue;
                    }
                };

                if !response.is_success() {
                    tracing::warn!(
                        %model,
                        mode = mode.label(),
                        status = response.status,
                        "generation model returned an error status"
                    );
                    continue;
                }

                if let Some(text) = decode_generated_text(&response.body) {
                    tracing::info!(%model, mode = mode.label(), "generation succeeded");
                    return Ok(text);
                }

                // Parsed but unrecognized: return the raw body rather than fail.
                tracing::warn!(%model, mode = mode.label(), "no recognized text field, returning raw body");
                return Ok(truncated_dump(&response.body, RAW_DUMP_LIMIT));
            }
        }

        Err(GenerationError::ModelsExhausted)
    }
}
