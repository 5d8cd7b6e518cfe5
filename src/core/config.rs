//! Process-wide pipeline configuration.
//!
//! Read once from the environment at startup and immutable afterwards.
//! A missing inference or store credential is a configuration error
//! surfaced here, never a runtime retry case.

use std::env;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";
pub const DEFAULT_QA_MODEL: &str = "deepset/roberta-base-squad2";
pub const DEFAULT_GENERATION_MODELS: &[&str] = &[
    "google/flan-t5-large",
    "google/flan-t5-base",
    "MBZUAI/LaMini-Flan-T5-783M",
];
pub const DEFAULT_HF_API_BASE: &str = "https://api-inference.huggingface.co";

/// Email address used to scope the search when the request omits the filter.
pub const DEFAULT_EMAIL_FILTER: &str = "brandon@gmail.com";

/// Dimension of the default embedding model (all-MiniLM-L6-v2).
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// Fixed number of sections requested from the similarity search.
pub const MATCH_COUNT: usize = 10;

pub const DEFAULT_MATCH_THRESHOLD: f32 = -0.3;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Inference service credential (bearer token).
    pub hf_api_token: String,
    pub hf_api_base: String,
    /// Data store endpoint and service-role credential.
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub embedding_model: String,
    pub qa_model: String,
    /// Ordered generation fallback candidates.
    pub generation_models: Vec<String>,
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub request_timeout: Duration,
    pub max_new_tokens: u32,
    pub match_count: usize,
    pub embedding_dim: usize,
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            hf_api_token: required("HF_API_TOKEN")?,
            hf_api_base: optional("HF_API_BASE").unwrap_or_else(|| DEFAULT_HF_API_BASE.to_string()),
            supabase_url: required("SUPABASE_URL")?,
            supabase_service_key: required("SUPABASE_SERVICE_KEY")?,
            embedding_model: optional("EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            qa_model: optional("QA_MODEL").unwrap_or_else(|| DEFAULT_QA_MODEL.to_string()),
            generation_models: match optional("GENERATION_MODELS") {
                Some(raw) => parse_model_list(&raw)
                    .ok_or_else(|| ConfigError::Invalid {
                        var: "GENERATION_MODELS",
                        reason: "expected a comma-separated list of model ids".to_string(),
                    })?,
                None => DEFAULT_GENERATION_MODELS
                    .iter()
                    .map(|m| m.to_string())
                    .collect(),
            },
            max_attempts: parse_or("EMBEDDING_RETRY_ATTEMPTS", 3)?,
            backoff_base: Duration::from_millis(parse_or("EMBEDDING_BACKOFF_MS", 500)?),
            request_timeout: Duration::from_secs(parse_or("REQUEST_TIMEOUT_SECS", 30)?),
            max_new_tokens: parse_or("GENERATION_MAX_NEW_TOKENS", 256)?,
            match_count: MATCH_COUNT,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
        })
    }
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    optional(var).ok_or(ConfigError::MissingVar(var))
}

fn optional(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match optional(var) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// Parses a comma-separated model list, dropping empty entries.
/// Returns `None` when nothing usable remains.
fn parse_model_list(raw: &str) -> Option<Vec<String>> {
    let models: Vec<String> = raw
        .split(',')
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect();
    if models.is_empty() {
        None
    } else {
        Some(models)
    }
}
