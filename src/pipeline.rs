//! The answer pipeline.
//!
//! One deterministic decision sequence per question:
//! embed → similarity search → extractive attempt → generation fallback.
//! Stages run strictly in order; exactly one of the two answer sources is
//! used per request, and nothing persists between questions.

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::core::config::{PipelineConfig, DEFAULT_EMAIL_FILTER, DEFAULT_MATCH_THRESHOLD};
use crate::core::errors::ApiError;
use crate::inference::embedding::{Embedder, EmbeddingError};
use crate::inference::generation::{GenerationError, Generator};
use crate::inference::qa::ExtractiveQa;
use crate::search::{ContextSection, SearchError, SearchGateway};

const NO_CONTEXT_INFO: &str = "No relevant email content was found for that query.";
const UNGROUNDED_INFO: &str =
    "No relevant email content was found; this answer is not grounded in your email.";
const NO_CONTEXT_PLACEHOLDER: &str = "(no context available)";
const PROMPT_PREFIX: &str = "Answer the question using only the email excerpts below. \
If the excerpts do not contain the answer, say so.";

#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: String,
    /// Omitted → default correspondent filter; explicit `null` → no filter.
    #[serde(default, deserialize_with = "double_option")]
    pub email_filter: Option<Option<String>>,
    #[serde(default, rename = "generateIfNoContext")]
    pub generate_if_no_context: bool,
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f32,
}

fn default_match_threshold() -> f32 {
    DEFAULT_MATCH_THRESHOLD
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

impl AskRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            email_filter: None,
            generate_if_no_context: false,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }

    pub fn effective_filter(&self) -> Option<String> {
        match &self.email_filter {
            None => Some(DEFAULT_EMAIL_FILTER.to_string()),
            Some(None) => None,
            Some(Some(address)) => Some(address.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnswerSource {
    ExtractiveQa,
    Generation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerResult {
    pub answer: Option<String>,
    #[serde(rename = "contextFound")]
    pub context_found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<AnswerSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("question must not be empty")]
    MissingQuestion,
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::MissingQuestion => ApiError::BadRequest(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

pub struct AnswerPipeline {
    config: Arc<PipelineConfig>,
    embedder: Arc<dyn Embedder>,
    search: Arc<dyn SearchGateway>,
    qa: Arc<dyn ExtractiveQa>,
    generator: Arc<dyn Generator>,
}

impl AnswerPipeline {
    pub fn new(
        config: Arc<PipelineConfig>,
        embedder: Arc<dyn Embedder>,
        search: Arc<dyn SearchGateway>,
        qa: Arc<dyn ExtractiveQa>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            config,
            embedder,
            search,
            qa,
            generator,
        }
    }

    pub async fn answer(&self, request: AskRequest) -> Result<AnswerResult, PipelineError> {
        let question = request.question.trim().to_string();
        if question.is_empty() {
            return Err(PipelineError::MissingQuestion);
        }

        let vector = self
            .embedder
            .embed(&question, &self.config.embedding_model)
            .await?;

        let filter = request.effective_filter();
        let sections = self
            .search
            .search(
                &vector,
                request.match_threshold,
                self.config.match_count,
                filter.as_deref(),
            )
            .await?;
        tracing::debug!(sections = sections.len(), "similarity search returned");

        let context = concat_sections(&sections);

        if context.is_empty() {
            if !request.generate_if_no_context {
                return Ok(AnswerResult {
                    answer: None,
                    context_found: false,
                    source: None,
                    score: None,
                    info: Some(NO_CONTEXT_INFO.to_string()),
                });
            }

            let prompt = build_prompt(NO_CONTEXT_PLACEHOLDER, &question);
            let text = self
                .generator
                .generate(&prompt, &self.config.generation_models)
                .await?;
            return Ok(AnswerResult {
                answer: Some(text),
                context_found: false,
                source: Some(AnswerSource::Generation),
                score: None,
                info: Some(UNGROUNDED_INFO.to_string()),
            });
        }

        if let Some(candidate) = self.qa.extract(&question, &context).await {
            return Ok(AnswerResult {
                answer: Some(candidate.answer),
                context_found: true,
                source: Some(AnswerSource::ExtractiveQa),
                score: candidate.score,
                info: None,
            });
        }

        tracing::debug!("no usable extractive answer, falling back to generation");
        let prompt = build_prompt(&context, &question);
        let text = self
            .generator
            .generate(&prompt, &self.config.generation_models)
            .await?;
        Ok(AnswerResult {
            answer: Some(text),
            context_found: true,
            source: Some(AnswerSource::Generation),
            score: None,
            info: None,
        })
    }
}

/// Joins section contents in search-returned order, blank-line separated.
/// The search ranking is trusted as-is; nothing is re-sorted here.
fn concat_sections(sections: &[ContextSection]) -> String {
    sections
        .iter()
        .map(|s| s.section_content.trim())
        .filter(|content| !content.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn build_prompt(context: &str, question: &str) -> String {
    format!("{PROMPT_PREFIX}\n\nEmail excerpts:\n{context}\n\nQuestion: {question}\nAnswer:")
}
