use std::sync::Arc;

use anyhow::Context;

use crate::core::config::PipelineConfig;
use crate::inference::embedding::{Embedder, EmbeddingClient};
use crate::inference::generation::GenerativeFallbackEngine;
use crate::inference::qa::ExtractiveQaEngine;
use crate::inference::retry::RetryPolicy;
use crate::inference::transport::{HfTransport, InferenceTransport};
use crate::pipeline::AnswerPipeline;
use crate::search::{SectionStore, SupabaseGateway};

/// Application state shared across all routes.
///
/// Built once at startup from the validated `PipelineConfig`; everything
/// inside is read-only afterwards. The embedder is exposed separately so
/// ingestion shares the exact same client as the question path.
pub struct AppState {
    pub config: Arc<PipelineConfig>,
    pub pipeline: AnswerPipeline,
    pub embedder: Arc<dyn Embedder>,
    pub store: Arc<dyn SectionStore>,
}

impl AppState {
    pub fn initialize() -> anyhow::Result<Arc<Self>> {
        let config = Arc::new(PipelineConfig::from_env().context("load pipeline configuration")?);

        let transport: Arc<dyn InferenceTransport> = Arc::new(
            HfTransport::new(
                &config.hf_api_base,
                &config.hf_api_token,
                config.request_timeout,
            )
            .context("build inference transport")?,
        );

        let retry = RetryPolicy::new(config.max_attempts, config.backoff_base);
        let embedder: Arc<dyn Embedder> = Arc::new(EmbeddingClient::new(
            transport.clone(),
            retry,
            config.embedding_dim,
        ));

        let gateway = Arc::new(
            SupabaseGateway::new(
                &config.supabase_url,
                &config.supabase_service_key,
                config.request_timeout,
            )
            .context("build store gateway")?,
        );

        let qa = Arc::new(ExtractiveQaEngine::new(
            transport.clone(),
            config.qa_model.clone(),
        ));
        let generator = Arc::new(GenerativeFallbackEngine::new(
            transport,
            config.max_new_tokens,
        ));

        let pipeline = AnswerPipeline::new(
            config.clone(),
            embedder.clone(),
            gateway.clone(),
            qa,
            generator,
        );

        Ok(Arc::new(Self {
            config,
            pipeline,
            embedder,
            store: gateway,
        }))
    }
}
