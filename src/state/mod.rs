use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::anyhow;
use serde_json::Value;

use crate::core::config::{
    redact_sensitive_values, AppPaths, ConfigService, RagSettings, VectorStoreProvider,
};
use crate::rag::{
    ChatCompletionGenerator, Embedder, Generator, HttpEmbedder, InMemoryIndex, PineconeRetriever,
    RagPipeline, Retriever,
};

pub mod error;

use error::InitializationError;

/// Process-wide state shared by every request.
///
/// Built once during startup; handlers only read from it.
pub struct AppState {
    pub settings: Arc<RagSettings>,
    /// Effective configuration with secrets already redacted.
    pub public_config: Value,
    pub pipeline: RagPipeline,
}

impl AppState {
    pub fn new(settings: RagSettings, config: &Value, pipeline: RagPipeline) -> Self {
        Self {
            settings: Arc::new(settings),
            public_config: redact_sensitive_values(config),
            pipeline,
        }
    }

    /// Loads configuration and connects the embedding, retrieval and
    /// generation backends.
    pub async fn initialize(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config_service = ConfigService::new(paths.clone());
        let (config, settings) = config_service
            .load_settings()
            .map_err(|e| InitializationError::Config(e.into()))?;
        tracing::info!(
            "Loaded configuration from {}",
            config_service.config_path().display()
        );

        let embedder: Arc<dyn Embedder> = Arc::new(
            HttpEmbedder::from_settings(&settings.embedding)
                .map_err(InitializationError::Embedding)?,
        );

        let retriever: Arc<dyn Retriever> = match settings.vector_store.provider {
            VectorStoreProvider::Pinecone => Arc::new(
                PineconeRetriever::from_settings(&settings.vector_store)
                    .map_err(InitializationError::Retriever)?,
            ),
            VectorStoreProvider::Memory => {
                let raw = settings.vector_store.memory_path.as_deref().ok_or_else(|| {
                    InitializationError::Retriever(anyhow!("vector_store.memory_path is not set"))
                })?;
                let index = InMemoryIndex::load_jsonl(&resolve_data_path(raw, &paths))
                    .map_err(InitializationError::Retriever)?;
                if !index.is_empty() && index.dimension() != embedder.dimension() {
                    return Err(InitializationError::Retriever(anyhow!(
                        "index dimension {} does not match embedding dimension {}",
                        index.dimension(),
                        embedder.dimension()
                    )));
                }
                Arc::new(index)
            }
        };

        let generator: Arc<dyn Generator> = Arc::new(
            ChatCompletionGenerator::from_settings(&settings.generation)
                .map_err(InitializationError::Generation)?,
        );

        let pipeline = RagPipeline::new(embedder, retriever, generator, settings.retrieval.top_k);
        tracing::info!(
            "RAG pipeline ready: embedder={}, retriever={}, generator={}, top_k={}",
            pipeline.embedder_name(),
            pipeline.retriever_name(),
            pipeline.generator_name(),
            pipeline.top_k()
        );

        Ok(Arc::new(Self::new(settings, &config, pipeline)))
    }
}

fn resolve_data_path(raw: &Path, paths: &AppPaths) -> PathBuf {
    if raw.is_absolute() {
        return raw.to_path_buf();
    }
    let user_candidate = paths.user_data_dir.join(raw);
    if user_candidate.exists() {
        return user_candidate;
    }
    paths.project_root.join(raw)
}
