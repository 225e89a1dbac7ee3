//! Chat Service Endpoint logic: encode, retrieve, assemble, generate.
//!
//! The pipeline holds only shared read-only handles, so one instance serves
//! any number of concurrent requests without coordination.

use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument;
use uuid::Uuid;

use super::encoder::Embedder;
use super::error::PipelineError;
use super::generator::Generator;
use super::prompt;
use super::retriever::Retriever;
use super::types::QueryResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Encoded,
    Retrieved,
    Assembled,
    Generated,
    Responded,
}

#[derive(Clone)]
pub struct RagPipeline {
    embedder: Arc<dyn Embedder>,
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn Generator>,
    top_k: usize,
}

impl RagPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        retriever: Arc<dyn Retriever>,
        generator: Arc<dyn Generator>,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            retriever,
            generator,
            top_k,
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn embedder_name(&self) -> &str {
        self.embedder.name()
    }

    pub fn retriever_name(&self) -> &str {
        self.retriever.name()
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    /// Runs the request path, stopping at the first failing stage.
    pub async fn run(&self, query: &str) -> Result<QueryResponse, PipelineError> {
        let span = tracing::info_span!("answer_question", request_id = %Uuid::new_v4());
        async {
            let started = Instant::now();
            let result = self.execute(query).await;
            match &result {
                Ok(response) => tracing::info!(
                    "Answered with {} sources in {} ms",
                    response.sources.len(),
                    started.elapsed().as_millis()
                ),
                Err(err) => tracing::warn!(
                    kind = err.kind(),
                    "Request failed after {} ms: {}",
                    started.elapsed().as_millis(),
                    err
                ),
            }
            transition(Stage::Responded);
            result
        }
        .instrument(span)
        .await
    }

    /// Like [`run`](Self::run), with failures folded into the response body.
    pub async fn answer(&self, query: &str) -> QueryResponse {
        match self.run(query).await {
            Ok(response) => response,
            Err(err) => QueryResponse::failed(&err),
        }
    }

    async fn execute(&self, query: &str) -> Result<QueryResponse, PipelineError> {
        transition(Stage::Received);

        let vector = self.embedder.encode(query).await?;
        transition(Stage::Encoded);

        let chunks = self.retriever.search(&vector, self.top_k).await?;
        transition(Stage::Retrieved);
        tracing::debug!(
            "Retrieved {} chunks, best score {:?}",
            chunks.len(),
            chunks.first().map(|c| c.score)
        );

        let prompt = prompt::assemble(query, &chunks);
        transition(Stage::Assembled);

        let answer = self.generator.generate(&prompt).await?;
        transition(Stage::Generated);

        Ok(QueryResponse::answered(answer, chunks))
    }
}

fn transition(stage: Stage) {
    tracing::debug!("stage: {:?}", stage);
}
