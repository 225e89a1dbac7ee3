//! Deterministic stand-ins for the external collaborators, used by the test
//! suites and for running the endpoint without hosted services.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Map;

use super::encoder::{check_input, Embedder, TokenCounter};
use super::error::{EncodingError, GenerationError, RetrievalError};
use super::generator::Generator;
use super::retriever::{rank_chunks, validate_top_k, Retriever};
use super::types::RetrievedChunk;

pub fn chunk(id: &str, text: &str, score: f32) -> RetrievedChunk {
    RetrievedChunk {
        id: id.to_string(),
        text: text.to_string(),
        score,
        metadata: Map::new(),
    }
}

/// One dimension per keyword; each component counts occurrences of that
/// keyword in the lowercased input.
pub struct KeywordEmbedder {
    keywords: Vec<String>,
    counter: TokenCounter,
}

impl KeywordEmbedder {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.into().to_lowercase())
                .collect(),
            counter: TokenCounter::Whitespace,
        }
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    fn name(&self) -> &str {
        "keyword"
    }

    fn dimension(&self) -> usize {
        self.keywords.len()
    }

    async fn encode(&self, text: &str) -> Result<Vec<f32>, EncodingError> {
        let text = check_input(text, &self.counter, 256)?.to_lowercase();
        Ok(self
            .keywords
            .iter()
            .map(|k| text.matches(k.as_str()).count() as f32)
            .collect())
    }
}

/// Returns the same chunks for every query.
pub struct StaticRetriever {
    chunks: Vec<RetrievedChunk>,
}

impl StaticRetriever {
    pub fn new(chunks: Vec<RetrievedChunk>) -> Self {
        Self { chunks }
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    fn name(&self) -> &str {
        "static"
    }

    async fn search(
        &self,
        _vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, RetrievalError> {
        validate_top_k(top_k)?;
        Ok(rank_chunks(self.chunks.clone(), top_k))
    }
}

pub struct FailingRetriever {
    error: Box<dyn Fn() -> RetrievalError + Send + Sync>,
}

impl FailingRetriever {
    pub fn new(error: impl Fn() -> RetrievalError + Send + Sync + 'static) -> Self {
        Self {
            error: Box::new(error),
        }
    }
}

#[async_trait]
impl Retriever for FailingRetriever {
    fn name(&self) -> &str {
        "failing"
    }

    async fn search(
        &self,
        _vector: &[f32],
        _top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, RetrievalError> {
        Err((self.error)())
    }
}

/// Answers with the prompt it was given.
pub struct EchoGenerator;

#[async_trait]
impl Generator for EchoGenerator {
    fn name(&self) -> &str {
        "echo"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        Ok(prompt.to_string())
    }
}

/// Echoes after a delay, to keep several requests in flight at once.
pub struct SlowEchoGenerator {
    delay: Duration,
}

impl SlowEchoGenerator {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Generator for SlowEchoGenerator {
    fn name(&self) -> &str {
        "slow-echo"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        tokio::time::sleep(self.delay).await;
        Ok(prompt.to_string())
    }
}

pub struct FailingGenerator {
    error: Box<dyn Fn() -> GenerationError + Send + Sync>,
}

impl FailingGenerator {
    pub fn new(error: impl Fn() -> GenerationError + Send + Sync + 'static) -> Self {
        Self {
            error: Box::new(error),
        }
    }
}

#[async_trait]
impl Generator for FailingGenerator {
    fn name(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Err((self.error)())
    }
}
