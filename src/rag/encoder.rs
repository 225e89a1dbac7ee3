//! Embedding Encoder: free text to a fixed-length vector.

use std::path::Path;

use anyhow::anyhow;
use async_trait::async_trait;
use tokenizers::Tokenizer;

use super::error::EncodingError;
use crate::core::config::EmbeddingSettings;
use crate::llm::OpenAiCompatClient;

#[async_trait]
pub trait Embedder: Send + Sync {
    fn name(&self) -> &str;

    /// Length of every vector this encoder produces.
    fn dimension(&self) -> usize;

    async fn encode(&self, text: &str) -> Result<Vec<f32>, EncodingError>;
}

/// Counts tokens to enforce the model's input limit.
pub enum TokenCounter {
    /// Whitespace-separated words. Undercounts sub-word tokens.
    Whitespace,
    Tokenizer(Box<Tokenizer>),
}

impl TokenCounter {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let tokenizer = Tokenizer::from_file(path)
            .map_err(|e| anyhow!("Failed to load tokenizer {}: {}", path.display(), e))?;
        Ok(TokenCounter::Tokenizer(Box::new(tokenizer)))
    }

    pub fn count(&self, text: &str) -> Result<usize, EncodingError> {
        match self {
            TokenCounter::Whitespace => Ok(text.split_whitespace().count()),
            TokenCounter::Tokenizer(tokenizer) => tokenizer
                .encode(text, true)
                .map(|encoding| encoding.len())
                .map_err(|e| EncodingError::Backend(format!("tokenizer failed: {}", e))),
        }
    }
}

/// Trims the input and rejects it when empty or over `limit` tokens.
/// Oversized input is rejected rather than truncated.
pub fn check_input<'a>(
    text: &'a str,
    counter: &TokenCounter,
    limit: usize,
) -> Result<&'a str, EncodingError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(EncodingError::EmptyInput);
    }
    let tokens = counter.count(trimmed)?;
    if tokens > limit {
        return Err(EncodingError::TooLong { tokens, limit });
    }
    Ok(trimmed)
}

/// Encoder backed by an OpenAI-compatible `/v1/embeddings` endpoint.
pub struct HttpEmbedder {
    client: OpenAiCompatClient,
    model: String,
    dimension: usize,
    max_input_tokens: usize,
    counter: TokenCounter,
}

impl HttpEmbedder {
    pub fn new(
        client: OpenAiCompatClient,
        model: impl Into<String>,
        dimension: usize,
        max_input_tokens: usize,
        counter: TokenCounter,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            dimension,
            max_input_tokens,
            counter,
        }
    }

    pub fn from_settings(settings: &EmbeddingSettings) -> anyhow::Result<Self> {
        let counter = match &settings.tokenizer_path {
            Some(path) => TokenCounter::from_file(path)?,
            None => TokenCounter::Whitespace,
        };
        let client = OpenAiCompatClient::new(settings.base_url.clone(), settings.api_key.clone());
        Ok(Self::new(
            client,
            settings.model.clone(),
            settings.dimension,
            settings.max_input_tokens,
            counter,
        ))
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn encode(&self, text: &str) -> Result<Vec<f32>, EncodingError> {
        let input = check_input(text, &self.counter, self.max_input_tokens)?;

        let mut vectors = self.client.embed(&[input.to_string()], &self.model).await?;
        let vector = vectors
            .pop()
            .ok_or_else(|| EncodingError::Backend("no embedding returned".to_string()))?;

        if vector.len() != self.dimension {
            return Err(EncodingError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_input_is_rejected() {
        let counter = TokenCounter::Whitespace;
        assert!(matches!(check_input("", &counter, 10), Err(EncodingError::EmptyInput)));
        assert!(matches!(check_input(" \n\t", &counter, 10), Err(EncodingError::EmptyInput)));
    }

    #[test]
    fn oversized_input_is_rejected_not_truncated() {
        let counter = TokenCounter::Whitespace;
        let result = check_input("one two three four", &counter, 3);
        assert!(matches!(
            result,
            Err(EncodingError::TooLong { tokens: 4, limit: 3 })
        ));
    }

    #[test]
    fn input_is_trimmed() {
        let counter = TokenCounter::Whitespace;
        assert_eq!(
            check_input("  What is a Kubernetes pod?\n", &counter, 256).unwrap(),
            "What is a Kubernetes pod?"
        );
    }

    #[test]
    fn missing_tokenizer_file_fails_to_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(TokenCounter::from_file(&dir.path().join("tokenizer.json")).is_err());
    }
}
