use thiserror::Error;

use crate::llm::LlmError;

#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("input is empty")]
    EmptyInput,
    #[error("input has {tokens} tokens, the model accepts at most {limit}")]
    TooLong { tokens: usize, limit: usize },
    #[error("embedding has dimension {actual}, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("embedding backend failed: {0}")]
    Backend(String),
}

impl From<LlmError> for EncodingError {
    fn from(err: LlmError) -> Self {
        EncodingError::Backend(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("top_k must be between 1 and {max}, got {requested}")]
    InvalidTopK { requested: usize, max: usize },
    #[error("vector index unreachable: {0}")]
    Unreachable(String),
    #[error("vector index not found: {0}")]
    IndexNotFound(String),
    #[error("query vector has dimension {actual}, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("malformed index response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for RetrievalError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RetrievalError::Malformed(err.to_string())
        } else {
            RetrievalError::Unreachable(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation quota exceeded: {0}")]
    Quota(String),
    #[error("generation timed out")]
    Timeout,
    #[error("malformed completion: {0}")]
    Malformed(String),
    #[error("generation backend failed: {0}")]
    Backend(String),
}

impl From<LlmError> for GenerationError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::RateLimited(body) => GenerationError::Quota(body),
            LlmError::Timeout => GenerationError::Timeout,
            LlmError::Malformed(msg) => GenerationError::Malformed(msg),
            other => GenerationError::Backend(other.to_string()),
        }
    }
}

/// A failed stage of the request path.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl PipelineError {
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Encoding(_) => "encoding",
            PipelineError::Retrieval(_) => "retrieval",
            PipelineError::Generation(_) => "generation",
        }
    }

    /// Sentence shown to the end user in place of an answer. Never carries
    /// the upstream cause.
    pub fn user_message(&self) -> &'static str {
        match self {
            PipelineError::Encoding(EncodingError::EmptyInput) => {
                "Please enter a question."
            }
            PipelineError::Encoding(EncodingError::TooLong { .. }) => {
                "Your question is too long. Please shorten it and try again."
            }
            PipelineError::Encoding(_) => {
                "Sorry, I couldn't process your question right now. Please try again later."
            }
            PipelineError::Retrieval(_) => {
                "Sorry, I couldn't search the documentation right now. Please try again later."
            }
            PipelineError::Generation(GenerationError::Quota(_)) => {
                "The answer service is busy right now. Please try again in a moment."
            }
            PipelineError::Generation(_) => {
                "Sorry, I couldn't generate an answer right now. Please try again later."
            }
        }
    }

    /// Whether the caller sent something unusable, as opposed to a
    /// downstream service failing.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PipelineError::Encoding(EncodingError::EmptyInput)
                | PipelineError::Encoding(EncodingError::TooLong { .. })
        )
    }
}
