use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::PipelineError;

/// A passage returned by the vector index for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub id: String,
    pub text: String,
    /// Similarity score (higher = better).
    pub score: f32,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub kind: String,
    pub message: String,
}

/// Body of every `/answer_question` response, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<RetrievedChunk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

impl QueryResponse {
    pub fn answered(answer: String, sources: Vec<RetrievedChunk>) -> Self {
        Self {
            answer,
            sources,
            error: None,
        }
    }

    pub fn failed(err: &PipelineError) -> Self {
        Self::failure(err.kind(), err.user_message())
    }

    pub fn failure(kind: &str, message: &str) -> Self {
        Self {
            answer: message.to_string(),
            sources: Vec::new(),
            error: Some(ErrorDetail {
                kind: kind.to_string(),
                message: message.to_string(),
            }),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
