use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::rag::types::ErrorDetail;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/answer_question";

const NO_ANSWER: &str = "No answer received";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("could not reach the chat service ({0})")]
    Unreachable(String),
    #[error("the chat service sent an unreadable reply ({0})")]
    InvalidReply(String),
}

/// Reply body as sent by any server revision. `sources` was a plain string
/// in older deployments and a list of passages since.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceReply {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub sources: Value,
    #[serde(default)]
    pub error: Option<ErrorDetail>,
}

impl ServiceReply {
    pub fn answer_text(&self) -> &str {
        self.answer
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or(NO_ANSWER)
    }

    pub fn source_count(&self) -> usize {
        match &self.sources {
            Value::Array(items) => items.len(),
            Value::String(s) if !s.trim().is_empty() => 1,
            _ => 0,
        }
    }
}

/// One blocking POST per question. No retries, no timeout.
#[derive(Clone)]
pub struct ServiceClient {
    endpoint: String,
    http: Client,
}

impl ServiceClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http: Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn ask(&self, query: &str) -> Result<ServiceReply, TransportError> {
        let res = self
            .http
            .post(&self.endpoint)
            .json(&json!({ "query": query }))
            .send()
            .await
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| TransportError::InvalidReply(e.to_string()))?;

        // error statuses still carry a reply body worth showing
        serde_json::from_str::<ServiceReply>(&text).map_err(|e| {
            if status.is_success() {
                TransportError::InvalidReply(e.to_string())
            } else {
                TransportError::InvalidReply(format!("HTTP {}", status))
            }
        })
    }
}
