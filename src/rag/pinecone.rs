//! Pinecone data-plane client.
//!
//! The index host is taken from config when present, otherwise it is looked
//! up once through the control plane (`GET /indexes/{name}`) on the first
//! query and cached for the life of the process.

use anyhow::bail;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Map, Value};
use tokio::sync::OnceCell;

use super::error::RetrievalError;
use super::retriever::{rank_chunks, validate_top_k, Retriever};
use super::types::RetrievedChunk;
use crate::core::config::VectorStoreSettings;

const API_VERSION: &str = "2024-07";

pub struct PineconeRetriever {
    client: Client,
    api_key: String,
    index_name: String,
    controller_url: String,
    namespace: Option<String>,
    text_key: String,
    host: OnceCell<String>,
}

impl PineconeRetriever {
    pub fn from_settings(settings: &VectorStoreSettings) -> anyhow::Result<Self> {
        let Some(api_key) = settings.api_key.clone().filter(|k| !k.trim().is_empty()) else {
            bail!("vector_store.api_key (PINECONE_API_KEY) is required for the pinecone provider");
        };

        let host = match settings.index_host.as_deref().map(str::trim) {
            Some(h) if !h.is_empty() => OnceCell::new_with(Some(normalize_host(h))),
            _ => OnceCell::new(),
        };

        Ok(Self {
            client: Client::new(),
            api_key,
            index_name: settings.index_name.clone(),
            controller_url: settings.controller_url.trim_end_matches('/').to_string(),
            namespace: settings.namespace.clone().filter(|ns| !ns.is_empty()),
            text_key: settings.text_key.clone(),
            host,
        })
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
    }

    async fn host(&self) -> Result<&str, RetrievalError> {
        self.host
            .get_or_try_init(|| self.describe_index())
            .await
            .map(|h| h.as_str())
    }

    async fn describe_index(&self) -> Result<String, RetrievalError> {
        let url = format!("{}/indexes/{}", self.controller_url, self.index_name);
        let res = self.authorized(self.client.get(&url)).send().await?;

        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RetrievalError::IndexNotFound(self.index_name.clone()));
        }
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(RetrievalError::Unreachable(format!(
                "describe index returned {}: {}",
                status, text
            )));
        }

        let payload: Value = res.json().await?;
        let host = payload["host"]
            .as_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| RetrievalError::Malformed("index description has no host".to_string()))?;

        tracing::info!("Resolved Pinecone index '{}' to {}", self.index_name, host);
        Ok(normalize_host(host))
    }
}

#[async_trait]
impl Retriever for PineconeRetriever {
    fn name(&self) -> &str {
        "pinecone"
    }

    async fn search(
        &self,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, RetrievalError> {
        validate_top_k(top_k)?;
        let host = self.host().await?;
        let url = format!("{}/query", host);

        let mut body = json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
            "includeValues": false,
        });
        if let (Some(ns), Some(obj)) = (&self.namespace, body.as_object_mut()) {
            obj.insert("namespace".to_string(), json!(ns));
        }

        let res = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RetrievalError::IndexNotFound(self.index_name.clone()));
        }
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(RetrievalError::Unreachable(format!(
                "query returned {}: {}",
                status, text
            )));
        }

        let payload: Value = res.json().await?;
        let chunks = parse_matches(&payload, &self.text_key)?;
        Ok(rank_chunks(chunks, top_k))
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

/// Converts `matches` into chunks. Matches without the text field are
/// dropped since there is nothing to ground an answer on.
pub(crate) fn parse_matches(payload: &Value, text_key: &str) -> Result<Vec<RetrievedChunk>, RetrievalError> {
    let matches = payload["matches"]
        .as_array()
        .ok_or_else(|| RetrievalError::Malformed("missing matches array".to_string()))?;

    let mut chunks = Vec::with_capacity(matches.len());
    for item in matches {
        let id = item["id"].as_str().unwrap_or_default().to_string();
        let score = item["score"]
            .as_f64()
            .ok_or_else(|| RetrievalError::Malformed(format!("match '{}' has no score", id)))?
            as f32;

        let mut metadata = item["metadata"].as_object().cloned().unwrap_or_else(Map::new);
        let Some(text) = metadata.remove(text_key).and_then(|v| v.as_str().map(str::to_string)) else {
            tracing::warn!("Skipping match '{}' without '{}' metadata", id, text_key);
            continue;
        };

        chunks.push(RetrievedChunk {
            id,
            text,
            score,
            metadata,
        });
    }
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::VectorStoreSettings;

    #[test]
    fn matches_become_chunks() {
        let payload = json!({
            "matches": [
                { "id": "doc-1#0", "score": 0.91, "metadata": { "text": "A pod is the smallest deployable unit in Kubernetes.", "source": "pods.md" } },
                { "id": "doc-2#3", "score": 0.72, "metadata": { "source": "orphan.md" } },
                { "id": "doc-3#1", "score": 0.55, "metadata": { "text": "Deployments manage ReplicaSets." } }
            ],
            "namespace": ""
        });

        let chunks = parse_matches(&payload, "text").unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].id, "doc-1#0");
        assert_eq!(chunks[0].text, "A pod is the smallest deployable unit in Kubernetes.");
        assert_eq!(chunks[0].metadata["source"], "pods.md");
        assert!(!chunks[0].metadata.contains_key("text"));
        assert_eq!(chunks[1].id, "doc-3#1");
    }

    #[test]
    fn missing_matches_is_malformed() {
        assert!(matches!(
            parse_matches(&json!({ "results": [] }), "text"),
            Err(RetrievalError::Malformed(_))
        ));
    }

    #[test]
    fn host_gets_scheme() {
        assert_eq!(
            normalize_host("aws-rag-abc123.svc.us-east-1.pinecone.io"),
            "https://aws-rag-abc123.svc.us-east-1.pinecone.io"
        );
        assert_eq!(normalize_host("http://localhost:5081/"), "http://localhost:5081");
    }

    #[test]
    fn api_key_is_required() {
        let settings = VectorStoreSettings::default();
        assert!(PineconeRetriever::from_settings(&settings).is_err());
    }
}
