use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};

use super::error::LlmError;
use super::types::ChatRequest;

/// Client for servers speaking the OpenAI REST dialect (OpenAI, LM Studio,
/// vLLM, text-embeddings-inference, ...).
#[derive(Clone)]
pub struct OpenAiCompatClient {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl OpenAiCompatClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self::with_client(base_url, api_key, Client::new())
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, api_key, client))
    }

    fn with_client(base_url: impl Into<String>, api_key: Option<String>, client: Client) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            client,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        if self.base_url.ends_with("/v1") {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/v1{}", self.base_url, path)
        }
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    /// Non-streaming chat completion. Returns the first choice's content.
    pub async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, LlmError> {
        let url = self.endpoint("/chat/completions");

        let mut body = json!({
            "model": model_id,
            "messages": request.messages,
            "stream": false,
        });

        if let Some(obj) = body.as_object_mut() {
            if let Some(t) = request.temperature { obj.insert("temperature".to_string(), json!(t)); }
            if let Some(t) = request.max_tokens { obj.insert("max_tokens".to_string(), json!(t)); }
        }

        let res = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()
            .await?;
        let payload = read_json(res).await?;
        extract_content(&payload)
    }

    /// One embedding per input, in input order.
    pub async fn embed(&self, inputs: &[String], model_id: &str) -> Result<Vec<Vec<f32>>, LlmError> {
        let url = self.endpoint("/embeddings");

        let body = json!({
            "model": model_id,
            "input": inputs,
        });

        let res = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()
            .await?;
        let payload = read_json(res).await?;
        extract_embeddings(&payload, inputs.len())
    }
}

async fn read_json(res: reqwest::Response) -> Result<Value, LlmError> {
    let status = res.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        let text = res.text().await.unwrap_or_default();
        return Err(LlmError::RateLimited(text));
    }
    if !status.is_success() {
        let text = res.text().await.unwrap_or_default();
        return Err(LlmError::Status {
            status: status.as_u16(),
            body: text,
        });
    }
    let text = res.text().await?;
    serde_json::from_str(&text).map_err(|e| LlmError::Malformed(e.to_string()))
}

pub(crate) fn extract_content(payload: &Value) -> Result<String, LlmError> {
    payload["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| LlmError::Malformed("missing choices[0].message.content".to_string()))
}

pub(crate) fn extract_embeddings(payload: &Value, expected: usize) -> Result<Vec<Vec<f32>>, LlmError> {
    let data = payload["data"]
        .as_array()
        .ok_or_else(|| LlmError::Malformed("missing data array".to_string()))?;

    let mut indexed = Vec::with_capacity(data.len());
    for (position, item) in data.iter().enumerate() {
        let index = item["index"].as_u64().map(|i| i as usize).unwrap_or(position);
        let vals = item["embedding"]
            .as_array()
            .ok_or_else(|| LlmError::Malformed(format!("data[{}] has no embedding", position)))?;
        let mut vector = Vec::with_capacity(vals.len());
        for v in vals {
            let f = v
                .as_f64()
                .ok_or_else(|| LlmError::Malformed(format!("data[{}] has a non-numeric value", position)))?;
            vector.push(f as f32);
        }
        indexed.push((index, vector));
    }

    if indexed.len() != expected {
        return Err(LlmError::Malformed(format!(
            "expected {} embeddings, got {}",
            expected,
            indexed.len()
        )));
    }

    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, vector)| vector).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_handles_v1_suffix() {
        let plain = OpenAiCompatClient::new("http://localhost:1234/", None);
        assert_eq!(plain.endpoint("/embeddings"), "http://localhost:1234/v1/embeddings");

        let versioned = OpenAiCompatClient::new("https://api.openai.com/v1", None);
        assert_eq!(
            versioned.endpoint("/chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn blank_api_key_is_dropped() {
        let client = OpenAiCompatClient::new("http://localhost", Some("  ".to_string()));
        assert!(client.api_key.is_none());
    }

    #[test]
    fn content_is_read_from_first_choice() {
        let payload = json!({
            "choices": [
                { "message": { "role": "assistant", "content": "A pod groups containers." } },
                { "message": { "role": "assistant", "content": "ignored" } }
            ]
        });
        assert_eq!(extract_content(&payload).unwrap(), "A pod groups containers.");
    }

    #[test]
    fn missing_content_is_malformed() {
        let payload = json!({ "choices": [] });
        assert!(matches!(extract_content(&payload), Err(LlmError::Malformed(_))));
    }

    #[test]
    fn embeddings_are_reordered_by_index() {
        let payload = json!({
            "data": [
                { "index": 1, "embedding": [0.0, 1.0] },
                { "index": 0, "embedding": [1.0, 0.0] }
            ]
        });
        let vectors = extract_embeddings(&payload, 2).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn embedding_count_mismatch_is_malformed() {
        let payload = json!({ "data": [ { "embedding": [0.5] } ] });
        assert!(matches!(extract_embeddings(&payload, 2), Err(LlmError::Malformed(_))));
    }
}
