//! Answer Generator. One request per call, no retries.

use std::time::Duration;

use async_trait::async_trait;

use super::error::GenerationError;
use crate::core::config::GenerationSettings;
use crate::llm::{ChatMessage, ChatRequest, OpenAiCompatClient};

#[async_trait]
pub trait Generator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Generator backed by an OpenAI-compatible `/v1/chat/completions` endpoint.
pub struct ChatCompletionGenerator {
    client: OpenAiCompatClient,
    settings: GenerationSettings,
}

impl ChatCompletionGenerator {
    pub fn new(client: OpenAiCompatClient, settings: GenerationSettings) -> Self {
        Self { client, settings }
    }

    pub fn from_settings(settings: &GenerationSettings) -> anyhow::Result<Self> {
        let client = OpenAiCompatClient::with_timeout(
            settings.base_url.clone(),
            settings.api_key.clone(),
            Duration::from_secs(settings.timeout_secs),
        )?;
        Ok(Self::new(client, settings.clone()))
    }

    fn request(&self, prompt: &str) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = self.settings.system_prompt.as_deref().filter(|s| !s.trim().is_empty()) {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(prompt));
        ChatRequest::new(messages).with_settings(&self.settings)
    }
}

#[async_trait]
impl Generator for ChatCompletionGenerator {
    fn name(&self) -> &str {
        &self.settings.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let completion = self
            .client
            .chat(self.request(prompt), &self.settings.model)
            .await?;

        let completion = completion.trim();
        if completion.is_empty() {
            return Err(GenerationError::Malformed("empty completion".to_string()));
        }
        Ok(completion.to_string())
    }
}
