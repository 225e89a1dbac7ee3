//! Typed view of the merged configuration tree.
//!
//! Every section is optional in `config.yml`; missing keys fall back to the
//! defaults below.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_TOP_K: usize = 3;
pub const MAX_TOP_K: usize = 100;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    pub server: ServerSettings,
    pub embedding: EmbeddingSettings,
    pub vector_store: VectorStoreSettings,
    pub retrieval: RetrievalSettings,
    pub generation: GenerationSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Base URL of an OpenAI-compatible server exposing `/v1/embeddings`.
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub dimension: usize,
    pub max_input_tokens: usize,
    /// HuggingFace `tokenizer.json` used to count tokens exactly.
    pub tokenizer_path: Option<PathBuf>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            model: "all-MiniLM-L6-v2".to_string(),
            api_key: None,
            dimension: 384,
            max_input_tokens: 256,
            tokenizer_path: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorStoreProvider {
    Pinecone,
    Memory,
}

impl VectorStoreProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            VectorStoreProvider::Pinecone => "pinecone",
            VectorStoreProvider::Memory => "memory",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    pub provider: VectorStoreProvider,
    pub api_key: Option<String>,
    pub index_name: String,
    /// Data-plane host. Resolved from the control plane when absent.
    pub index_host: Option<String>,
    pub controller_url: String,
    pub namespace: Option<String>,
    /// Metadata field holding the passage text.
    pub text_key: String,
    /// JSONL seed file for the `memory` provider.
    pub memory_path: Option<PathBuf>,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: VectorStoreProvider::Pinecone,
            api_key: None,
            index_name: "aws-rag".to_string(),
            index_host: None,
            controller_url: "https://api.pinecone.io".to_string(),
            namespace: None,
            text_key: "text".to_string(),
            memory_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Base URL of an OpenAI-compatible server exposing `/v1/chat/completions`.
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub system_prompt: Option<String>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            temperature: 0.2,
            max_tokens: 512,
            timeout_secs: 60,
            system_prompt: Some(
                "You are a Kubernetes technical support assistant.".to_string(),
            ),
        }
    }
}
