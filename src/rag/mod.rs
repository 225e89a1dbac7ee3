//! Retrieval-augmented answering.
//!
//! - `encoder`: query text to vector
//! - `retriever`, `pinecone`, `memory`: nearest passages for a vector
//! - `prompt`: grounded instruction prompt
//! - `generator`: hosted model completion
//! - `pipeline`: the request path tying them together

pub mod encoder;
pub mod error;
pub mod generator;
pub mod memory;
pub mod mock;
pub mod pinecone;
pub mod pipeline;
pub mod prompt;
pub mod retriever;
pub mod types;

pub use encoder::{Embedder, HttpEmbedder};
pub use error::{EncodingError, GenerationError, PipelineError, RetrievalError};
pub use generator::{ChatCompletionGenerator, Generator};
pub use memory::InMemoryIndex;
pub use pinecone::PineconeRetriever;
pub use pipeline::RagPipeline;
pub use retriever::Retriever;
pub use types::{QueryRequest, QueryResponse, RetrievedChunk};
