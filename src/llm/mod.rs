pub mod error;
pub mod openai;
pub mod types;

pub use error::LlmError;
pub use openai::OpenAiCompatClient;
pub use types::{ChatMessage, ChatRequest};
