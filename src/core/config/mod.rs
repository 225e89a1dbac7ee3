pub mod paths;
pub mod service;
pub mod settings;
pub mod validation;

pub use paths::AppPaths;
pub use service::{redact_sensitive_values, ConfigService};
pub use settings::{
    EmbeddingSettings, GenerationSettings, RagSettings, RetrievalSettings, ServerSettings,
    VectorStoreProvider, VectorStoreSettings,
};
