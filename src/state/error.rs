use thiserror::Error;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to load configuration: {0}")]
    Config(#[source] anyhow::Error),

    #[error("Failed to initialize embedding encoder: {0}")]
    Embedding(#[source] anyhow::Error),

    #[error("Failed to initialize vector retriever: {0}")]
    Retriever(#[source] anyhow::Error),

    #[error("Failed to initialize answer generator: {0}")]
    Generation(#[source] anyhow::Error),
}
