use std::cmp::Ordering;

use async_trait::async_trait;

use super::error::RetrievalError;
use super::types::RetrievedChunk;
use crate::core::config::settings::MAX_TOP_K;

/// Vector Retriever: nearest stored passages for a query vector.
///
/// Implementations return at most `top_k` chunks ordered by non-increasing
/// score. Equal scores keep the order the index produced them in.
#[async_trait]
pub trait Retriever: Send + Sync {
    fn name(&self) -> &str;

    async fn search(
        &self,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, RetrievalError>;
}

pub fn validate_top_k(top_k: usize) -> Result<(), RetrievalError> {
    if top_k == 0 || top_k > MAX_TOP_K {
        return Err(RetrievalError::InvalidTopK {
            requested: top_k,
            max: MAX_TOP_K,
        });
    }
    Ok(())
}

/// Stable descending sort by score, then truncation to `top_k`.
pub fn rank_chunks(mut chunks: Vec<RetrievedChunk>, top_k: usize) -> Vec<RetrievedChunk> {
    chunks.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    chunks.truncate(top_k);
    chunks
}
