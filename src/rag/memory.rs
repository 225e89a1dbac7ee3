//! In-process vector index, seeded from a JSONL file.
//!
//! Each line is `{"id": ..., "text": ..., "vector": [...], "metadata": {...}}`.
//! Useful for local development and tests where no hosted index exists.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::RetrievalError;
use super::retriever::{validate_top_k, Retriever};
use super::types::RetrievedChunk;
use crate::vector_math::rank_descending_by_cosine;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexRecord {
    pub id: String,
    pub text: String,
    pub vector: Vec<f32>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

pub struct InMemoryIndex {
    records: Vec<IndexRecord>,
    dimension: usize,
}

impl InMemoryIndex {
    /// All records must share one non-zero dimension.
    pub fn from_records(records: Vec<IndexRecord>) -> anyhow::Result<Self> {
        let dimension = records.first().map(|r| r.vector.len()).unwrap_or(0);
        for record in &records {
            if record.vector.is_empty() {
                bail!("record '{}' has an empty vector", record.id);
            }
            if record.vector.len() != dimension {
                bail!(
                    "record '{}' has dimension {}, expected {}",
                    record.id,
                    record.vector.len(),
                    dimension
                );
            }
        }
        Ok(Self { records, dimension })
    }

    pub fn load_jsonl(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read index seed {}", path.display()))?;

        let mut records = Vec::new();
        for (line_no, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let record: IndexRecord = serde_json::from_str(line)
                .with_context(|| format!("{}:{}: invalid record", path.display(), line_no + 1))?;
            records.push(record);
        }

        let index = Self::from_records(records)?;
        tracing::info!(
            "Loaded {} passages (dimension {}) from {}",
            index.len(),
            index.dimension,
            path.display()
        );
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Zero for an empty index.
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

#[async_trait]
impl Retriever for InMemoryIndex {
    fn name(&self) -> &str {
        "memory"
    }

    async fn search(
        &self,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, RetrievalError> {
        validate_top_k(top_k)?;
        if self.records.is_empty() {
            return Ok(Vec::new());
        }
        if vector.len() != self.dimension {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        // ties stay in insertion order
        let scored = rank_descending_by_cosine(vector, self.records.iter().map(|r| &r.vector));

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(idx, score)| {
                let record = &self.records[idx];
                RetrievedChunk {
                    id: record.id.clone(),
                    text: record.text.clone(),
                    score,
                    metadata: record.metadata.clone(),
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn record(id: &str, vector: Vec<f32>) -> IndexRecord {
        IndexRecord {
            id: id.to_string(),
            text: format!("passage {}", id),
            vector,
            metadata: Map::new(),
        }
    }

    fn sample_index() -> InMemoryIndex {
        InMemoryIndex::from_records(vec![
            record("orthogonal", vec![0.0, 1.0, 0.0]),
            record("close", vec![0.9, 0.1, 0.0]),
            record("exact", vec![1.0, 0.0, 0.0]),
            record("exact-twin", vec![2.0, 0.0, 0.0]),
            record("far", vec![0.0, 0.0, 1.0]),
        ])
        .expect("valid records")
    }

    #[tokio::test]
    async fn results_are_sorted_by_score() {
        let index = sample_index();
        let results = index.search(&[1.0, 0.0, 0.0], 3).await.unwrap();

        assert_eq!(results.len(), 3);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(results.iter().all(|c| c.score <= results[0].score));
    }

    #[tokio::test]
    async fn ties_keep_insertion_order() {
        let index = sample_index();
        let results = index.search(&[1.0, 0.0, 0.0], 2).await.unwrap();
        let ids: Vec<&str> = results.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["exact", "exact-twin"]);
    }

    #[tokio::test]
    async fn identical_queries_return_identical_results() {
        let index = sample_index();
        let query = [0.3, 0.7, 0.1];
        let first = index.search(&query, 4).await.unwrap();
        let second = index.search(&query, 4).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn top_k_larger_than_index_returns_everything() {
        let index = sample_index();
        let results = index.search(&[0.0, 0.0, 1.0], 50).await.unwrap();
        assert_eq!(results.len(), 5);
        assert_eq!(results[0].id, "far");
    }

    #[tokio::test]
    async fn invalid_top_k_and_dimension_are_errors() {
        let index = sample_index();
        assert!(matches!(
            index.search(&[1.0, 0.0, 0.0], 0).await,
            Err(RetrievalError::InvalidTopK { .. })
        ));
        assert!(matches!(
            index.search(&[1.0, 0.0], 3).await,
            Err(RetrievalError::DimensionMismatch { expected: 3, actual: 2 })
        ));
    }

    #[test]
    fn mixed_dimensions_are_rejected() {
        let result = InMemoryIndex::from_records(vec![
            record("a", vec![1.0, 0.0]),
            record("b", vec![1.0, 0.0, 0.0]),
        ]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn loads_jsonl_seed() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(
            file,
            r#"{{"id":"pod","text":"A pod is the smallest deployable unit in Kubernetes.","vector":[1.0,0.0],"metadata":{{"source":"concepts/pods.md"}}}}"#
        )
        .unwrap();
        writeln!(file).unwrap();
        writeln!(
            file,
            r#"{{"id":"svc","text":"A Service exposes a set of pods.","vector":[0.0,1.0]}}"#
        )
        .unwrap();

        let index = InMemoryIndex::load_jsonl(file.path()).expect("valid seed");
        assert_eq!(index.len(), 2);
        assert_eq!(index.dimension(), 2);

        let results = index.search(&[1.0, 0.1], 1).await.unwrap();
        assert_eq!(results[0].id, "pod");
        assert_eq!(results[0].metadata["source"], "concepts/pods.md");
    }

    #[test]
    fn bad_seed_line_reports_position() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "not json").unwrap();
        let err = InMemoryIndex::load_jsonl(file.path()).err().expect("should fail");
        assert!(format!("{:#}", err).contains(":1:"));
    }
}
