//! In-memory vector index
//!
//! Cosine-similarity index keyed by namespace, backing tests and local
//! development without a managed index.

use super::{RetrievedChunk, VectorIndex};
use crate::embeddings::Embedder;
use crate::errors::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

struct StoredRecord {
    #[allow(dead_code)]
    id: String,
    values: Vec<f32>,
    text: String,
}

pub struct InMemoryIndex {
    embedder: Arc<dyn Embedder>,
    namespaces: RwLock<HashMap<String, Vec<StoredRecord>>>,
}

impl InMemoryIndex {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            namespaces: RwLock::new(HashMap::new()),
        }
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn upsert(&self, chunks: &[String], user_id: &str, _source: &str) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let embeddings = self.embedder.embed_documents(chunks).await?;

        let mut namespaces = self.namespaces.write().await;
        let records = namespaces.entry(user_id.to_string()).or_default();
        for (chunk, values) in chunks.iter().zip(embeddings) {
            records.push(StoredRecord {
                id: Uuid::new_v4().to_string(),
                values,
                text: chunk.clone(),
            });
        }

        Ok(chunks.len())
    }

    async fn query(&self, query_text: &str, user_id: &str, top_k: usize) -> Result<Vec<RetrievedChunk>> {
        let vector = self.embedder.embed_query(query_text).await?;

        let namespaces = self.namespaces.read().await;
        let Some(records) = namespaces.get(user_id) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<RetrievedChunk> = records
            .iter()
            .map(|record| RetrievedChunk {
                text: record.text.clone(),
                score: cosine_similarity(&vector, &record.values),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::MockEmbedder;

    fn index() -> InMemoryIndex {
        InMemoryIndex::new(Arc::new(MockEmbedder::new(128)))
    }

    #[tokio::test]
    async fn test_upsert_then_query_returns_related_chunk() {
        let index = index();
        let chunks = vec![
            "supported NDIS clients with daily living activities in Perth".to_string(),
            "prepared quarterly budget reports for the finance team".to_string(),
        ];
        index.upsert(&chunks, "u1", "resume.pdf").await.unwrap();

        let results = index
            .query("Disability Support Worker NDIS Perth", "u1", 1)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].text.contains("NDIS clients"));
    }

    #[tokio::test]
    async fn test_namespace_isolation() {
        let index = index();
        index
            .upsert(&["private resume content".to_string()], "u1", "resume.pdf")
            .await
            .unwrap();

        let results = index.query("private resume content", "u2", 5).await.unwrap();
        assert!(results.is_empty(), "another user's vectors leaked");
    }

    #[tokio::test]
    async fn test_empty_index_returns_empty_not_error() {
        let results = index().query("anything", "nobody", 3).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_results_ordered_by_descending_score() {
        let index = index();
        let chunks = vec![
            "client care plans and NDIS compliance".to_string(),
            "unrelated warehouse logistics inventory".to_string(),
            "NDIS client support and care coordination".to_string(),
        ];
        index.upsert(&chunks, "u1", "resume.pdf").await.unwrap();

        let results = index.query("NDIS client care", "u1", 3).await.unwrap();
        assert_eq!(results.len(), 3);
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[tokio::test]
    async fn test_top_k_bound() {
        let index = index();
        let chunks: Vec<String> = (0..10).map(|i| format!("chunk number {}", i)).collect();
        index.upsert(&chunks, "u1", "notes.txt").await.unwrap();

        let results = index.query("chunk number", "u1", 3).await.unwrap();
        assert_eq!(results.len(), 3);
    }
}
