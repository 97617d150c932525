//! Vector index clients
//!
//! The index stores one vector record per document chunk, tagged with the
//! chunk text, owning user id and source file. Records live in a namespace
//! equal to the user id, which is the multi-tenancy boundary: a query never
//! crosses namespaces.
//!
//! `upsert` aborts on the first embedding or write failure; records already
//! written stay in the index (no batch transaction). `query` treats an
//! unreachable index as an empty result, since missing retrieval context is
//! a valid degraded state for generation.

pub mod memory;

use crate::embeddings::Embedder;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

pub use memory::InMemoryIndex;

/// A retrieved chunk with its similarity score
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedChunk {
    pub text: String,
    pub score: f32,
}

/// Trait for namespaced vector index access
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Embed `chunks` and write one record per chunk under the user's
    /// namespace. Returns the number of records written.
    async fn upsert(&self, chunks: &[String], user_id: &str, source: &str) -> Result<usize>;

    /// Embed `query_text` and return up to `top_k` nearest chunks from the
    /// user's namespace, ordered by descending score. An unavailable index
    /// yields an empty result, not an error.
    async fn query(&self, query_text: &str, user_id: &str, top_k: usize) -> Result<Vec<RetrievedChunk>>;
}

/// Managed Pinecone-style REST index client
pub struct PineconeIndex {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    embedder: Arc<dyn Embedder>,
}

#[derive(Serialize)]
struct VectorRecord {
    id: String,
    values: Vec<f32>,
    metadata: RecordMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
struct RecordMetadata {
    text: String,
    user_id: String,
    source: String,
}

#[derive(Serialize)]
struct UpsertRequest {
    vectors: Vec<VectorRecord>,
    namespace: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest {
    vector: Vec<f32>,
    top_k: usize,
    namespace: String,
    include_metadata: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    score: f32,
    metadata: Option<RecordMetadata>,
}

#[derive(Deserialize)]
struct IndexStats {
    dimension: usize,
}

impl PineconeIndex {
    pub fn new(
        api_key: String,
        host: String,
        timeout_secs: u64,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: format!("https://{}", host),
            embedder,
        })
    }

    /// Verify the index exists and matches the embedder's dimension.
    ///
    /// Called once at startup; failure is a fatal configuration error, so
    /// requests never discover a missing index.
    pub async fn ensure_ready(&self) -> Result<()> {
        let url = format!("{}/describe_index_stats", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("Api-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| AppError::Configuration {
                message: format!("Vector index unreachable: {}", e),
            })?;

        if !response.status().is_success() {
            return Err(AppError::Configuration {
                message: format!("Vector index not available: HTTP {}", response.status()),
            });
        }

        let stats: IndexStats = response.json().await.map_err(|e| AppError::Configuration {
            message: format!("Failed to read index stats: {}", e),
        })?;

        if stats.dimension != self.embedder.dimension() {
            return Err(AppError::Configuration {
                message: format!(
                    "Index dimension {} does not match embedding dimension {}",
                    stats.dimension,
                    self.embedder.dimension()
                ),
            });
        }

        info!(dimension = stats.dimension, "Vector index ready");
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn upsert(&self, chunks: &[String], user_id: &str, source: &str) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let embeddings = self.embedder.embed_documents(chunks).await?;

        let vectors: Vec<VectorRecord> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, values)| VectorRecord {
                id: Uuid::new_v4().to_string(),
                values,
                metadata: RecordMetadata {
                    text: chunk.clone(),
                    user_id: user_id.to_string(),
                    source: source.to_string(),
                },
            })
            .collect();

        let count = vectors.len();
        let url = format!("{}/vectors/upsert", self.base_url);
        let request = UpsertRequest {
            vectors,
            namespace: user_id.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Upstream {
                service: "vector-index".to_string(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream {
                service: "vector-index".to_string(),
                message: format!("Upsert failed with HTTP {}: {}", status, body),
            });
        }

        info!(count, user_id, source, "Vectors upserted");
        Ok(count)
    }

    async fn query(&self, query_text: &str, user_id: &str, top_k: usize) -> Result<Vec<RetrievedChunk>> {
        let vector = self.embedder.embed_query(query_text).await?;

        let url = format!("{}/query", self.base_url);
        let request = QueryRequest {
            vector,
            top_k,
            namespace: user_id.to_string(),
            include_metadata: true,
        };

        let response = match self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(&request)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!(
                    status = response.status().as_u16(),
                    user_id,
                    "Vector index query failed, returning no context"
                );
                return Ok(Vec::new());
            }
            Err(e) => {
                warn!(error = %e, user_id, "Vector index unreachable, returning no context");
                return Ok(Vec::new());
            }
        };

        let result: QueryResponse = match response.json().await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, user_id, "Malformed query response, returning no context");
                return Ok(Vec::new());
            }
        };

        let mut chunks: Vec<RetrievedChunk> = result
            .matches
            .into_iter()
            .filter_map(|m| {
                m.metadata.map(|metadata| RetrievedChunk {
                    text: metadata.text,
                    score: m.score,
                })
            })
            .collect();

        chunks.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        chunks.truncate(top_k);

        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_response_parsing() {
        let raw = r#"{
            "matches": [
                {"id": "a", "score": 0.92, "metadata": {"text": "chunk one", "user_id": "u1", "source": "resume.pdf"}},
                {"id": "b", "score": 0.71, "metadata": {"text": "chunk two", "user_id": "u1", "source": "resume.pdf"}},
                {"id": "c", "score": 0.50}
            ]
        }"#;
        let parsed: QueryResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.matches.len(), 3);
        assert!(parsed.matches[2].metadata.is_none());
    }

    #[test]
    fn test_empty_query_response() {
        let parsed: QueryResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.matches.is_empty());
    }
}
