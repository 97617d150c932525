//! Document ingestion pipeline
//!
//! Runs fetch, extract, chunk and upsert for one uploaded object. Object
//! paths are `{user_id}/{file_name}`; the leading segment decides the
//! vector-index namespace, so a malformed path is rejected rather than
//! guessed at. Unsupported file types are skipped, not failed: the storage
//! trigger should not retry a file we will never parse.

use crate::chunker::{self, ChunkingConfig};
use crate::errors::{AppError, Result};
use crate::extract;
use crate::services::storage::ObjectStore;
use crate::vector_store::VectorIndex;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// What happened to one storage object
#[derive(Debug, PartialEq, Eq)]
pub enum IngestOutcome {
    Ingested { chunks: usize },
    Skipped { reason: String },
}

pub struct IngestionService {
    store: Arc<dyn ObjectStore>,
    index: Arc<dyn VectorIndex>,
    chunking: ChunkingConfig,
}

impl IngestionService {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        index: Arc<dyn VectorIndex>,
        chunking: ChunkingConfig,
    ) -> Self {
        Self {
            store,
            index,
            chunking,
        }
    }

    /// Ingest one uploaded object into its owner's namespace.
    #[instrument(skip(self), fields(bucket = %bucket, object = %object))]
    pub async fn ingest_object(&self, bucket: &str, object: &str) -> Result<IngestOutcome> {
        let started = Instant::now();

        let (user_id, file_name) = split_object_path(object)?;

        let kind = match extract::detect_kind(file_name) {
            Ok(kind) => kind,
            Err(AppError::UnsupportedInput { extension }) => {
                warn!(extension = %extension, "Skipping unsupported file type");
                metrics::counter!("careerpilot_ingest_skipped_total").increment(1);
                return Ok(IngestOutcome::Skipped {
                    reason: format!("unsupported file type: {}", extension),
                });
            }
            Err(e) => return Err(e),
        };

        let bytes = self.store.fetch(bucket, object).await?;
        let text = extract::extract_text(kind, &bytes)?;

        let chunks = self.ingest_text(&text, user_id, file_name).await?;

        metrics::histogram!("careerpilot_ingest_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        Ok(IngestOutcome::Ingested { chunks })
    }

    /// Chunk and upsert already-extracted text.
    pub async fn ingest_text(&self, text: &str, user_id: &str, source: &str) -> Result<usize> {
        let chunks = chunker::chunk_words(text, &self.chunking);
        if chunks.is_empty() {
            info!(user_id = %user_id, source = %source, "Document contained no text, nothing to index");
            return Ok(0);
        }

        let upserted = self.index.upsert(&chunks, user_id, source).await?;

        info!(
            user_id = %user_id,
            source = %source,
            chunks = upserted,
            "Document ingested"
        );
        metrics::counter!("careerpilot_ingest_chunks_total").increment(upserted as u64);
        metrics::counter!("careerpilot_ingest_documents_total").increment(1);

        Ok(upserted)
    }
}

/// Split `{user_id}/{file_name}` into its parts.
fn split_object_path(object: &str) -> Result<(&str, &str)> {
    match object.split_once('/') {
        Some((user_id, file_name)) if !user_id.is_empty() && !file_name.is_empty() => {
            Ok((user_id, file_name))
        }
        _ => Err(AppError::Validation {
            message: format!("Object path must be user_id/file_name, got: {}", object),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::MockEmbedder;
    use crate::services::storage::fake::FakeObjectStore;
    use crate::vector_store::InMemoryIndex;

    fn service() -> (IngestionService, Arc<FakeObjectStore>, Arc<InMemoryIndex>) {
        let store = Arc::new(FakeObjectStore::default());
        let index = Arc::new(InMemoryIndex::new(Arc::new(MockEmbedder::new(64))));
        let service = IngestionService::new(
            store.clone(),
            index.clone(),
            ChunkingConfig {
                chunk_size: 10,
                chunk_overlap: 2,
            },
        );
        (service, store, index)
    }

    #[test]
    fn test_split_object_path() {
        assert_eq!(split_object_path("u1/resume.pdf").unwrap(), ("u1", "resume.pdf"));
        assert_eq!(
            split_object_path("u1/folder/resume.pdf").unwrap(),
            ("u1", "folder/resume.pdf")
        );
        assert!(split_object_path("no-user-segment").is_err());
        assert!(split_object_path("/resume.pdf").is_err());
        assert!(split_object_path("u1/").is_err());
    }

    #[tokio::test]
    async fn test_text_object_is_ingested_and_queryable() {
        let (service, store, index) = service();
        store
            .put(
                "uploads",
                "u1/resume.txt",
                b"Coordinated NDIS support plans for clients across Perth metro region daily"
                    .to_vec(),
            )
            .await;

        let outcome = service.ingest_object("uploads", "u1/resume.txt").await.unwrap();
        assert!(matches!(outcome, IngestOutcome::Ingested { chunks } if chunks > 0));

        let hits = index.query("NDIS support plans Perth", "u1", 3).await.unwrap();
        assert!(!hits.is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_extension_is_skipped_not_failed() {
        let (service, store, _) = service();
        store.put("uploads", "u1/resume.docx", b"whatever".to_vec()).await;

        let outcome = service.ingest_object("uploads", "u1/resume.docx").await.unwrap();
        assert!(matches!(outcome, IngestOutcome::Skipped { .. }));
    }

    #[tokio::test]
    async fn test_missing_object_is_upstream_error() {
        let (service, _, _) = service();
        let err = service.ingest_object("uploads", "u1/missing.txt").await.unwrap_err();
        assert!(matches!(err, AppError::Upstream { .. }));
    }

    #[tokio::test]
    async fn test_empty_document_indexes_nothing() {
        let (service, store, index) = service();
        store.put("uploads", "u1/empty.txt", b"   ".to_vec()).await;

        let outcome = service.ingest_object("uploads", "u1/empty.txt").await.unwrap();
        assert_eq!(outcome, IngestOutcome::Ingested { chunks: 0 });
        assert!(index.query("anything", "u1", 3).await.unwrap().is_empty());
    }
}
