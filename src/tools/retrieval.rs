//! Document retrieval tool
//!
//! Queries the caller's namespace of the vector index and formats the
//! retrieved chunks as prompt context. Embedding failures propagate;
//! an empty or unavailable index yields the explicit "no documents"
//! message so the prompt stays well-formed.

use super::Tool;
use crate::errors::Result;
use crate::vector_store::VectorIndex;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub const DOCUMENT_RETRIEVAL_TOOL: &str = "retrieve_user_documents";

pub const NO_DOCUMENTS_FOUND: &str = "No relevant documents found for the user.";

pub struct DocumentRetrieval {
    index: Arc<dyn VectorIndex>,
    top_k: usize,
}

#[derive(Deserialize)]
struct RetrievalInput {
    query: String,
    user_id: String,
}

impl DocumentRetrieval {
    pub fn new(index: Arc<dyn VectorIndex>, top_k: usize) -> Self {
        Self { index, top_k }
    }
}

#[async_trait]
impl Tool for DocumentRetrieval {
    fn name(&self) -> &str {
        DOCUMENT_RETRIEVAL_TOOL
    }

    fn description(&self) -> &str {
        "Retrieve relevant text from the user's uploaded historical application documents"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search text, typically the job description"
                },
                "user_id": {
                    "type": "string",
                    "description": "Owning user whose namespace is searched"
                }
            },
            "required": ["query", "user_id"]
        })
    }

    async fn invoke(&self, input: &str) -> Result<String> {
        let args: RetrievalInput = serde_json::from_str(input)?;

        let chunks = self
            .index
            .query(&args.query, &args.user_id, self.top_k)
            .await?;

        debug!(
            user_id = %args.user_id,
            results = chunks.len(),
            "Document retrieval completed"
        );

        metrics::gauge!("careerpilot_retrieval_results_count").set(chunks.len() as f64);

        if chunks.is_empty() {
            return Ok(NO_DOCUMENTS_FOUND.to_string());
        }

        Ok(chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n---\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::MockEmbedder;
    use crate::vector_store::InMemoryIndex;

    fn tool_with_index() -> (DocumentRetrieval, Arc<InMemoryIndex>) {
        let index = Arc::new(InMemoryIndex::new(Arc::new(MockEmbedder::new(128))));
        (DocumentRetrieval::new(index.clone(), 3), index)
    }

    #[tokio::test]
    async fn test_empty_namespace_yields_no_documents_message() {
        let (tool, _) = tool_with_index();
        let output = tool
            .invoke(r#"{"query": "support worker", "user_id": "u2"}"#)
            .await
            .unwrap();
        assert_eq!(output, NO_DOCUMENTS_FOUND);
    }

    #[tokio::test]
    async fn test_retrieved_chunks_are_joined() {
        let (tool, index) = tool_with_index();
        index
            .upsert(
                &[
                    "supported NDIS clients in Perth".to_string(),
                    "managed care plan reviews".to_string(),
                ],
                "u1",
                "resume.pdf",
            )
            .await
            .unwrap();

        let output = tool
            .invoke(r#"{"query": "NDIS support Perth", "user_id": "u1"}"#)
            .await
            .unwrap();
        assert!(output.contains("NDIS clients"));
        assert!(output.contains("---"));
    }
}
