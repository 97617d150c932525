//! Storage event endpoint
//!
//! Receives push notifications for finalized uploads. Any error response
//! makes the delivery platform retry, so unsupported file types are
//! acknowledged as skipped rather than failed.

use crate::errors::Result;
use crate::services::ingestion::IngestOutcome;
use crate::services::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Storage notification payload; `name` is the full object path
#[derive(Debug, Deserialize)]
pub struct StorageEvent {
    pub bucket: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[instrument(skip_all, fields(bucket = %event.bucket, object = %event.name))]
pub async fn storage_event(
    State(state): State<AppState>,
    Json(event): Json<StorageEvent>,
) -> Result<Json<IngestResponse>> {
    metrics::counter!("careerpilot_requests_total", "endpoint" => "storage_event").increment(1);

    let outcome = state.ingestion.ingest_object(&event.bucket, &event.name).await?;

    let response = match outcome {
        IngestOutcome::Ingested { chunks } => IngestResponse {
            status: "ingested",
            chunks: Some(chunks),
            reason: None,
        },
        IngestOutcome::Skipped { reason } => IngestResponse {
            status: "skipped",
            chunks: None,
            reason: Some(reason),
        },
    };

    Ok(Json(response))
}
