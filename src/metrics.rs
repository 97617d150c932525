//! Metrics and observability
//!
//! Prometheus exposition on a dedicated port, with metric descriptions
//! registered up front so the scrape surface is stable from first request.

use crate::errors::{AppError, Result};
use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

/// Metrics prefix for all CareerPilot metrics
pub const METRICS_PREFIX: &str = "careerpilot";

/// Start the Prometheus exporter on its own listener. Port 0 disables the
/// exporter; metric recording stays a no-op in that case.
pub fn init_exporter(port: u16) -> Result<()> {
    if port == 0 {
        info!("Metrics exporter disabled");
        return Ok(());
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| AppError::Configuration {
            message: format!("Failed to start metrics exporter on {}: {}", addr, e),
        })?;

    register_metrics();
    info!(%addr, "Metrics exporter listening");
    Ok(())
}

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_counter!(
        format!("{}_generations_total", METRICS_PREFIX),
        Unit::Count,
        "Completed generation flows"
    );

    describe_gauge!(
        format!("{}_retrieval_results_count", METRICS_PREFIX),
        Unit::Count,
        "Chunks returned by the last document retrieval"
    );

    describe_counter!(
        format!("{}_ingest_documents_total", METRICS_PREFIX),
        Unit::Count,
        "Documents ingested"
    );

    describe_counter!(
        format!("{}_ingest_chunks_total", METRICS_PREFIX),
        Unit::Count,
        "Chunks upserted into the vector index"
    );

    describe_counter!(
        format!("{}_ingest_skipped_total", METRICS_PREFIX),
        Unit::Count,
        "Storage objects skipped as unsupported"
    );

    describe_histogram!(
        format!("{}_ingest_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Document ingestion latency in seconds"
    );

    describe_counter!(
        format!("{}_embedding_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Embedding API requests"
    );

    describe_histogram!(
        format!("{}_embedding_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Embedding request latency in seconds"
    );

    info!("Metrics registered");
}
