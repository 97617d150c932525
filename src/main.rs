mod auth;
mod chunker;
mod config;
mod embeddings;
mod errors;
mod extract;
mod generation;
mod metrics;
mod routes;
mod schemas;
mod services;
mod tools;
mod vector_store;

use crate::auth::{JwksVerifier, StaticVerifier, TokenVerifier};
use crate::chunker::ChunkingConfig;
use crate::embeddings::{Embedder, GeminiEmbedder, MockEmbedder};
use crate::errors::AppError;
use crate::generation::{GeminiModel, GenerativeModel, Orchestrator, ScriptedModel};
use crate::services::ingestion::IngestionService;
use crate::services::storage::HttpObjectStore;
use crate::tools::{CompanyResearch, DocumentRetrieval, Tool, ToolSet};
use crate::vector_store::{InMemoryIndex, PineconeIndex, VectorIndex};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load and validate configuration; any problem here is fatal
    dotenvy::dotenv().ok();
    let config = config::AppConfig::load()?;

    // 2. Setup logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));
    if config.observability.json_logging {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!("Starting CareerPilot...");
    config.validate()?;

    // 3. Metrics exporter on its own listener
    metrics::init_exporter(config.observability.metrics_port)?;

    // 4. Embedder
    let embedder: Arc<dyn Embedder> = match config.embedding.provider.as_str() {
        "gemini" => {
            let api_key = require(config.embedding.api_key.clone(), "embedding.api_key")?;
            Arc::new(GeminiEmbedder::new(&config.embedding, api_key)?)
        }
        "mock" => Arc::new(MockEmbedder::new(config.embedding.dimension)),
        other => {
            return Err(AppError::Configuration {
                message: format!("Unknown embedding provider: {}", other),
            }
            .into())
        }
    };

    // 5. Vector index; readiness is checked before serving traffic
    let index: Arc<dyn VectorIndex> = match config.index.provider.as_str() {
        "pinecone" => {
            let api_key = require(config.index.api_key.clone(), "index.api_key")?;
            let host = require(config.index.host.clone(), "index.host")?;
            let pinecone =
                PineconeIndex::new(api_key, host, config.index.timeout_secs, embedder.clone())?;
            pinecone.ensure_ready().await?;
            Arc::new(pinecone)
        }
        "memory" => Arc::new(InMemoryIndex::new(embedder.clone())),
        other => {
            return Err(AppError::Configuration {
                message: format!("Unknown index provider: {}", other),
            }
            .into())
        }
    };

    // 6. Generative model and tools
    let model: Arc<dyn GenerativeModel> = match config.generation.provider.as_str() {
        "gemini" => {
            let api_key = require(config.generation.api_key.clone(), "generation.api_key")?;
            Arc::new(GeminiModel::new(&config.generation, api_key)?)
        }
        "scripted" => Arc::new(ScriptedModel::new("{}")),
        other => {
            return Err(AppError::Configuration {
                message: format!("Unknown generation provider: {}", other),
            }
            .into())
        }
    };

    let mut tools: Vec<Box<dyn Tool>> =
        vec![Box::new(DocumentRetrieval::new(index.clone(), config.index.top_k))];
    if config.research.enabled {
        let api_key = require(config.research.api_key.clone(), "research.api_key")?;
        tools.push(Box::new(CompanyResearch::new(&config.research, api_key)?));
        tracing::info!("Company research tool enabled");
    }
    let orchestrator = Arc::new(Orchestrator::new(model, ToolSet(tools)));

    // 7. Ingestion pipeline
    let store = Arc::new(HttpObjectStore::new(&config.storage)?);
    let ingestion = Arc::new(IngestionService::new(
        store,
        index,
        ChunkingConfig {
            chunk_size: config.ingestion.chunk_size,
            chunk_overlap: config.ingestion.chunk_overlap,
        },
    ));

    // 8. Token verifier
    let verifier: Arc<dyn TokenVerifier> = match config.auth.provider.as_str() {
        "google" => {
            let project_id = require(config.auth.project_id.clone(), "auth.project_id")?;
            Arc::new(JwksVerifier::new(&project_id, config.auth.jwks_url.clone()))
        }
        "static" => {
            let spec = require(config.auth.static_identity.clone(), "auth.static_identity")?;
            Arc::new(StaticVerifier::from_spec(&spec)?)
        }
        other => {
            return Err(AppError::Configuration {
                message: format!("Unknown auth provider: {}", other),
            }
            .into())
        }
    };

    // 9. Router and server
    let state = services::AppState::new(ingestion, orchestrator, verifier);
    let app = routes::create_router(
        state,
        &config.server.allowed_origins,
        config.request_timeout(),
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn require(value: Option<String>, name: &str) -> Result<String, AppError> {
    value.ok_or_else(|| AppError::Configuration {
        message: format!("{} is required", name),
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .unwrap_or_else(|e| tracing::error!(error = %e, "Failed to install Ctrl+C handler"));
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
