//! Configuration management
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/{env}.toml, config/local.toml)
//! - Default values
//!
//! Missing required secrets are reported as fatal errors at startup, never
//! per-request.

use crate::errors::AppError;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub embedding: EmbeddingConfig,
    pub index: IndexConfig,
    pub generation: GenerationConfig,
    pub research: ResearchConfig,
    pub storage: StorageConfig,
    pub ingestion: IngestionConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Allowed CORS origins; empty means allow any (development)
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Verifier backend: google, static
    #[serde(default = "default_auth_provider")]
    pub provider: String,

    /// Identity-provider project id (token audience)
    pub project_id: Option<String>,

    /// JWKS endpoint for token signature keys
    #[serde(default = "default_jwks_url")]
    pub jwks_url: String,

    /// Static-provider token accepted in development, `token:user_id:email`
    pub static_identity: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    /// Embedding provider: gemini, mock
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    /// API key for the embedding service
    pub api_key: Option<String>,

    #[serde(default = "default_embedding_api_base")]
    pub api_base: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_embedding_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexConfig {
    /// Vector index backend: pinecone, memory
    #[serde(default = "default_index_provider")]
    pub provider: String,

    /// API key for the managed index
    pub api_key: Option<String>,

    /// Index host, e.g. my-index-abc123.svc.us-west1-gcp.pinecone.io
    pub host: Option<String>,

    /// Results retrieved per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationConfig {
    /// Generative model provider: gemini, scripted (tests only)
    #[serde(default = "default_generation_provider")]
    pub provider: String,

    pub api_key: Option<String>,

    #[serde(default = "default_embedding_api_base")]
    pub api_base: String,

    #[serde(default = "default_generation_model")]
    pub model: String,

    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResearchConfig {
    /// Company-research tool toggle; requires api_key when enabled
    #[serde(default)]
    pub enabled: bool,

    pub api_key: Option<String>,

    #[serde(default = "default_research_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_research_model")]
    pub model: String,

    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_base")]
    pub base_url: String,

    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestionConfig {
    /// Chunk size in words
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between adjacent chunks in words; must be < chunk_size
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub json_logging: bool,

    /// Prometheus exposition port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 60 }
fn default_auth_provider() -> String { "google".to_string() }
fn default_jwks_url() -> String {
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com"
        .to_string()
}
fn default_embedding_provider() -> String { "gemini".to_string() }
fn default_embedding_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_embedding_model() -> String { "models/embedding-001".to_string() }
fn default_embedding_dimension() -> usize { 768 }
fn default_embedding_retries() -> u32 { 3 }
fn default_index_provider() -> String { "pinecone".to_string() }
fn default_top_k() -> usize { 5 }
fn default_generation_provider() -> String { "gemini".to_string() }
fn default_generation_model() -> String { "models/gemini-1.5-pro-latest".to_string() }
fn default_generation_timeout() -> u64 { 120 }
fn default_research_endpoint() -> String {
    "https://api.perplexity.ai/chat/completions".to_string()
}
fn default_research_model() -> String { "llama-3-sonar-large-32k-online".to_string() }
fn default_storage_base() -> String { "https://storage.googleapis.com".to_string() }
fn default_upstream_timeout() -> u64 { 30 }
fn default_chunk_size() -> usize { 200 }
fn default_chunk_overlap() -> usize { 40 }
fn default_log_level() -> String { "info".to_string() }
fn default_metrics_port() -> u16 { 9090 }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g. APP__INDEX__API_KEY=...
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Check cross-field invariants and required secrets. Called once at
    /// startup; any failure prevents the service from starting.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.ingestion.chunk_overlap >= self.ingestion.chunk_size {
            return Err(AppError::Configuration {
                message: format!(
                    "ingestion.chunk_overlap ({}) must be less than ingestion.chunk_size ({})",
                    self.ingestion.chunk_overlap, self.ingestion.chunk_size
                ),
            });
        }

        if self.auth.provider == "google" && self.auth.project_id.is_none() {
            return Err(AppError::Configuration {
                message: "auth.project_id is required with the google verifier".to_string(),
            });
        }

        if self.embedding.provider == "gemini" && self.embedding.api_key.is_none() {
            return Err(AppError::Configuration {
                message: "embedding.api_key is required with the gemini provider".to_string(),
            });
        }

        if self.index.provider == "pinecone" {
            if self.index.api_key.is_none() || self.index.host.is_none() {
                return Err(AppError::Configuration {
                    message: "index.api_key and index.host are required with the pinecone provider"
                        .to_string(),
                });
            }
        }

        if self.generation.provider == "gemini" && self.generation.api_key.is_none() {
            return Err(AppError::Configuration {
                message: "generation.api_key is required with the gemini provider".to_string(),
            });
        }

        if self.research.enabled && self.research.api_key.is_none() {
            return Err(AppError::Configuration {
                message: "research.api_key is required when research is enabled".to_string(),
            });
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                request_timeout_secs: default_request_timeout(),
                allowed_origins: Vec::new(),
            },
            auth: AuthConfig {
                provider: default_auth_provider(),
                project_id: None,
                jwks_url: default_jwks_url(),
                static_identity: None,
            },
            embedding: EmbeddingConfig {
                provider: default_embedding_provider(),
                api_key: None,
                api_base: default_embedding_api_base(),
                model: default_embedding_model(),
                dimension: default_embedding_dimension(),
                timeout_secs: default_upstream_timeout(),
                max_retries: default_embedding_retries(),
            },
            index: IndexConfig {
                provider: default_index_provider(),
                api_key: None,
                host: None,
                top_k: default_top_k(),
                timeout_secs: default_upstream_timeout(),
            },
            generation: GenerationConfig {
                provider: default_generation_provider(),
                api_key: None,
                api_base: default_embedding_api_base(),
                model: default_generation_model(),
                timeout_secs: default_generation_timeout(),
            },
            research: ResearchConfig {
                enabled: false,
                api_key: None,
                endpoint: default_research_endpoint(),
                model: default_research_model(),
                timeout_secs: default_upstream_timeout(),
            },
            storage: StorageConfig {
                base_url: default_storage_base(),
                timeout_secs: default_upstream_timeout(),
            },
            ingestion: IngestionConfig {
                chunk_size: default_chunk_size(),
                chunk_overlap: default_chunk_overlap(),
            },
            observability: ObservabilityConfig {
                log_level: default_log_level(),
                json_logging: false,
                metrics_port: default_metrics_port(),
            },
        }
    }
}
