//! Error types for the CareerPilot service
//!
//! One `AppError` enum carries every failure mode, with machine-readable
//! error codes and HTTP status mapping. Upstream and model-output failures
//! are logged server-side and surfaced to clients as generic messages.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,
    UnsupportedInput,

    // Authentication errors (2xxx)
    Unauthenticated,
    ExpiredToken,

    // External service errors (5xxx)
    EmbeddingError,
    UpstreamError,

    // Model output errors (6xxx)
    MalformedModelOutput,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 1001,
            ErrorCode::UnsupportedInput => 1002,
            ErrorCode::Unauthenticated => 2001,
            ErrorCode::ExpiredToken => 2002,
            ErrorCode::EmbeddingError => 5001,
            ErrorCode::UpstreamError => 5002,
            ErrorCode::MalformedModelOutput => 6001,
            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Unsupported input: {extension} files are not ingested")]
    UnsupportedInput { extension: String },

    #[error("Unauthenticated: {message}")]
    Unauthenticated { message: String },

    #[error("Token expired")]
    ExpiredToken,

    #[error("Embedding service error: {message}")]
    Embedding { message: String },

    #[error("Upstream service {service} unavailable: {message}")]
    Upstream { service: String, message: String },

    #[error("Malformed model output: {message}")]
    MalformedModelOutput { message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::UnsupportedInput { .. } => ErrorCode::UnsupportedInput,
            AppError::Unauthenticated { .. } => ErrorCode::Unauthenticated,
            AppError::ExpiredToken => ErrorCode::ExpiredToken,
            AppError::Embedding { .. } => ErrorCode::EmbeddingError,
            AppError::Upstream { .. } => ErrorCode::UpstreamError,
            AppError::MalformedModelOutput { .. } => ErrorCode::MalformedModelOutput,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::HttpClient(_) => ErrorCode::UpstreamError,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::UnsupportedInput { .. } => {
                StatusCode::BAD_REQUEST
            }

            AppError::Unauthenticated { .. } | AppError::ExpiredToken => StatusCode::UNAUTHORIZED,

            AppError::Embedding { .. } | AppError::Upstream { .. } | AppError::HttpClient(_) => {
                StatusCode::BAD_GATEWAY
            }

            AppError::MalformedModelOutput { .. }
            | AppError::Internal { .. }
            | AppError::Configuration { .. }
            | AppError::Serialization(_)
            | AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Message safe to return to clients. Upstream and model failures keep
    /// their detail server-side only.
    fn client_message(&self) -> String {
        match self {
            AppError::Validation { .. }
            | AppError::UnsupportedInput { .. }
            | AppError::Unauthenticated { .. }
            | AppError::ExpiredToken => self.to_string(),
            AppError::MalformedModelOutput { .. } => {
                "Generation failed: the model did not return usable content".to_string()
            }
            AppError::Embedding { .. } | AppError::Upstream { .. } | AppError::HttpClient(_) => {
                "An upstream service is unavailable".to_string()
            }
            _ => "Internal server error".to_string(),
        }
    }
}

/// Structured error response for the API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        if self.is_server_error() {
            tracing::error!(
                error = %self,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else {
            tracing::warn!(
                error = %self,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code,
                message: self.client_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}
