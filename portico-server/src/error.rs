//! Error handling module
//!
//! `ApiError` covers request-scoped failures surfaced to HTTP callers.
//! `GatewayError` covers startup-fatal conditions that must abort the
//! process with a non-zero exit instead of serving in a degraded state.

use std::net::SocketAddr;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Request-visible error type with structured variants per error category
#[derive(Debug, Error)]
pub enum ApiError {
    /// Cross-origin policy violation - the request's Origin is not on the
    /// allow-list. A policy decision, not a server fault.
    #[error("The CORS policy for this site does not allow access from the specified origin")]
    CorsDenied { origin: String },

    /// Bad request - client provided invalid input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Not found - requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error - unexpected server-side failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// Service unavailable - required service is not configured or available
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl ApiError {
    /// Create a cross-origin policy violation error
    pub fn cors_denied(origin: impl Into<String>) -> Self {
        Self::CorsDenied {
            origin: origin.into(),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create an internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a service unavailable error
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::CorsDenied { .. } => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get the error code for programmatic error handling
    fn error_code(&self) -> &'static str {
        match self {
            Self::CorsDenied { .. } => "CORS_ORIGIN_DENIED",
            Self::BadRequest(_) => "INVALID_INPUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();
        let message = self.to_string();

        // Policy violations and client mistakes are warnings; only genuine
        // server-side failures are logged as errors.
        match &self {
            Self::CorsDenied { origin } => {
                tracing::warn!(
                    status = %status,
                    code = code,
                    origin = %origin,
                    "Cross-origin request denied"
                );
            }
            Self::BadRequest(_) | Self::NotFound(_) => {
                tracing::warn!(
                    status = %status,
                    code = code,
                    error = %message,
                    "Client error"
                );
            }
            Self::Internal(_) | Self::ServiceUnavailable(_) => {
                tracing::error!(
                    status = %status,
                    code = code,
                    error = %message,
                    "Server error"
                );
            }
        }

        // All error responses include a `code` field for programmatic error handling
        let body = serde_json::json!({
            "error": message,
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}

/// Startup-fatal and lifecycle errors. None of these are recovered locally;
/// they propagate to the process exit path.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The key-value store connection string could not be parsed
    #[error("invalid key-value store connection string: {0}")]
    KeyValueStore(#[from] redis::RedisError),

    /// The document store connection string could not be parsed
    #[error("invalid document store connection string: {0}")]
    DocumentStore(#[from] mongodb::error::Error),

    /// The query-execution layer failed its asynchronous initialization
    #[error("execution layer failed to initialize: {0}")]
    ExecutionInit(String),

    /// Socket binding failed (port in use, permission denied)
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The listener failed while serving
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),

    /// The serve task aborted or panicked
    #[error("gateway task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
