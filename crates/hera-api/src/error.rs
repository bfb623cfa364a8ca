//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Guardrail failures become 400s with the validation message; stored
//! procedure errors are passed through verbatim (4xx → 400, 5xx → 500).
//! Transport and internal failures are logged and answered with a generic
//! message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hera_core::{GuardrailViolation, PosError};
use hera_rpc_client::RpcError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use utoipa::ToSchema;

/// JSON error response body: `{ "error": message, "code": CODE }`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable error message.
    pub error: String,
    /// Machine-readable error code (e.g., "VALIDATION_ERROR", "RPC_ERROR").
    pub code: String,
    /// Extra context from the stored procedure, when it supplied any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Request body or query could not be parsed (400).
    #[error("{0}")]
    BadRequest(String),

    /// Guardrail check failed (400).
    #[error("{0}")]
    Validation(String),

    /// Missing or invalid credentials (401).
    #[error("{0}")]
    Unauthorized(String),

    /// Caller may not act on the requested organization (403).
    #[error("{0}")]
    Forbidden(String),

    /// Resource not found (404).
    #[error("{0}")]
    NotFound(String),

    /// Too many requests for the organization (429).
    #[error("{0}")]
    RateLimited(String),

    /// The stored procedure rejected the call; message passed through.
    #[error("{message}")]
    Rpc {
        /// 400 for database-side 4xx, 500 for 5xx.
        status: StatusCode,
        /// Message returned by the procedure.
        message: String,
        /// `code`, `details` and `hint` from the procedure.
        details: Option<Value>,
    },

    /// Database endpoint unreachable or answered garbage (502).
    #[error("upstream error: {0}")]
    Upstream(String),

    /// RPC client not configured (503).
    #[error("{0}")]
    ServiceUnavailable(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
            Self::Rpc { status, .. } => (*status, "RPC_ERROR"),
            Self::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// Create a 503 error.
    pub fn service_unavailable(msg: &str) -> Self {
        Self::ServiceUnavailable(msg.to_string())
    }

    /// Create a 404 error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            Self::Upstream(_) => "The database endpoint could not be reached".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::Upstream(_) => tracing::warn!(error = %self, "upstream failure"),
            Self::Rpc { status, .. } if status.is_server_error() => {
                tracing::warn!(error = %self, "stored procedure failed")
            }
            _ => {}
        }

        let details = match self {
            Self::Rpc { details, .. } => details,
            _ => None,
        };

        let body = ErrorBody {
            error: message,
            code: code.to_string(),
            details,
        };
        (status, Json(body)).into_response()
    }
}

impl From<GuardrailViolation> for AppError {
    fn from(err: GuardrailViolation) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<PosError> for AppError {
    fn from(err: PosError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<RpcError> for AppError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Function {
                status,
                code,
                message,
                details,
                hint,
                ..
            } => {
                let extra = if code.is_none() && details.is_none() && hint.is_none() {
                    None
                } else {
                    Some(json!({ "code": code, "details": details, "hint": hint }))
                };
                Self::Rpc {
                    status: if status >= 500 {
                        StatusCode::INTERNAL_SERVER_ERROR
                    } else {
                        StatusCode::BAD_REQUEST
                    },
                    message,
                    details: extra,
                }
            }
            err @ (RpcError::Http { .. } | RpcError::Deserialization { .. }) => {
                Self::Upstream(err.to_string())
            }
            err @ RpcError::Serialization { .. } => Self::Internal(err.to_string()),
            RpcError::Config(e) => Self::Internal(e.to_string()),
        }
    }
}
