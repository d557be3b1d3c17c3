//! Error types for the HTTP surface.
//!
//! Every failure is terminal for the request and maps to a well-formed
//! client-visible response; there is no fatal error class in this daemon.
//! Response bodies are structured JSON:
//! `{"error": {"code": "...", "message": "..."}}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use spawnport_core::registry::RegistryError;
use thiserror::Error;

/// Errors surfaced by the API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No valid caller identity.
    #[error("missing or invalid session credential")]
    Unauthorized,

    /// Body missing or not parseable as the expected shape.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// Port value outside the valid range.
    #[error("port {port} is outside the valid range 1-65535")]
    InvalidPort {
        /// The rejected port value.
        port: i64,
    },

    /// No record exists for the requested session.
    #[error("no port registered for session")]
    NotFound,
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    ///
    /// - Unauthorized: 401
    /// - Malformed request / invalid port: 400
    /// - Not found (operator lookup only): 404
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::MalformedRequest(_) | Self::InvalidPort { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }

    /// Returns the stable machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::MalformedRequest(_) => "malformed_request",
            Self::InvalidPort { .. } => "invalid_port",
            Self::NotFound => "not_found",
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::InvalidPort { port } => Self::InvalidPort { port },
            // The authenticator never yields an empty session id, but the
            // mapping must be total.
            RegistryError::EmptySessionId => {
                Self::MalformedRequest("empty session id".to_string())
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        }));
        (status, body).into_response()
    }
}
