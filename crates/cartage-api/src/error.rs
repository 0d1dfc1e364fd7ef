//! # API Error Mapping
//!
//! Translates [`DomainError`] outcomes into the HTTP outcome envelope.
//! Every failure body has the shape
//! `{"ok": false, "error_kind": "...", "message": "..."}`; internal
//! messages never leak to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cartage_core::DomainError;

/// Failure body returned for every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub ok: bool,
    pub error_kind: String,
    pub message: String,
}

/// Application-level error type implementing [`IntoResponse`].
///
/// Domain errors carry their own kind string; the two API-only variants
/// (`Unauthorized`, `Internal`) cover concerns the domain never sees.
#[derive(Error, Debug)]
pub enum AppError {
    /// A domain operation failed; status follows the error taxonomy.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Missing or unresolvable bearer token (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Internal failure (500). Message is logged, never returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status and machine-readable kind for this error.
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Domain(e) => {
                let status = match e {
                    DomainError::NotFound(_) => StatusCode::NOT_FOUND,
                    DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
                    DomainError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    // State conflicts: the request was well-formed but lost
                    // against the mission's current state.
                    DomainError::InvalidTransition { .. }
                    | DomainError::InvalidPriceDirection { .. }
                    | DomainError::DuplicateAcceptance
                    | DomainError::AlreadyAssigned => StatusCode::CONFLICT,
                    DomainError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                };
                (status, e.kind())
            }
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();

        let message = match &self {
            Self::Internal(_) => "an internal error occurred".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::Domain(DomainError::Unavailable(_)) => {
                tracing::warn!(error = %self, "store unavailable")
            }
            _ => {}
        }

        let body = ErrorBody {
            ok: false,
            error_kind: kind.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
