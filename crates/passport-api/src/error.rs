//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Every failure leaves the service as the same `{status, message, errors?}`
//! envelope. Internal details are logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric HTTP status as a string, e.g. `"404"`.
    pub status: String,
    /// Stable, human-readable message.
    pub message: String,
    /// Individual violations, present only for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl ErrorBody {
    /// Envelope for `status` with no violation list.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16().to_string(),
            message: message.into(),
            errors: None,
        }
    }
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Entity absent (404).
    #[error("{0}")]
    NotFound(String),

    /// Duplicate identity on insert (409).
    #[error("{0}")]
    AlreadyExists(String),

    /// One or more required fields missing (422). Carries every violation.
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Body could not be decoded (400).
    #[error("{0}")]
    MalformedInput(String),

    /// Path parameter could not be parsed (400).
    #[error("{0}")]
    InvalidIdentifier(String),

    /// Per-client bucket exhausted (429).
    #[error("rate limit exceeded")]
    RateLimited,

    /// Unexpected store or logic failure (500). Detail is logged only.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::AlreadyExists(_) => StatusCode::CONFLICT,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::MalformedInput(_) | Self::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert into the response envelope, logging as appropriate.
    fn into_body(self) -> ErrorBody {
        let status = self.status();
        match self {
            Self::Validation(errors) => ErrorBody {
                errors: Some(errors),
                ..ErrorBody::new(status, "validation failed")
            },
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "internal server error");
                ErrorBody::new(status, "something went wrong")
            }
            Self::RateLimited => ErrorBody::new(status, "rate limit exceeded"),
            Self::NotFound(msg)
            | Self::AlreadyExists(msg)
            | Self::MalformedInput(msg)
            | Self::InvalidIdentifier(msg) => ErrorBody::new(status, msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_client_error() {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
        }
        (status, Json(self.into_body())).into_response()
    }
}
