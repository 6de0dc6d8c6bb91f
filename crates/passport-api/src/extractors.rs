//! # Custom Extractors & Validation
//!
//! Provides the [`Validate`] trait for request DTOs and helpers to decode
//! and validate JSON bodies and path identifiers in handlers.
//!
//! Bodies are taken as raw bytes and decoded here, so a request is judged
//! on its payload alone. A missing or non-JSON `Content-Type` is accepted.

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Request types that check required fields beyond what serde enforces.
pub trait Validate {
    /// Every violation found. An empty list means the value is acceptable.
    fn validate(&self) -> Vec<String>;
}

/// Decode a JSON body, mapping any failure to [`AppError::MalformedInput`].
///
/// Handlers take `Result<Bytes, BytesRejection>` so an unreadable body
/// reaches this function instead of axum's default plain-text response:
/// ```ignore
/// async fn handler(body: Result<Bytes, BytesRejection>) -> Result<..., AppError> {
///     let req: T = extract_json(body, "malformed thing object")?;
/// }
/// ```
pub fn extract_json<T: DeserializeOwned>(
    body: Result<Bytes, BytesRejection>,
    malformed: &str,
) -> Result<T, AppError> {
    let bytes = body.map_err(|rejection| {
        tracing::debug!(reason = %rejection.body_text(), "request body unreadable");
        AppError::MalformedInput(malformed.to_string())
    })?;
    serde_json::from_slice(&bytes).map_err(|err| {
        tracing::debug!(reason = %err, "json body rejected");
        AppError::MalformedInput(malformed.to_string())
    })
}

/// Decode a JSON body and run [`Validate`] on it.
///
/// All violations are reported together in one [`AppError::Validation`].
pub fn extract_validated_json<T: DeserializeOwned + Validate>(
    body: Result<Bytes, BytesRejection>,
    malformed: &str,
) -> Result<T, AppError> {
    let value: T = extract_json(body, malformed)?;
    let errors = value.validate();
    if errors.is_empty() {
        Ok(value)
    } else {
        Err(AppError::Validation(errors))
    }
}

/// Parse a user id path segment.
pub fn parse_user_id(raw: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::InvalidIdentifier("invalid user id".to_string()))
}

/// Whether a date field counts as unset: absent, or `0001-01-01T00:00:00Z`.
pub fn is_unset_date(date: Option<&DateTime<Utc>>) -> bool {
    match date {
        None => true,
        Some(d) => d.timestamp() == ZERO_DATE_SECS && d.timestamp_subsec_nanos() == 0,
    }
}

/// Unix seconds of `0001-01-01T00:00:00Z`.
const ZERO_DATE_SECS: i64 = -62_135_596_800;

/// Push `"<field> is required"` onto `errors` when `missing` holds.
pub(crate) fn require(errors: &mut Vec<String>, missing: bool, field: &str) {
    if missing {
        errors.push(format!("{field} is required"));
    }
}
