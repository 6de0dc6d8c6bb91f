//! # Store Errors
//!
//! Local sentinel conditions raised by [`EntityStore`](crate::EntityStore).
//! Nothing here is retried; callers translate each variant into a response.

use thiserror::Error;

/// Failure of a single store operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No record is stored under the key.
    #[error("{kind} {key} not found")]
    NotFound {
        /// Record kind, e.g. `"user"`.
        kind: &'static str,
        /// Display form of the missing key.
        key: String,
    },

    /// A caller-supplied key is already taken.
    #[error("{kind} {key} already exists")]
    AlreadyExists {
        /// Record kind, e.g. `"passport"`.
        kind: &'static str,
        /// Display form of the duplicate key.
        key: String,
    },
}

impl StoreError {
    /// Whether this is a [`StoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
