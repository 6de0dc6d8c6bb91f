//! # Application State
//!
//! Shared state handed to every handler through axum's `State` extractor.
//! The storage handles are trait objects so any [`UserStorage`] /
//! [`PassportStorage`] implementation can back the routes.

use std::sync::Arc;

use passport_core::{PassportService, PassportStorage, UserService, UserStorage};

/// Handler context. Cloning is cheap: every field is shared.
#[derive(Debug, Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStorage>,
    pub passports: Arc<dyn PassportStorage>,
    /// Validated version string reported by the healthcheck.
    pub version: Arc<str>,
}

impl AppState {
    /// State over the given storage backends.
    pub fn new(
        users: Arc<dyn UserStorage>,
        passports: Arc<dyn PassportStorage>,
        version: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            users,
            passports,
            version: version.into(),
        }
    }

    /// In-memory storage pre-loaded with the seed users and passports.
    pub fn seeded(version: impl Into<Arc<str>>) -> Self {
        Self::new(
            Arc::new(UserService::seeded()),
            Arc::new(PassportService::seeded()),
            version,
        )
    }
}
