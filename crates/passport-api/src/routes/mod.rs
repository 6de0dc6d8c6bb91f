//! # Route Table
//!
//! | Method | Path                    | Handler                                |
//! |--------|-------------------------|----------------------------------------|
//! | GET    | `/healthcheck`          | [`health`]                             |
//! | GET    | `/ready`                | [`health`]                             |
//! | GET    | `/users`                | [`users`] (paginated)                  |
//! | GET    | `/users/:id`            | [`users`]                              |
//! | POST   | `/users`                | [`users`]                              |
//! | PUT    | `/users/:id`            | [`users`]                              |
//! | DELETE | `/users/:id`            | [`users`]                              |
//! | GET    | `/users/:id/passports`  | [`passports`]                          |
//! | POST   | `/users/:id/passports`  | [`passports`]                          |
//! | GET    | `/passports/:id`        | [`passports`]                          |
//! | PUT    | `/passports/:id`        | [`passports`]                          |
//! | DELETE | `/passports/:id`        | [`passports`]                          |
//!
//! Unmatched paths get a JSON 404 in the standard error envelope.

pub mod health;
pub mod passports;
pub mod users;

use axum::Router;

use crate::error::AppError;
use crate::state::AppState;

/// All resource routes, without middleware or state.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(users::router())
        .merge(passports::router())
        .fallback(not_found)
}

async fn not_found() -> AppError {
    AppError::NotFound("resource not found".to_string())
}
