//! # passport-api — HTTP Service for Users and Passports
//!
//! Axum routes over the storage traits from `passport-core`, wrapped in a
//! fixed middleware chain and served with graceful shutdown.
//!
//! ## API Surface
//!
//! | Prefix          | Module                  | Domain        |
//! |-----------------|-------------------------|---------------|
//! | `/healthcheck`  | [`routes::health`]      | Probes        |
//! | `/ready`        | [`routes::health`]      | Probes        |
//! | `/users/*`      | [`routes::users`]       | Users         |
//! | `/passports/*`  | [`routes::passports`]   | Passports     |
//! | `/openapi.json` | [`openapi`]             | API document  |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! RequestId → RequestLog → RateLimit? → Cors? → SecurityHeaders → ClacksOverhead → Handler
//! ```

pub mod config;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod state;
pub mod telemetry;
pub mod version;

use axum::Router;

use crate::middleware::MiddlewareConfig;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState, middleware: &MiddlewareConfig) -> Router {
    let routes = routes::router().merge(openapi::router()).with_state(state);
    middleware::apply(routes, middleware)
}
