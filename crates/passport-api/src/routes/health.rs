//! # Health Probes
//!
//! - `GET /healthcheck`: application name and loaded version
//! - `GET /ready`: readiness check

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::AppState;

pub const APP_NAME: &str = "passport-api";

/// Healthcheck payload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    pub app_name: String,
    pub version: String,
}

/// Readiness payload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Readiness {
    pub status: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/healthcheck", get(healthcheck))
        .route("/ready", get(ready))
}

/// GET /healthcheck
#[utoipa::path(
    get,
    path = "/healthcheck",
    responses((status = 200, description = "Service identity", body = HealthCheck)),
    tag = "health"
)]
async fn healthcheck(State(state): State<AppState>) -> Json<HealthCheck> {
    Json(HealthCheck {
        app_name: APP_NAME.to_string(),
        version: state.version.to_string(),
    })
}

/// GET /ready
#[utoipa::path(
    get,
    path = "/ready",
    responses((status = 200, description = "Ready to serve", body = Readiness)),
    tag = "health"
)]
async fn ready() -> Json<Readiness> {
    Json(Readiness {
        status: "ok".to_string(),
    })
}
