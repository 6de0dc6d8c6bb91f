//! # OpenAPI Specification Assembly
//!
//! Collects the utoipa-documented routes into one OpenAPI document,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Passport API",
        description = "In-memory users and passports with request correlation, CORS, and per-client rate limiting."
    ),
    paths(
        crate::routes::health::healthcheck,
        crate::routes::health::ready,
        crate::routes::users::list_users,
        crate::routes::users::get_user,
        crate::routes::users::create_user,
        crate::routes::users::update_user,
        crate::routes::users::delete_user,
        crate::routes::passports::list_user_passports,
        crate::routes::passports::get_passport,
        crate::routes::passports::create_passport,
        crate::routes::passports::update_passport,
        crate::routes::passports::delete_passport,
    ),
    components(schemas(
        passport_core::User,
        passport_core::Passport,
        crate::error::ErrorBody,
        crate::routes::health::HealthCheck,
        crate::routes::health::Readiness,
        crate::routes::users::UserRequest,
        crate::routes::users::UserList,
        crate::routes::passports::CreatePassportRequest,
        crate::routes::passports::UpdatePassportRequest,
        crate::routes::passports::PassportList,
    )),
    tags(
        (name = "health", description = "Liveness and version"),
        (name = "users", description = "User records"),
        (name = "passports", description = "Passports held by users"),
    )
)]
pub struct ApiDoc;

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
