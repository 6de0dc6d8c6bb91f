//! # Passports
//!
//! - `GET /users/:id/passports`: passports owned by a user, ascending by id
//! - `POST /users/:id/passports`: issue a passport to a user
//! - `GET /passports/:id`: single passport
//! - `PUT /passports/:id`: full replacement
//! - `DELETE /passports/:id`: remove
//!
//! The owning user is not checked for existence.

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use passport_core::{Passport, StoreError, UserId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::extractors::{extract_validated_json, is_unset_date, parse_user_id, require, Validate};
use crate::state::AppState;

const MALFORMED_PASSPORT: &str = "malformed passport object";

// ── Request/Response DTOs ───────────────────────────────────────────

/// Passport fields accepted on create. The owner comes from the path.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CreatePassportRequest {
    /// Passport number. Must be unique.
    pub id: String,
    pub date_of_issue: Option<DateTime<Utc>>,
    pub date_of_expiry: Option<DateTime<Utc>>,
    pub authority: String,
}

impl Validate for CreatePassportRequest {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        require(&mut errors, self.id.trim().is_empty(), "id");
        errors.extend(term_violations(
            self.date_of_issue.as_ref(),
            self.date_of_expiry.as_ref(),
            &self.authority,
        ));
        errors
    }
}

/// Passport fields accepted on update. The id comes from the path; an
/// omitted `userId` keeps the current owner.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdatePassportRequest {
    pub date_of_issue: Option<DateTime<Utc>>,
    pub date_of_expiry: Option<DateTime<Utc>>,
    pub authority: String,
    pub user_id: Option<UserId>,
}

impl Validate for UpdatePassportRequest {
    fn validate(&self) -> Vec<String> {
        term_violations(
            self.date_of_issue.as_ref(),
            self.date_of_expiry.as_ref(),
            &self.authority,
        )
    }
}

fn term_violations(
    issue: Option<&DateTime<Utc>>,
    expiry: Option<&DateTime<Utc>>,
    authority: &str,
) -> Vec<String> {
    let mut errors = Vec::new();
    require(&mut errors, is_unset_date(issue), "dateOfIssue");
    require(&mut errors, is_unset_date(expiry), "dateOfExpiry");
    require(&mut errors, authority.trim().is_empty(), "authority");
    errors
}

/// Passports owned by one user.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PassportList {
    pub passports: Vec<Passport>,
    pub count: usize,
}

// ── Router ──────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/users/:id/passports",
            get(list_user_passports).post(create_passport),
        )
        .route(
            "/passports/:id",
            get(get_passport).put(update_passport).delete(delete_passport),
        )
}

fn internal(err: StoreError) -> AppError {
    AppError::Internal(err.to_string())
}

// ── Handlers ────────────────────────────────────────────────────────

/// GET /users/:id/passports — List a user's passports.
#[utoipa::path(
    get,
    path = "/users/{id}/passports",
    params(("id" = i64, Path, description = "Owning user id")),
    responses(
        (status = 200, description = "Passports owned by the user", body = PassportList),
        (status = 400, description = "Invalid user id", body = crate::error::ErrorBody),
    ),
    tag = "passports"
)]
async fn list_user_passports(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PassportList>, AppError> {
    let user_id = parse_user_id(&id)?;
    let passports = state.passports.list_passports_by_user(user_id);
    Ok(Json(PassportList {
        count: passports.len(),
        passports,
    }))
}

/// GET /passports/:id — Fetch one passport.
#[utoipa::path(
    get,
    path = "/passports/{id}",
    params(("id" = String, Path, description = "Passport number")),
    responses(
        (status = 200, description = "Passport found", body = Passport),
        (status = 404, description = "Passport not found", body = crate::error::ErrorBody),
    ),
    tag = "passports"
)]
async fn get_passport(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Passport>, AppError> {
    let passport = state.passports.get_passport(&id).map_err(|err| {
        if err.is_not_found() {
            AppError::NotFound("can't find passport".to_string())
        } else {
            internal(err)
        }
    })?;
    Ok(Json(passport))
}

/// POST /users/:id/passports — Issue a passport.
#[utoipa::path(
    post,
    path = "/users/{id}/passports",
    params(("id" = i64, Path, description = "Owning user id")),
    request_body = CreatePassportRequest,
    responses(
        (status = 201, description = "Passport created", body = Passport),
        (status = 400, description = "Invalid user id or malformed body", body = crate::error::ErrorBody),
        (status = 409, description = "Passport id already exists", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "passports"
)]
async fn create_passport(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<Passport>), AppError> {
    let user_id = parse_user_id(&id)?;
    let req: CreatePassportRequest = extract_validated_json(body, MALFORMED_PASSPORT)?;
    let passport = Passport {
        id: req.id.trim().to_string(),
        date_of_issue: req.date_of_issue.unwrap_or_default(),
        date_of_expiry: req.date_of_expiry.unwrap_or_default(),
        authority: req.authority,
        user_id,
    };
    let passport = state
        .passports
        .add_passport(passport)
        .map_err(|err| match err {
            StoreError::AlreadyExists { .. } => {
                AppError::AlreadyExists("passport already exists".to_string())
            }
            other => internal(other),
        })?;
    tracing::info!(passport_id = %passport.id, user_id, "passport created");
    Ok((StatusCode::CREATED, Json(passport)))
}

/// PUT /passports/:id — Replace a passport.
#[utoipa::path(
    put,
    path = "/passports/{id}",
    params(("id" = String, Path, description = "Passport number")),
    request_body = UpdatePassportRequest,
    responses(
        (status = 200, description = "Passport updated", body = Passport),
        (status = 400, description = "Malformed body", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
        (status = 500, description = "Update failed", body = crate::error::ErrorBody),
    ),
    tag = "passports"
)]
async fn update_passport(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Passport>, AppError> {
    let req: UpdatePassportRequest = extract_validated_json(body, MALFORMED_PASSPORT)?;
    // Owner lookup and write happen under one lock.
    let passport = state
        .passports
        .amend_passport(
            &id,
            Box::new(move |passport: &mut Passport| {
                passport.date_of_issue = req.date_of_issue.unwrap_or_default();
                passport.date_of_expiry = req.date_of_expiry.unwrap_or_default();
                passport.authority = req.authority;
                if let Some(user_id) = req.user_id {
                    passport.user_id = user_id;
                }
            }),
        )
        .map_err(internal)?;
    Ok(Json(passport))
}

/// DELETE /passports/:id — Remove a passport.
#[utoipa::path(
    delete,
    path = "/passports/{id}",
    params(("id" = String, Path, description = "Passport number")),
    responses(
        (status = 204, description = "Passport deleted"),
        (status = 500, description = "Delete failed", body = crate::error::ErrorBody),
    ),
    tag = "passports"
)]
async fn delete_passport(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.passports.delete_passport(&id).map_err(internal)?;
    tracing::info!(passport_id = %id, "passport deleted");
    Ok(StatusCode::NO_CONTENT)
}
