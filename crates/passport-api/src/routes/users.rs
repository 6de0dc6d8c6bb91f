//! # Users
//!
//! - `GET /users`: paginated list, ascending by id
//! - `GET /users/:id`: single user
//! - `POST /users`: create, id assigned by the store
//! - `PUT /users/:id`: full replacement
//! - `DELETE /users/:id`: remove

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use passport_core::{StoreError, User, UserId};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::AppError;
use crate::extractors::{extract_validated_json, is_unset_date, parse_user_id, require, Validate};
use crate::state::AppState;

const MALFORMED_USER: &str = "malformed user object";

pub const DEFAULT_LIMIT: usize = 25;
pub const MAX_LIMIT: usize = 100;

// ── Request/Response DTOs ───────────────────────────────────────────

/// User fields accepted on create and update. Any `id` in the body is ignored.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UserRequest {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub location_of_birth: String,
}

impl Validate for UserRequest {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        require(&mut errors, self.first_name.trim().is_empty(), "firstName");
        require(&mut errors, self.last_name.trim().is_empty(), "lastName");
        require(
            &mut errors,
            is_unset_date(self.date_of_birth.as_ref()),
            "dateOfBirth",
        );
        require(
            &mut errors,
            self.location_of_birth.trim().is_empty(),
            "locationOfBirth",
        );
        errors
    }
}

impl UserRequest {
    fn into_user(self, id: UserId) -> User {
        User {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            date_of_birth: self.date_of_birth.unwrap_or_default(),
            location_of_birth: self.location_of_birth,
        }
    }
}

/// Raw pagination parameters. Unparsable values fall back to defaults.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    /// Records to skip. Negative values count as 0.
    pub offset: Option<String>,
    /// Page size, 1 to 100. Anything else means 25.
    pub limit: Option<String>,
}

impl Pagination {
    /// Effective `(offset, limit)`.
    pub fn resolve(&self) -> (usize, usize) {
        let parse = |raw: &Option<String>| raw.as_deref().and_then(|v| v.trim().parse::<i64>().ok());

        let offset = parse(&self.offset)
            .and_then(|v| usize::try_from(v).ok())
            .unwrap_or(0);
        let limit = parse(&self.limit)
            .and_then(|v| usize::try_from(v).ok())
            .filter(|v| (1..=MAX_LIMIT).contains(v))
            .unwrap_or(DEFAULT_LIMIT);
        (offset, limit)
    }
}

/// One page of users.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserList {
    pub users: Vec<User>,
    /// Users on this page.
    pub count: usize,
    /// Users in the store.
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

// ── Router ──────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

fn lookup_error(err: StoreError) -> AppError {
    if err.is_not_found() {
        AppError::NotFound("can't find user".to_string())
    } else {
        AppError::Internal(err.to_string())
    }
}

// ── Handlers ────────────────────────────────────────────────────────

/// GET /users — List users, one page at a time.
#[utoipa::path(
    get,
    path = "/users",
    params(Pagination),
    responses((status = 200, description = "Page of users", body = UserList)),
    tag = "users"
)]
async fn list_users(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Json<UserList> {
    let (offset, limit) = page.resolve();
    let all = state.users.list_users();
    let total = all.len();
    let users: Vec<User> = all.into_iter().skip(offset).take(limit).collect();
    Json(UserList {
        count: users.len(),
        users,
        total,
        offset,
        limit,
    })
}

/// GET /users/:id — Fetch one user.
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User found", body = User),
        (status = 400, description = "Invalid user id", body = crate::error::ErrorBody),
        (status = 404, description = "User not found", body = crate::error::ErrorBody),
    ),
    tag = "users"
)]
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, AppError> {
    let id = parse_user_id(&id)?;
    let user = state.users.get_user(id).map_err(lookup_error)?;
    Ok(Json(user))
}

/// POST /users — Create a user.
#[utoipa::path(
    post,
    path = "/users",
    request_body = UserRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Malformed body", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "users"
)]
async fn create_user(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let req: UserRequest = extract_validated_json(body, MALFORMED_USER)?;
    // The store assigns the real id.
    let user = state
        .users
        .add_user(req.into_user(-1))
        .map_err(|e| AppError::Internal(e.to_string()))?;
    tracing::info!(user_id = user.id, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// PUT /users/:id — Replace a user.
#[utoipa::path(
    put,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    request_body = UserRequest,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Invalid id or malformed body", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
        (status = 500, description = "Update failed", body = crate::error::ErrorBody),
    ),
    tag = "users"
)]
async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<User>, AppError> {
    let id = parse_user_id(&id)?;
    let req: UserRequest = extract_validated_json(body, MALFORMED_USER)?;
    let user = state
        .users
        .update_user(req.into_user(id))
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(Json(user))
}

/// DELETE /users/:id — Remove a user.
#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Invalid user id", body = crate::error::ErrorBody),
        (status = 500, description = "Delete failed", body = crate::error::ErrorBody),
    ),
    tag = "users"
)]
async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_user_id(&id)?;
    state
        .users
        .delete_user(id)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    tracing::info!(user_id = id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
