//! # Integration Tests for passport-api
//!
//! Drives the fully layered router: health checks, user and passport CRUD,
//! pagination, validation, the error envelope, and the middleware chain
//! (correlation IDs, static headers, CORS preflight, rate limiting, order).

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::connect_info::MockConnectInfo;
use axum::extract::ConnectInfo;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use passport_api::middleware::cors::CorsPolicy;
use passport_api::middleware::rate_limit::RateLimitConfig;
use passport_api::middleware::MiddlewareConfig;
use passport_api::state::AppState;

/// Helper: seeded app with no optional middleware.
fn test_app() -> Router {
    passport_api::app(AppState::seeded("1.0.0"), &MiddlewareConfig::default())
}

/// Helper: seeded app with the given middleware settings and a fixed peer address.
fn test_app_with(config: MiddlewareConfig) -> Router {
    passport_api::app(AppState::seeded("1.0.0"), &config)
        .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn send_json(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Helper: send one request through a clone of `app`.
async fn call(app: &Router, request: Request<Body>) -> axum::http::Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

/// Helper: read response body as JSON.
async fn body_json(response: axum::http::Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn apple_jack() -> Value {
    json!({
        "firstName": "Apple",
        "lastName": "Jack",
        "dateOfBirth": "1972-03-07T00:00:00Z",
        "locationOfBirth": "Cambridge"
    })
}

fn new_passport(id: &str) -> Value {
    json!({
        "id": id,
        "dateOfIssue": "2021-03-01T00:00:00Z",
        "dateOfExpiry": "2031-03-01T00:00:00Z",
        "authority": "HMPO"
    })
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_healthcheck_reports_name_and_version() {
    let response = call(&test_app(), get("/healthcheck")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body, json!({"appName": "passport-api", "version": "1.0.0"}));
}

#[tokio::test]
async fn test_ready_check() {
    let response = call(&test_app(), get("/ready")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "ok"}));
}

// -- Users --------------------------------------------------------------------

#[tokio::test]
async fn test_list_users_default_page() {
    let response = call(&test_app(), get("/users")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["total"], 2);
    assert_eq!(body["offset"], 0);
    assert_eq!(body["limit"], 25);
    assert_eq!(body["users"][0]["id"], 0);
    assert_eq!(body["users"][0]["firstName"], "John");
    assert_eq!(body["users"][1]["id"], 1);
    assert_eq!(body["users"][1]["locationOfBirth"], "Milton Keynes");
}

#[tokio::test]
async fn test_pagination_limits_page() {
    let body = body_json(call(&test_app(), get("/users?offset=0&limit=1")).await).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["total"], 2);
    assert_eq!(body["users"].as_array().unwrap().len(), 1);
    assert_eq!(body["users"][0]["id"], 0);
}

#[tokio::test]
async fn test_pagination_offset_past_end() {
    let body = body_json(call(&test_app(), get("/users?offset=5")).await).await;
    assert_eq!(body["count"], 0);
    assert_eq!(body["total"], 2);
    assert!(body["users"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_pagination_clamps_out_of_range_values() {
    let body = body_json(call(&test_app(), get("/users?offset=-3&limit=500")).await).await;
    assert_eq!(body["offset"], 0);
    assert_eq!(body["limit"], 25);
    assert_eq!(body["count"], 2);

    let body = body_json(call(&test_app(), get("/users?limit=abc")).await).await;
    assert_eq!(body["limit"], 25);
}

#[tokio::test]
async fn test_get_user() {
    let response = call(&test_app(), get("/users/1")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["firstName"], "Jane");
    assert_eq!(body["dateOfBirth"], "1992-01-01T00:00:00Z");
}

#[tokio::test]
async fn test_get_unknown_user_is_404() {
    let response = call(&test_app(), get("/users/99")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body, json!({"status": "404", "message": "can't find user"}));
}

#[tokio::test]
async fn test_get_user_with_invalid_id_is_400() {
    let response = call(&test_app(), get("/users/abc")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["status"], "400");
    assert_eq!(body["message"], "invalid user id");
}

#[tokio::test]
async fn test_create_user_assigns_next_id() {
    let app = test_app();
    let response = call(&app, send_json(Method::POST, "/users", apple_jack())).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["id"], 2);
    assert_eq!(body["firstName"], "Apple");
    assert_eq!(body["dateOfBirth"], "1972-03-07T00:00:00Z");

    let fetched = body_json(call(&app, get("/users/2")).await).await;
    assert_eq!(fetched["lastName"], "Jack");
}

#[tokio::test]
async fn test_create_user_without_content_type() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/users")
        .body(Body::from(apple_jack().to_string()))
        .unwrap();
    let response = call(&test_app(), request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["id"], 2);
}

#[tokio::test]
async fn test_create_user_ignores_declared_content_type() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/users")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(apple_jack().to_string()))
        .unwrap();
    let response = call(&test_app(), request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_create_user_ignores_body_id() {
    let mut user = apple_jack();
    user["id"] = json!(0);
    let body = body_json(call(&test_app(), send_json(Method::POST, "/users", user)).await).await;
    assert_eq!(body["id"], 2);
}

#[tokio::test]
async fn test_create_user_reports_all_validation_errors() {
    let empty = json!({
        "firstName": "",
        "lastName": "",
        "dateOfBirth": "0001-01-01T00:00:00Z",
        "locationOfBirth": ""
    });
    let app = test_app();
    let response = call(&app, send_json(Method::POST, "/users", empty)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["status"], "422");
    assert_eq!(body["message"], "validation failed");
    assert_eq!(body["errors"].as_array().unwrap().len(), 4);

    let list = body_json(call(&app, get("/users")).await).await;
    assert_eq!(list["total"], 2);
}

#[tokio::test]
async fn test_create_user_with_malformed_body_is_400() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/users")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = call(&test_app(), request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "malformed user object");
}

#[tokio::test]
async fn test_update_user_uses_path_id() {
    let app = test_app();
    let mut user = apple_jack();
    user["id"] = json!(40);
    let response = call(&app, send_json(Method::PUT, "/users/1", user)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], 1);
    assert_eq!(body["firstName"], "Apple");

    let fetched = body_json(call(&app, get("/users/1")).await).await;
    assert_eq!(fetched["locationOfBirth"], "Cambridge");
}

#[tokio::test]
async fn test_update_unknown_user_is_500_without_detail() {
    let response = call(&test_app(), send_json(Method::PUT, "/users/42", apple_jack())).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(
        body,
        json!({"status": "500", "message": "something went wrong"})
    );
}

#[tokio::test]
async fn test_update_user_validation_error() {
    let response = call(
        &test_app(),
        send_json(Method::PUT, "/users/0", json!({"firstName": "Only"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["errors"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_delete_user_twice() {
    let app = test_app();
    let response = call(&app, delete("/users/1")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = call(&app, delete("/users/1")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = call(&app, get("/users/1")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleted_user_id_is_not_reused() {
    let app = test_app();
    call(&app, delete("/users/1")).await;
    let body = body_json(call(&app, send_json(Method::POST, "/users", apple_jack())).await).await;
    assert_eq!(body["id"], 2);
}

#[tokio::test]
async fn test_delete_user_with_invalid_id_is_400() {
    let response = call(&test_app(), delete("/users/one")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// -- Passports ----------------------------------------------------------------

#[tokio::test]
async fn test_list_user_passports() {
    let response = call(&test_app(), get("/users/0/passports")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["passports"][0]["id"], "012345678");
    assert_eq!(body["passports"][0]["userId"], 0);
}

#[tokio::test]
async fn test_list_passports_for_unknown_user_is_empty() {
    let response = call(&test_app(), get("/users/99/passports")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"passports": [], "count": 0})
    );
}

#[tokio::test]
async fn test_list_passports_with_invalid_user_id_is_400() {
    let response = call(&test_app(), get("/users/zero/passports")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "invalid user id");
}

#[tokio::test]
async fn test_get_passport() {
    let response = call(&test_app(), get("/passports/987654321")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["authority"], "HMPO");
    assert_eq!(body["userId"], 1);
    assert_eq!(body["dateOfIssue"], "2019-06-01T00:00:00Z");
}

#[tokio::test]
async fn test_get_unknown_passport_is_404() {
    let response = call(&test_app(), get("/passports/000000000")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], "can't find passport");
}

#[tokio::test]
async fn test_create_passport_and_list_sorted() {
    let app = test_app();
    let response = call(
        &app,
        send_json(Method::POST, "/users/0/passports", new_passport("500000000")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["id"], "500000000");
    assert_eq!(body["userId"], 0);

    call(
        &app,
        send_json(Method::POST, "/users/0/passports", new_passport("000000001")),
    )
    .await;

    let list = body_json(call(&app, get("/users/0/passports")).await).await;
    let ids: Vec<&str> = list["passports"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["000000001", "012345678", "500000000"]);
    assert_eq!(list["count"], 3);
}

#[tokio::test]
async fn test_passport_writes_without_content_type() {
    let app = test_app();
    let create = Request::builder()
        .method(Method::POST)
        .uri("/users/1/passports")
        .body(Body::from(new_passport("300000000").to_string()))
        .unwrap();
    assert_eq!(call(&app, create).await.status(), StatusCode::CREATED);

    let mut passport = new_passport("300000000");
    passport["authority"] = json!("UKPA");
    let update = Request::builder()
        .method(Method::PUT)
        .uri("/passports/300000000")
        .body(Body::from(passport.to_string()))
        .unwrap();
    let response = call(&app, update).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["authority"], "UKPA");
    assert_eq!(body["userId"], 1);
}

#[tokio::test]
async fn test_create_duplicate_passport_is_409() {
    let app = test_app();
    let response = call(
        &app,
        send_json(Method::POST, "/users/1/passports", new_passport("012345678")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        body_json(response).await,
        json!({"status": "409", "message": "passport already exists"})
    );

    let original = body_json(call(&app, get("/passports/012345678")).await).await;
    assert_eq!(original["userId"], 0);
}

#[tokio::test]
async fn test_create_passport_validation_error() {
    let response = call(
        &test_app(),
        send_json(Method::POST, "/users/0/passports", json!({})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(
        body["errors"],
        json!([
            "id is required",
            "dateOfIssue is required",
            "dateOfExpiry is required",
            "authority is required"
        ])
    );
}

#[tokio::test]
async fn test_create_passport_with_invalid_user_id_is_400() {
    let response = call(
        &test_app(),
        send_json(Method::POST, "/users/x/passports", new_passport("123")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_passport_for_unknown_user_is_allowed() {
    let response = call(
        &test_app(),
        send_json(Method::POST, "/users/77/passports", new_passport("770000000")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_update_passport_keeps_owner_when_omitted() {
    let app = test_app();
    let response = call(
        &app,
        send_json(
            Method::PUT,
            "/passports/987654321",
            json!({
                "dateOfIssue": "2024-06-01T00:00:00Z",
                "dateOfExpiry": "2034-06-01T00:00:00Z",
                "authority": "UKPA"
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["userId"], 1);
    assert_eq!(body["authority"], "UKPA");
    assert_eq!(body["dateOfExpiry"], "2034-06-01T00:00:00Z");
}

#[tokio::test]
async fn test_update_passport_can_change_owner() {
    let app = test_app();
    let mut passport = new_passport("ignored");
    passport["userId"] = json!(0);
    call(&app, send_json(Method::PUT, "/passports/987654321", passport)).await;
    let list = body_json(call(&app, get("/users/0/passports")).await).await;
    assert_eq!(list["count"], 2);
}

#[tokio::test]
async fn test_update_unknown_passport_is_500() {
    let response = call(
        &test_app(),
        send_json(Method::PUT, "/passports/111111111", new_passport("111111111")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["message"], "something went wrong");
}

#[tokio::test]
async fn test_delete_passport_twice() {
    let app = test_app();
    assert_eq!(
        call(&app, delete("/passports/012345678")).await.status(),
        StatusCode::NO_CONTENT
    );
    assert_eq!(
        call(&app, delete("/passports/012345678")).await.status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

// -- Fallback & OpenAPI -------------------------------------------------------

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let response = call(&test_app(), get("/nope")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["status"], "404");
}

#[tokio::test]
async fn test_openapi_document_served() {
    let response = call(&test_app(), get("/openapi.json")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["paths"]["/users/{id}/passports"].is_object());
}

// -- Middleware Chain ---------------------------------------------------------

#[tokio::test]
async fn test_every_response_carries_static_headers() {
    let app = test_app();
    for uri in ["/healthcheck", "/users/99", "/nope"] {
        let response = call(&app, get(uri)).await;
        let headers = response.headers();
        assert_eq!(headers["x-clacks-overhead"], "GNU Terry Pratchett", "{uri}");
        assert_eq!(headers["x-content-type-options"], "nosniff", "{uri}");
        assert_eq!(headers["x-frame-options"], "DENY", "{uri}");
        assert!(headers.contains_key("x-request-id"), "{uri}");
        assert!(!headers.contains_key("access-control-allow-origin"), "{uri}");
    }
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let request = Request::builder()
        .uri("/ready")
        .header("X-Request-ID", "trace-me-42")
        .body(Body::empty())
        .unwrap();
    let response = call(&test_app(), request).await;
    assert_eq!(response.headers()["x-request-id"], "trace-me-42");
}

#[tokio::test]
async fn test_cors_headers_when_configured() {
    let app = test_app_with(MiddlewareConfig {
        cors: Some(CorsPolicy::new("https://app.example.com").unwrap()),
        rate_limit: None,
    });
    let response = call(&app, get("/users")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers["access-control-allow-origin"],
        "https://app.example.com"
    );
    assert_eq!(
        headers["access-control-allow-methods"],
        "GET, POST, PUT, DELETE, OPTIONS"
    );
    assert_eq!(
        headers["access-control-allow-headers"],
        "Content-Type, Authorization, X-Request-ID"
    );
}

#[tokio::test]
async fn test_cors_preflight_never_reaches_handler() {
    let app = test_app_with(MiddlewareConfig {
        cors: Some(CorsPolicy::new("*").unwrap()),
        rate_limit: None,
    });
    let response = call(&app, send_json(Method::OPTIONS, "/users", apple_jack())).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert!(headers.contains_key("x-request-id"));
    // Inner stages were skipped.
    assert!(!headers.contains_key("x-clacks-overhead"));

    let list = body_json(call(&app, get("/users")).await).await;
    assert_eq!(list["total"], 2);
}

#[tokio::test]
async fn test_rate_limit_rejects_second_immediate_request() {
    let app = test_app_with(MiddlewareConfig {
        cors: None,
        rate_limit: RateLimitConfig::from_settings(1.0, 1),
    });
    let first = call(&app, get("/ready")).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = call(&app, get("/ready")).await;
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    // Outer stages still ran; inner ones did not.
    assert!(second.headers().contains_key("x-request-id"));
    assert!(!second.headers().contains_key("x-clacks-overhead"));
    assert_eq!(
        body_json(second).await,
        json!({"status": "429", "message": "rate limit exceeded"})
    );
}

#[tokio::test]
async fn test_rate_limit_is_per_client() {
    let app = test_app_with(MiddlewareConfig {
        cors: None,
        rate_limit: RateLimitConfig::from_settings(1.0, 1),
    });
    let from = |client: &str| {
        Request::builder()
            .uri("/ready")
            .header("X-Forwarded-For", client)
            .body(Body::empty())
            .unwrap()
    };
    assert_eq!(call(&app, from("198.51.100.1")).await.status(), StatusCode::OK);
    assert_eq!(
        call(&app, from("198.51.100.1")).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(call(&app, from("198.51.100.2")).await.status(), StatusCode::OK);
    // The peer address is a third, untouched client.
    assert_eq!(call(&app, get("/ready")).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit_wraps_cors_preflight() {
    let app = test_app_with(MiddlewareConfig {
        cors: Some(CorsPolicy::new("*").unwrap()),
        rate_limit: RateLimitConfig::from_settings(1.0, 1),
    });
    let preflight = || {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/users")
            .body(Body::empty())
            .unwrap()
    };
    assert_eq!(call(&app, preflight()).await.status(), StatusCode::NO_CONTENT);
    let limited = call(&app, preflight()).await;
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(!limited.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_rate_limit_separates_peer_addresses() {
    let app = test_app_with(MiddlewareConfig {
        cors: None,
        rate_limit: RateLimitConfig::from_settings(1.0, 1),
    });
    let from = |ip: [u8; 4]| {
        Request::builder()
            .uri("/ready")
            .extension(ConnectInfo(SocketAddr::from((ip, 50000))))
            .body(Body::empty())
            .unwrap()
    };
    assert_eq!(call(&app, from([192, 0, 2, 10])).await.status(), StatusCode::OK);
    assert_eq!(
        call(&app, from([192, 0, 2, 10])).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(call(&app, from([192, 0, 2, 11])).await.status(), StatusCode::OK);
}

// -- Request Logging ----------------------------------------------------------

/// Log sink shared between the subscriber and the test.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_rate_limited_requests_are_logged_with_status() {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer({
            let logs = logs.clone();
            move || logs.clone()
        })
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let app = test_app_with(MiddlewareConfig {
        cors: None,
        rate_limit: RateLimitConfig::from_settings(1.0, 1),
    });
    let request = || {
        Request::builder()
            .uri("/ready")
            .header("X-Request-ID", "logged-429")
            .body(Body::empty())
            .unwrap()
    };
    assert_eq!(call(&app, request()).await.status(), StatusCode::OK);
    assert_eq!(
        call(&app, request()).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    let text = logs.text();
    let completions: Vec<&str> = text
        .lines()
        .filter(|line| line.contains("request_id=logged-429") && line.contains("latency_ms="))
        .collect();
    assert_eq!(completions.len(), 2, "{text}");
    assert!(completions[0].contains("status=200"), "{text}");
    assert!(completions[1].contains("status=429"), "{text}");
    assert!(text.contains("client=127.0.0.1"), "{text}");
}
