//! # Static Response Headers
//!
//! The two innermost stages. Neither short-circuits.

use axum::extract::Request;
use axum::http::header::{X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS};
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;

pub static CLACKS_OVERHEAD_HEADER: HeaderName = HeaderName::from_static("x-clacks-overhead");
pub const CLACKS_OVERHEAD: &str = "GNU Terry Pratchett";

/// Content-type sniffing and framing protection.
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    response
}

/// GNU Terry Pratchett.
pub async fn clacks_overhead(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    response.headers_mut().insert(
        CLACKS_OVERHEAD_HEADER.clone(),
        HeaderValue::from_static(CLACKS_OVERHEAD),
    );
    response
}
