//! # Middleware Chain
//!
//! Cross-cutting request/response stages wrapped around the route table in
//! a fixed order, outermost first:
//!
//! ```text
//! RequestId → RequestLog → RateLimit? → Cors? → SecurityHeaders → ClacksOverhead → routes
//! ```
//!
//! `RateLimit` is present only when a positive rate is configured and `Cors`
//! only when an allow-origin is configured. Any stage may short-circuit;
//! stages outside it still see the response.

pub mod cors;
pub mod headers;
pub mod rate_limit;
pub mod request_id;
pub mod request_log;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::Router;

use self::cors::CorsPolicy;
use self::rate_limit::{RateLimitConfig, RateLimiter};

/// One stage of the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    RequestId,
    RequestLog,
    RateLimit,
    Cors,
    SecurityHeaders,
    ClacksOverhead,
}

/// Every stage, outermost first.
pub const MIDDLEWARE_ORDER: [Stage; 6] = [
    Stage::RequestId,
    Stage::RequestLog,
    Stage::RateLimit,
    Stage::Cors,
    Stage::SecurityHeaders,
    Stage::ClacksOverhead,
];

/// Settings for the optional stages. The default enables neither.
#[derive(Debug, Clone, Default)]
pub struct MiddlewareConfig {
    pub cors: Option<CorsPolicy>,
    pub rate_limit: Option<RateLimitConfig>,
}

impl MiddlewareConfig {
    /// The stages this configuration installs, outermost first.
    pub fn stages(&self) -> Vec<Stage> {
        MIDDLEWARE_ORDER
            .into_iter()
            .filter(|stage| match stage {
                Stage::RateLimit => self.rate_limit.is_some(),
                Stage::Cors => self.cors.is_some(),
                _ => true,
            })
            .collect()
    }
}

/// Wrap `router` in the configured stages.
///
/// Layers are added innermost first, since each `layer` call wraps
/// everything added before it.
pub fn apply(router: Router, config: &MiddlewareConfig) -> Router {
    let stages = config.stages();
    tracing::debug!(?stages, "installing middleware");

    stages
        .into_iter()
        .rev()
        .fold(router, |router, stage| match stage {
            Stage::ClacksOverhead => router.layer(from_fn(headers::clacks_overhead)),
            Stage::SecurityHeaders => router.layer(from_fn(headers::security_headers)),
            Stage::Cors => match &config.cors {
                Some(policy) => router.layer(from_fn_with_state(policy.clone(), cors::cors)),
                None => router,
            },
            Stage::RateLimit => match config.rate_limit {
                Some(limit) => router.layer(from_fn_with_state(
                    RateLimiter::new(limit),
                    rate_limit::rate_limit,
                )),
                None => router,
            },
            Stage::RequestLog => router.layer(request_log::layer()),
            Stage::RequestId => router.layer(from_fn(request_id::request_id)),
        })
}
