//! # Per-Client Rate Limiting
//!
//! Token bucket per client, created lazily on first sight with the globally
//! configured rate and burst. Buckets start full and refill continuously.
//!
//! The client is identified by the first `X-Forwarded-For` entry, falling
//! back to the peer address from `ConnectInfo`, then to `"unknown"`.
//!
//! A bucket that has refilled to capacity is indistinguishable from a new
//! one, so such buckets are dropped by a sweep that runs at most once per
//! [`SWEEP_INTERVAL`]. The client map stays bounded by recent traffic.
//!
//! In-memory and per-process only.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use parking_lot::Mutex;

use crate::error::AppError;

/// Minimum time between sweeps of refilled buckets.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Limiter settings. Only constructed when limiting is enabled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitConfig {
    /// Tokens added per second.
    pub rate: f64,
    /// Bucket capacity. Always at least 1.
    pub burst: u32,
}

impl RateLimitConfig {
    /// `None` when `rate` does not enable limiting (zero, negative, NaN).
    pub fn from_settings(rate: f64, burst: i64) -> Option<Self> {
        if !(rate.is_finite() && rate > 0.0) {
            return None;
        }
        let burst = u32::try_from(burst.max(1)).unwrap_or(u32::MAX);
        Some(Self { rate, burst })
    }

    fn capacity(&self) -> f64 {
        f64::from(self.burst)
    }
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    refilled_at: Instant,
}

impl Bucket {
    fn full(config: &RateLimitConfig, now: Instant) -> Self {
        Self {
            tokens: config.capacity(),
            refilled_at: now,
        }
    }

    fn tokens_at(&self, config: &RateLimitConfig, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.refilled_at).as_secs_f64();
        (self.tokens + elapsed * config.rate).min(config.capacity())
    }

    fn try_take(&mut self, config: &RateLimitConfig, now: Instant) -> bool {
        self.tokens = self.tokens_at(config, now);
        if now > self.refilled_at {
            self.refilled_at = now;
        }
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

#[derive(Debug)]
struct Clients {
    buckets: HashMap<String, Bucket>,
    swept_at: Instant,
}

impl Clients {
    fn sweep(&mut self, config: &RateLimitConfig, now: Instant) {
        if now.saturating_duration_since(self.swept_at) < SWEEP_INTERVAL {
            return;
        }
        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| bucket.tokens_at(config, now) < config.capacity());
        self.swept_at = now;
        let evicted = before - self.buckets.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.buckets.len(), "swept idle rate-limit buckets");
        }
    }
}

/// Shared limiter state. Clones share buckets.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    clients: Arc<Mutex<Clients>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            clients: Arc::new(Mutex::new(Clients {
                buckets: HashMap::new(),
                swept_at: Instant::now(),
            })),
        }
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Whether `client` may make a request now. Consumes a token if so.
    pub fn allow(&self, client: &str) -> bool {
        self.allow_at(client, Instant::now())
    }

    /// [`allow`](Self::allow) against an explicit clock reading.
    pub fn allow_at(&self, client: &str, now: Instant) -> bool {
        let mut clients = self.clients.lock();
        clients.sweep(&self.config, now);
        clients
            .buckets
            .entry(client.to_string())
            .or_insert_with(|| Bucket::full(&self.config, now))
            .try_take(&self.config, now)
    }

    /// Number of clients currently holding a bucket.
    pub fn tracked_clients(&self) -> usize {
        self.clients.lock().buckets.len()
    }
}

/// Identify the client a request is charged to.
pub fn client_id(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    match (forwarded, peer) {
        (Some(first), _) => first.to_string(),
        (None, Some(addr)) => addr.ip().to_string(),
        (None, None) => "unknown".to_string(),
    }
}

/// Middleware rejecting requests from clients whose bucket is empty.
pub async fn rate_limit(
    State(limiter): State<RateLimiter>,
    peer: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_id(request.headers(), peer.map(|ConnectInfo(addr)| addr));
    if !limiter.allow(&client) {
        tracing::warn!(client = %client, "rate limit exceeded");
        return AppError::RateLimited.into_response();
    }
    next.run(request).await
}
