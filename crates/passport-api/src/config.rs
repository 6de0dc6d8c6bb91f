//! # Configuration
//!
//! Command-line flags, each of which can also be supplied through the
//! environment. Flags win over environment variables.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::middleware::cors::CorsPolicy;
use crate::middleware::rate_limit::RateLimitConfig;
use crate::middleware::MiddlewareConfig;
use crate::server::ConnectionTimeouts;

/// Environment name that binds to `localhost` and logs human-readable text.
pub const LOCAL_ENV: &str = "LOCAL";

/// Passport API server.
#[derive(Parser, Debug, Clone)]
#[command(name = "passport-api", version, about, long_about = None)]
pub struct Config {
    /// Deployment environment, e.g. LOCAL, DEV, PROD. Upper-cased.
    #[arg(long = "env", env = "ENV", default_value = LOCAL_ENV, value_parser = upper_case)]
    pub env: String,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 3001)]
    pub port: u16,

    /// Path of the file holding the service version.
    #[arg(long, env = "VERSION", default_value = "VERSION")]
    pub version_file: PathBuf,

    /// Value for Access-Control-Allow-Origin. CORS is off when unset.
    #[arg(long, env = "CORS_ORIGINS")]
    pub cors_origins: Option<String>,

    /// Requests per second allowed per client. Zero or less disables limiting.
    #[arg(long, env = "RATE_LIMIT", default_value_t = 0.0, allow_negative_numbers = true)]
    pub rate_limit: f64,

    /// Requests a client may make in a burst. Raised to 1 when limiting is on.
    #[arg(long, env = "RATE_BURST", default_value_t = 0, allow_negative_numbers = true)]
    pub rate_burst: i64,

    /// Seconds in-flight requests get to finish after a shutdown signal.
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 30)]
    pub shutdown_timeout: u64,

    /// Seconds allowed to receive a request's headers.
    #[arg(long, env = "READ_TIMEOUT", default_value_t = 10)]
    pub read_timeout: u64,

    /// Seconds allowed to produce a response before the connection is dropped.
    #[arg(long, env = "WRITE_TIMEOUT", default_value_t = 10)]
    pub write_timeout: u64,

    /// Seconds a keep-alive connection may sit idle.
    #[arg(long, env = "IDLE_TIMEOUT", default_value_t = 120)]
    pub idle_timeout: u64,
}

/// Configuration values that parse but cannot be used.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("CORS origin {0:?} is not a valid header value")]
    InvalidCorsOrigin(String),
}

fn upper_case(raw: &str) -> Result<String, String> {
    Ok(raw.trim().to_uppercase())
}

impl Config {
    pub fn is_local(&self) -> bool {
        self.env == LOCAL_ENV
    }

    /// `localhost:<port>` locally, every interface elsewhere.
    pub fn bind_addr(&self) -> String {
        if self.is_local() {
            format!("localhost:{}", self.port)
        } else {
            format!("0.0.0.0:{}", self.port)
        }
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }

    pub fn connection_timeouts(&self) -> ConnectionTimeouts {
        ConnectionTimeouts {
            header_read: Duration::from_secs(self.read_timeout),
            response: Duration::from_secs(self.write_timeout),
            idle: Duration::from_secs(self.idle_timeout),
        }
    }

    /// Optional middleware stages derived from the CORS and rate-limit settings.
    pub fn middleware_config(&self) -> Result<MiddlewareConfig, ConfigError> {
        let cors = match self.cors_origins.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(origin) => Some(
                CorsPolicy::new(origin)
                    .map_err(|_| ConfigError::InvalidCorsOrigin(origin.to_string()))?,
            ),
        };
        Ok(MiddlewareConfig {
            cors,
            rate_limit: RateLimitConfig::from_settings(self.rate_limit, self.rate_burst),
        })
    }
}
