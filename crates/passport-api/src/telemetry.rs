//! # Logging Setup
//!
//! Installs the global `tracing` subscriber. Local runs get a human-readable
//! formatter at `debug`; every other environment gets JSON lines at `info`.
//! `RUST_LOG` replaces the default filter when set.

use tracing_subscriber::EnvFilter;

use crate::config::LOCAL_ENV;

/// Default filter directive for `env`.
pub fn default_directive(env: &str) -> &'static str {
    if env == LOCAL_ENV {
        "debug"
    } else {
        "info"
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(env: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(env)));

    let installed = if env == LOCAL_ENV {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("installing tracing subscriber: {e}"))
}
