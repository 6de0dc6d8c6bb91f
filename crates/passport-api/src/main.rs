//! # passport-api — Binary Entry Point
//!
//! Parses configuration, installs logging, loads the version file, seeds the
//! in-memory stores, and serves until SIGINT or SIGTERM.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use passport_api::config::Config;
use passport_api::server::Server;
use passport_api::state::AppState;
use passport_api::version::parse_version_file;

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    if let Err(err) = passport_api::telemetry::init(&config.env) {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "server error");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    let version = parse_version_file(&config.version_file).with_context(|| {
        format!("can't load version file {}", config.version_file.display())
    })?;
    tracing::info!(env = %config.env, version = %version, "loaded version file");

    let middleware = config.middleware_config()?;
    let state = AppState::seeded(version);
    let app = passport_api::app(state, &middleware);

    let bind_addr = config.bind_addr();
    tracing::info!(
        env = %config.env,
        addr = %bind_addr,
        cors = middleware.cors.is_some(),
        rate_limited = middleware.rate_limit.is_some(),
        "starting server"
    );
    Server::new(app, bind_addr, config.shutdown_grace())
        .with_timeouts(config.connection_timeouts())
        .run()
        .await
}
