//! Apply the embedded schema to the configured PostgreSQL database.
//!
//! # Examples
//! ```sh
//! CONDUIT_DB_URL=postgres://conduit@localhost/conduit cargo run --bin conduit-migrate
//! ```
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::process::ExitCode;

use conduit_backend::config::DatabaseSettings;
use conduit_backend::outbound::persistence::run_migrations;
use ortho_config::OrthoConfig;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> ExitCode {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = match DatabaseSettings::load() {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "failed to load database settings");
            return ExitCode::FAILURE;
        }
    };

    let url = match settings.database_url() {
        Ok(url) => url,
        Err(e) => {
            error!(error = %e, "database settings incomplete");
            return ExitCode::FAILURE;
        }
    };

    match run_migrations(url) {
        Ok(applied) if applied.is_empty() => {
            info!("schema already up to date");
            ExitCode::SUCCESS
        }
        Ok(applied) => {
            info!(count = applied.len(), "schema updated");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "schema migration failed");
            ExitCode::FAILURE
        }
    }
}
