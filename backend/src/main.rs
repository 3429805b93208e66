//! Persistence bootstrap: selects the configured store, connects it and holds
//! the connection open until interrupted.

use std::process::ExitCode;

use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use playlister::config::DatabaseSettings;
use playlister::outbound::selector::{connect_from_settings, shutdown};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = match DatabaseSettings::load_from_env() {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "invalid database settings");
            return ExitCode::FAILURE;
        }
    };

    let driver = match connect_from_settings(&settings).await {
        Ok(driver) => driver,
        Err(e) => {
            error!(vendor = %settings.vendor(), error = %e, "database connection failed");
            return ExitCode::FAILURE;
        }
    };
    info!(vendor = %driver.vendor(), "database ready");

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
    }

    match shutdown().await {
        Ok(()) => {
            info!("database connection closed");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "database disconnect failed");
            ExitCode::FAILURE
        }
    }
}
