use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dotenv::dotenv;
use tracing::{error, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use hypertension_care_client::cli::{self, Cli};
use hypertension_care_client::{App, ClientConfig};
use hypertension_care_data::database::{describe_pool, initialize_store_pool_with};
use hypertension_care_data::repository::{open_session_store, KeyValueStore, SessionRepository, SqliteStore};

/// Entry point for the HypertensionCare command-line client
///
/// Loads `.env`, sets up tracing, opens the session store (falling back to memory),
/// then runs the requested command behind the route guard.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    if dotenv().is_err() {
        eprintln!("Warning: .env file not found or couldn't be read. Using environment variables.");
    }

    // Logs go to stderr so command output stays clean on stdout
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_span_events(FmtSpan::CLOSE)
                .with_target(false)
                .with_ansi(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .with(env_filter)
        .init();

    let cli = Cli::parse();
    info!("🚀 Starting HypertensionCare client");

    let config = ClientConfig::from_env().context("Invalid client configuration")?;
    info!("Using backend at {}", config.api_base_url);

    let store: Arc<dyn KeyValueStore> = match initialize_store_pool_with(&config.store) {
        Ok(pool) => {
            info!("Session kept in the {}", describe_pool(&pool));
            Arc::new(SqliteStore::new(pool))
        }
        Err(e) => {
            error!("Failed to initialize the session store pool: {}", e);
            open_session_store(&config.store)
        }
    };

    let mut app = App::new(&config, SessionRepository::new(store))?;
    cli::run(cli.command, &mut app).await
}
