// Tezos delegations query API entry point

mod cache;
mod error;
mod handlers;
mod models;
mod routes;
mod services;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;

use tezos_indexer::config::AppConfig;
use tezos_indexer::infrastructure::persistence::{build_store, DelegationStore};
use tezos_indexer::infrastructure::telemetry::{build_recorder, InstrumentedStore};
use tezos_indexer::infrastructure::web::{serve, HealthState};
use tezos_indexer::utils::{logging, shutdown};

use handlers::AppState;
use services::DelegationService;

/// Serves stored Tezos delegations over HTTP
#[derive(Debug, Parser)]
#[command(name = "tezos-delegations-api", version, about)]
struct Args {
    /// Path to the YAML config file
    #[arg(long, env = "CONFIG_PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = AppConfig::load(args.config.as_deref()).context("failed to load configuration")?;
    logging::init(&config.logging).context("failed to initialize logging")?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Configuration loaded");

    let recorder = build_recorder(&config.metrics).context("failed to build metrics recorder")?;
    let store: Arc<dyn DelegationStore> = Arc::new(InstrumentedStore::new(
        build_store(&config.database)
            .await
            .context("failed to connect to store")?,
        Some(recorder.clone()),
    ));
    tracing::info!(store = store.implementation(), "Connected to store");

    let token = CancellationToken::new();
    let health = HealthState::new("api", store.clone());
    shutdown::spawn_shutdown_trigger(shutdown::wait_for_signal(), health.clone(), token.clone());

    let state = AppState {
        delegations: DelegationService::new(store.clone()),
        default_limit: config.pagination.limit,
    };
    let app = routes::create_router(state, health.clone(), recorder);

    let addr = config.server.server_addr();
    let mut server = tokio::spawn({
        let token = token.clone();
        async move { serve(&addr, app, token).await }
    });
    health.set_ready(true);

    let result = tokio::select! {
        _ = token.cancelled() => {
            shutdown::drain(&mut server, config.server.shutdown_timeout).await;
            Ok(())
        }
        result = &mut server => {
            health.begin_shutdown();
            token.cancel();
            match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(anyhow::Error::new(e).context("web server failed")),
                Err(e) => Err(anyhow::Error::new(e).context("web server task panicked")),
            }
        }
    };

    if let Err(e) = store.close().await {
        tracing::error!(error = %e, "Failed to close store");
    }
    tracing::info!("Shutdown complete");
    result
}
