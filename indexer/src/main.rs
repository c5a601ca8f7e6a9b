use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use tezos_indexer::application::{DelegationSyncer, Poller, SyncSettings};
use tezos_indexer::config::AppConfig;
use tezos_indexer::infrastructure::persistence::{build_store, DelegationStore};
use tezos_indexer::infrastructure::telemetry::{
    build_recorder, InstrumentedSource, InstrumentedStore,
};
use tezos_indexer::infrastructure::tzkt::build_source;
use tezos_indexer::infrastructure::web::{create_router, serve, with_http_layers, HealthState};
use tezos_indexer::utils::{logging, shutdown};

/// Polls TzKT for delegations and writes them to the store
#[derive(Debug, Parser)]
#[command(name = "tezos-indexer", version, about)]
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

    info!(version = env!("CARGO_PKG_VERSION"), "Starting tezos-indexer");

    let recorder = build_recorder(&config.metrics).context("failed to build metrics recorder")?;
    let store: Arc<dyn DelegationStore> = Arc::new(InstrumentedStore::new(
        build_store(&config.database)
            .await
            .context("failed to connect to store")?,
        Some(recorder.clone()),
    ));
    let source = Arc::new(InstrumentedSource::new(
        build_source(&config.tzktapi).context("invalid upstream configuration")?,
        Some(recorder.clone()),
    ));

    let token = CancellationToken::new();
    let health = HealthState::new("job", store.clone());
    shutdown::spawn_shutdown_trigger(shutdown::wait_for_signal(), health.clone(), token.clone());

    let router = with_http_layers(create_router(health.clone(), recorder.clone()));
    let addr = config.server.server_addr();
    let mut server = tokio::spawn({
        let token = token.clone();
        async move { serve(&addr, router, token).await }
    });

    let syncer = DelegationSyncer::new(source, store.clone(), SyncSettings::from(&config.sync));
    let poller = Poller::new(syncer, config.tzktapi.polling_interval).with_recorder(recorder);
    let poller = tokio::spawn(poller.run(token.clone()));
    health.set_ready(true);

    let mut server_error = None;
    tokio::select! {
        _ = token.cancelled() => {}
        result = &mut server => {
            // The server only returns early when it cannot bind or accept
            health.begin_shutdown();
            token.cancel();
            server_error = Some(match result {
                Ok(Ok(())) => anyhow::anyhow!("web server exited unexpectedly"),
                Ok(Err(e)) => anyhow::Error::new(e).context("web server failed"),
                Err(e) => anyhow::Error::new(e).context("web server task panicked"),
            });
        }
    }

    info!(timeout = ?config.server.shutdown_timeout, "Shutting down");
    let drained = shutdown::drain(
        async {
            if let Err(e) = poller.await {
                error!(error = %e, "Poller task failed");
            }
            if server_error.is_none() {
                let _ = (&mut server).await;
            }
        },
        config.server.shutdown_timeout,
    )
    .await;

    if let Err(e) = store.close().await {
        error!(error = %e, "Failed to close store");
    }

    if let Some(e) = server_error {
        return Err(e);
    }
    if !drained {
        error!("Forced exit after shutdown timeout");
    }
    info!("Shutdown complete");
    Ok(())
}
