use anyhow::{Context, Result};
use clap::Parser;
use cosmex_chain_client::LcdClient;
use cosmex_explorer::{
    build_router, spawn_refresher, Cli, ExplorerConfig, ListingLimits, QueryFacade, StatusCache,
};
use cosmex_storage::SledStorage;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ExplorerConfig::load(&cli)?;
    init_logging(&config);

    info!("Starting cosmex explorer v{}", env!("CARGO_PKG_VERSION"));
    info!("Chain: {}", config.chain_id);
    info!("LCD endpoint: {}", config.lcd_url);
    info!("Database: {}", config.db_path.display());

    let storage = Arc::new(
        SledStorage::new(&config.db_path)
            .with_context(|| format!("failed to open database at {}", config.db_path.display()))?,
    );
    let chain = Arc::new(
        LcdClient::new(config.lcd_url.clone(), config.retry_policy())
            .context("failed to build LCD client")?,
    );
    let chain_config = Arc::new(config.chain_config());

    let status = Arc::new(StatusCache::new(chain_config.chain_id.clone()));
    if let Err(err) = status.refresh_from(storage.as_ref()) {
        warn!(error = %err, "initial chain status refresh failed");
    }
    let refresher = spawn_refresher(
        status.clone(),
        storage.clone(),
        config.status_refresh_interval(),
    );

    let facade = QueryFacade::new(
        storage.clone(),
        chain,
        chain_config,
        status,
        ListingLimits {
            blocks: config.block_limits(),
            missed_blocks: config.missed_block_limits(),
        },
    );
    let app = build_router(facade);

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind explorer listener on {addr}"))?;
    info!("Explorer API listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("explorer server terminated unexpectedly")?;

    refresher.abort();
    storage.flush()?;
    info!("Explorer shutdown complete");
    Ok(())
}

fn init_logging(config: &ExplorerConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
