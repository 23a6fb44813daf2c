use std::sync::Arc;

use burrow_core::HashGenerator;
use burrow_gateway::cli::{load_dotenv, CLI};
use burrow_gateway::logging::init_tracing;
use burrow_gateway::{App, AppState};
use burrow_shortener::ShortenerService;
use burrow_storage::open_store;
use clap::Parser;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_file = load_dotenv();
    let config = CLI::parse();
    init_tracing(config.log_format);

    match &env_file {
        Some(path) => debug!(path = %path.display(), "loaded env file"),
        None => debug!("no env file loaded"),
    }

    info!(
        listen_addr = %config.listen_addr,
        base_url = %config.base_url,
        storage_backend = %config.storage_backend(),
        "starting burrow"
    );

    let store = open_store(config.storage_config()?).await?;
    info!(mappings = store.len().await?, "mapping store ready");

    let generator = HashGenerator::new(config.id_length);
    let service = ShortenerService::new(Arc::clone(&store), generator);
    let router = App::router(AppState::new(Arc::new(service), config.base_url.as_str()));

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!(listen_addr = %listener.local_addr()?, "listening");

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Err(err) = store.close().await {
        error!(error = %err, "failed to close mapping store");
    }
    info!("shut down");

    Ok(served?)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
