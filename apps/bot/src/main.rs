use std::sync::Arc;

use anyhow::{Context as _, Result};
use bot::{
    command::Interpreter,
    config::Config,
    line::{LineClient, SignatureVerifier},
    server::{self, AppState},
};
use stock::{
    InstrumentDirectory, MemoryWatchListStore, QuoteClient, QuoteSource, RedisWatchListStore,
    WatchListStore,
};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let directory = Arc::new(
        InstrumentDirectory::load(&config.domestic_directory, &config.index_directory)
            .context("load instrument directories failed")?,
    );
    let quotes: Arc<dyn QuoteSource> =
        Arc::new(QuoteClient::from_env().context("init quote client failed")?);

    let store: Arc<dyn WatchListStore> = match &config.redis_url {
        Some(url) => Arc::new(
            RedisWatchListStore::new(
                url,
                config.redis_key_prefix.clone(),
                config.redis_connect_timeout,
            )
            .await
            .context("init watch list store failed")?,
        ),
        None => {
            warn!("REDIS_URL not set, watch lists are kept in memory only");
            Arc::new(MemoryWatchListStore::new())
        }
    };
    store
        .ensure_schema()
        .await
        .context("prepare watch list store failed")?;

    let messenger = LineClient::new(
        config.line_api_base.clone(),
        &config.line_channel_token,
        config.request_timeout,
    )
    .context("init LINE client failed")?;

    let state = AppState {
        interpreter: Arc::new(
            Interpreter::new(directory, quotes, store).with_list_budget(config.list_budget),
        ),
        messenger: Arc::new(messenger),
        verifier: Arc::new(SignatureVerifier::new(config.line_channel_secret.clone())),
    };

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("bind {} failed", config.bind_addr))?;
    info!(addr = %config.bind_addr, version = %config.version, "listening for webhooks");

    axum::serve(listener, server::router(state, config.request_timeout))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::{
            select,
            signal::unix::{SignalKind, signal},
        };
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
        select! {
            _ = sigterm.recv() => {},
            _ = sigint.recv()  => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
