//! Pokevault - Offline-first proxy for a trading-card browser
//!
//! Serves the vault API and forwards everything else to the upstream app
//! through the interception cache.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::sync::RwLock;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use pokevault::auth::PasswordHasher;
use pokevault::cache::{CacheManager, GenerationTable, HttpFetcher};
use pokevault::storage::FileStore;
use pokevault::{create_router, AppState, Config, Vault};

/// Main entry point for the Pokevault proxy.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the vault and resume the previous session
/// 4. Install and activate the cache generation
/// 5. Start HTTP server on configured port
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pokevault=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Pokevault proxy");

    let config = Config::from_env();
    info!(
        "Configuration loaded: upstream={}, generation={}, data_dir={}, port={}",
        config.upstream_url,
        config.cache_version,
        config.data_dir.display(),
        config.server_port
    );

    let upstream = Url::parse(&config.upstream_url)
        .with_context(|| format!("invalid UPSTREAM_URL '{}'", config.upstream_url))?;
    let shell_url = upstream
        .join(&config.shell_path)
        .with_context(|| format!("invalid SHELL_PATH '{}'", config.shell_path))?;

    let store =
        FileStore::open(config.data_dir.clone()).context("failed to open data directory")?;
    let vault = Vault::open(Arc::new(store), PasswordHasher::default())
        .context("failed to open vault")?;
    match vault.current_user() {
        Some(username) => info!("Resumed session for '{}'", username),
        None => info!("No active session"),
    }

    let fetcher = HttpFetcher::new().context("failed to build HTTP client")?;
    let table = Arc::new(RwLock::new(GenerationTable::new()));
    let manager = CacheManager::new(
        config.cache_version.clone(),
        shell_url.to_string(),
        table,
        Arc::new(fetcher),
    );

    // An unreachable upstream must not keep the proxy from serving.
    if let Err(e) = manager.install().await {
        warn!("Install incomplete, continuing without a pinned shell: {}", e);
    }
    manager.activate().await;

    let state = AppState::new(manager, vault, upstream, config.max_body_bytes);
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
