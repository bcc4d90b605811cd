//! Suspect Monitor - Steam presence tracking for flagged players
//!
//! HTTP server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use suspect_monitor::api::{create_router, AppState};
use suspect_monitor::cache::CacheStore;
use suspect_monitor::fetcher::SteamClient;
use suspect_monitor::{spawn_cleanup_task, store, Config, RefreshOrchestrator};

/// Main entry point for the suspect monitor server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the configured store and build the Steam client
/// 4. Start background cache sweep task
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "suspect_monitor=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Suspect Monitor");

    let config = Config::from_env();
    info!(
        "Configuration loaded: port={}, store={}, cache_ttl={}s, cleanup_interval={}s, refresh_deadline={}s, api_key={}",
        config.server_port,
        config.store_backend,
        config.cache_ttl,
        config.cleanup_interval,
        config.refresh_deadline,
        if config.steam_api_key.is_some() { "set" } else { "unset" }
    );
    if config.steam_api_key.is_none() {
        warn!("STEAM_API_KEY is not set; refreshes need an x-steam-api-key header");
    }

    let store = store::connect(&config)
        .await
        .context("failed to open suspect store")?;
    info!("{} store initialized", config.store_backend);

    let source = SteamClient::new(config.steam_api_base_url.clone())
        .context("failed to build Steam API client")?;

    let cache = CacheStore::shared();
    let cleanup_handle = spawn_cleanup_task(cache.clone(), config.cleanup_interval);
    info!("Background cleanup task started");

    let orchestrator = RefreshOrchestrator::new(Arc::new(source), store, cache, config.cache_ttl);
    let state = AppState::new(
        orchestrator,
        config.steam_api_key.clone(),
        config.refresh_deadline(),
    );
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the cleanup task and allows graceful shutdown.
async fn shutdown_signal(cleanup_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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

    cleanup_handle.abort();
    warn!("Cleanup task aborted");
}
