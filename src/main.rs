//! Estate Cache server
//!
//! Hosts the namespace registry behind the admin HTTP API.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use estate_cache::api::create_router;
use estate_cache::cache::{CacheRegistry, FileKvStore};
use estate_cache::warmup::{FileContentProvider, WarmupCoordinator};
use estate_cache::{spawn_sweep_task, AppState, Config};

/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the durable store, if configured
/// 4. Register every namespace
/// 5. Warm up from the content directory, if configured
/// 6. Start the background expiry sweep
/// 7. Serve the admin API until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "estate_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Estate Cache Server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: port={}, sweep_interval={}s, durable_dir={:?}, namespaces={}",
        config.server_port,
        config.sweep_interval,
        config.durable_dir,
        config.namespaces.len()
    );

    let mut registry = CacheRegistry::new();
    if let Some(dir) = &config.durable_dir {
        match FileKvStore::open(dir).await {
            Ok(store) => {
                registry = registry.with_durable(Arc::new(store), config.durable_timeout());
                info!("Durable store opened at {}", dir.display());
            }
            Err(e) => warn!(error = %e, "Durable store unavailable, running memory-only"),
        }
    }

    for namespace in config.namespaces.clone() {
        registry
            .initialize_namespace(namespace)
            .await
            .context("registering namespace")?;
    }
    let registry = Arc::new(registry);

    if let Some(dir) = &config.warmup_content_dir {
        let provider = Arc::new(FileContentProvider::new(dir.clone()));
        WarmupCoordinator::new(registry.clone(), config.warmup.clone())
            .with_templates(provider.clone())
            .with_legal_content(provider.clone())
            .with_validation_rules(provider)
            .warm_up()
            .await;
    }

    let sweep_handle = (config.sweep_interval > 0)
        .then(|| spawn_sweep_task(registry.clone(), config.sweep_interval));
    if sweep_handle.is_some() {
        info!("Background expiry sweep started");
    }

    let app = create_router(AppState::new(registry));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sweep_handle))
        .await
        .context("serving admin API")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then stops the sweep.
async fn shutdown_signal(sweep_handle: Option<tokio::task::JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
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

    if let Some(handle) = sweep_handle {
        handle.abort();
        warn!("Expiry sweep aborted");
    }
}
