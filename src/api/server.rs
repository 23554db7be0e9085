use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, routing::get, routing::post};
use tokio::net::TcpListener;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::decompression::RequestDecompressionLayer;
use tracing::{info, warn};

use super::{
    services::{control_message, health, metrics, proxy},
    state::AppState,
};
use crate::client::HttpConfig;
use crate::config::Config;
use crate::observability::Metrics;
use crate::offline::{HttpUpstream, OfflineService, open_store};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Routes for the proxy: `/_offline/*` control endpoints, everything else cached
pub fn router(state: AppState) -> Router {
    let max_concurrent = state.config.server.max_concurrent_requests;

    Router::new()
        .route("/_offline/health", get(health))
        .route("/_offline/metrics", get(metrics))
        .route("/_offline/messages", post(control_message))
        .fallback(proxy)
        .with_state(state)
        .layer(GlobalConcurrencyLimitLayer::new(max_concurrent))
        // Automatically decompress gzip request bodies
        .layer(RequestDecompressionLayer::new())
}

pub async fn run(config: Config, address: Option<SocketAddr>) -> Result<(), AnyError> {
    let address = address.unwrap_or(config.server.bind_addr);

    info!(
        backend = ?config.offline.store.backend,
        path = %config.offline.store.path.display(),
        "Opening offline cache store"
    );
    let store = open_store(&config.offline.store)
        .map_err(|e| format!("Failed to open cache store: {e}"))?;

    let upstream = HttpUpstream::new(&config.offline.upstream, HttpConfig::from(&config.client))
        .map_err(|e| format!("Failed to build upstream client: {e}"))?;

    let service = Arc::new(OfflineService::new(
        config.offline.clone(),
        store,
        Arc::new(upstream),
        Arc::new(Metrics::new()),
    ));

    let report = service.install().await;
    if !report.failed.is_empty() {
        warn!(failed = ?report.failed, "Some precache entries could not be stored");
    }
    let sweeper = service.spawn_sweeper();

    let upstream_url = config.offline.upstream.clone();
    let app = router(AppState::new(config, Arc::clone(&service)));

    let listener = TcpListener::bind(address).await?;
    info!(%address, upstream = %upstream_url, "lottobox offline proxy listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    service.settle().await;
    info!("Pending revalidations drained");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
