//! HTTP server lifecycle: bind, optionally preload the dataset, serve until shutdown.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::api::router::api_router;
use crate::api::types::ApiContext;
use crate::config::AppConfig;
use crate::dataset::DatasetStore;

/// Serves the API on an already-bound listener until `shutdown` is cancelled.
///
/// # Errors
///
/// Returns an error when the accept loop fails.
pub async fn serve(
    listener: TcpListener,
    ctx: ApiContext,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let app = api_router(ctx);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            tracing::info!("Shutting down…");
        })
        .await
}

/// Runs the drug API over HTTP on `host:port`.
///
/// With `preload`, the dataset is read before the listener is bound so the
/// first request already sees the complete dataset. A failed preload is
/// logged and the server starts in degraded mode. Without `preload`, the
/// first dataset route triggers the load.
///
/// # Errors
///
/// Returns an error when the host is invalid or the TCP bind fails.
pub async fn run_http(host: &str, port: u16, config: AppConfig, preload: bool) -> anyhow::Result<()> {
    let ip: IpAddr = host
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid host address: {e}"))?;
    let bind = SocketAddr::new(ip, port);

    let store = Arc::new(DatasetStore::from_config(&config));
    if preload && let Err(err) = store.load().await {
        tracing::warn!(error = %err, "Serving without drug data; dataset routes will report unavailable");
    }

    let listener = TcpListener::bind(bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind HTTP server: {e}"))?;
    let addr = listener.local_addr()?;

    tracing::info!("Drug API listening on http://{addr}");
    tracing::info!("  Health: GET  http://{addr}/api/health");
    tracing::info!("  Search: GET  http://{addr}/api/drugs/search?q=<term>");
    tracing::info!("  Stats:  GET  http://{addr}/api/drugs/stats");

    let shutdown = CancellationToken::new();
    let cancel = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let ctx = ApiContext::new(store, config.stats_sample_size);
    serve(listener, ctx, shutdown).await?;
    Ok(())
}
