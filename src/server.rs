use axum::{
    Router,
    routing::{any, get},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::oneshot;
use tracing::info;

use crate::config::Args;
use crate::error::{Result, ServerError};
use crate::handlers::{greeting_handler, metrics_handler};
use crate::middleware::rate_limit_middleware;
use crate::rate_limit::{RateLimiter, spawn_reset_task};
use crate::state::AppState;

// Every path gets the greeting, behind the rate limiter.
// /metrics is added after the layer so scraping never uses up a quota.
pub fn build_router(state: AppState, metrics_enabled: bool) -> Router {
    let router = Router::new()
        .route("/", any(greeting_handler))
        .fallback(greeting_handler)
        .layer(axum::middleware::from_fn_with_state(state, rate_limit_middleware));

    if metrics_enabled {
        router.route("/metrics", get(metrics_handler))
    } else {
        router
    }
}

pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

/// Serve `router` until `shutdown` resolves, then give in-flight requests
/// up to `grace` to finish.
///
/// Returns [`ServerError::ShutdownTimeout`] when requests are still running
/// at the deadline; the server future is dropped at that point.
pub async fn serve<F>(
    listener: TcpListener,
    router: Router,
    shutdown: F,
    grace: Duration,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (draining_tx, draining_rx) = oneshot::channel::<()>();

    let signal = async move {
        shutdown.await;
        info!(?grace, "Shutting down server gracefully...");
        let _ = draining_tx.send(());
    };

    let server = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(signal);

    let deadline = async move {
        match draining_rx.await {
            Ok(()) => tokio::time::sleep(grace).await,
            // server finished before any shutdown was requested
            Err(_) => std::future::pending().await,
        }
    };

    tokio::select! {
        result = server.into_future() => result.map_err(ServerError::from),
        _ = deadline => Err(ServerError::ShutdownTimeout(grace)),
    }
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

pub async fn run(args: Args) -> Result<()> {
    let config = args.rate_limit_config();
    let rate_limiter = Arc::new(RateLimiter::new(config));
    let reset_task = spawn_reset_task(Arc::clone(&rate_limiter));

    let router = build_router(AppState::new(rate_limiter), args.metrics);

    let addr = args.listen_addr();
    let listener = bind(addr).await?;

    info!(%addr, "Starting api-simulation server");
    info!(
        quota = config.quota,
        window = ?config.window,
        "Rate limit: {} requests per {:?}",
        config.quota,
        config.window
    );
    if args.metrics {
        info!("Metrics available at /metrics");
    }

    let result = serve(listener, router, shutdown_signal(), args.shutdown_grace()).await;
    reset_task.stop().await;
    result?;

    info!("Server exited properly");
    Ok(())
}
