//! API module
//!
//! JSON HTTP API over the same [`ExpenseTracker`] the console uses.

pub mod error;
pub mod routes;

use std::future::Future;
use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::error::{ExpenseError, ExpenseResult};
use crate::tracker::ExpenseTracker;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use routes::create_router;

/// Router state shared by all handlers
pub type AppState = Arc<ExpenseTracker>;

/// Build the application router
pub fn build_router(tracker: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", create_router())
        .layer(TraceLayer::new_for_http())
        .with_state(tracker)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Bind the listening socket
pub async fn bind(addr: &str) -> ExpenseResult<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| ExpenseError::Io(format!("Failed to bind {}: {}", addr, e)))
}

/// Serve the API on `listener` until `shutdown` completes
pub async fn serve<F>(listener: TcpListener, tracker: AppState, shutdown: F) -> ExpenseResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, build_router(tracker))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        },
    }
}
