//! HTTP server.
//!
//! Serves the index page, the two generation endpoints (form and JSON),
//! ratings, the album, and everything under `static/`. It listens either
//! on TCP or on a Unix domain socket so the reverse proxy can reach it
//! whichever way the host is set up.

pub mod error;
pub mod pages;
pub mod routes;
pub mod session;
pub mod state;

use std::future::Future;
use std::os::unix::fs::FileTypeExt;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::{TcpListener, UnixListener};
use tokio::signal;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;

use crate::config::{Bind, Config};

pub use state::State;

use routes::{
    album_handler, generate_async_handler, generate_handler, health_handler, index_handler,
    rate_handler, save_to_album_handler,
};

/// Builds the application router.
pub fn router(state: Arc<State>) -> Router {
    let static_dir = state.service.layout().static_dir();

    Router::new()
        .route("/", get(index_handler))
        .route("/generate", post(generate_handler))
        .route("/generate_async", post(generate_async_handler))
        .route("/rate", post(rate_handler))
        .route("/album", get(album_handler).post(save_to_album_handler))
        .route("/healthz", get(health_handler))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Runs the server until Ctrl+C or SIGTERM.
pub async fn serve(config: &Config) -> Result<()> {
    info!("Initializing state...");
    let state = State::new(config)?;
    serve_with_state(&config.bind, state).await
}

/// Runs the server on `bind` with prepared state.
pub async fn serve_with_state(bind: &Bind, state: Arc<State>) -> Result<()> {
    serve_until(bind, state, shutdown_signal()).await
}

/// Runs the server on `bind` until `shutdown` completes.
pub async fn serve_until<F>(bind: &Bind, state: Arc<State>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(state);

    match bind {
        Bind::Tcp(address) => {
            info!("Binding to {address}");
            let listener = TcpListener::bind(address)
                .await
                .with_context(|| format!("Failed to bind {address}"))?;
            info!("Server running on http://{address}");

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
                .context("Server error")?;
        }
        Bind::Unix(path) => {
            let listener = bind_unix(path)?;
            info!("Server running on unix:{}", path.display());

            let result = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await;

            if let Err(e) = std::fs::remove_file(path) {
                tracing::warn!("Failed to remove socket {}: {}", path.display(), e);
            }
            result.context("Server error")?;
        }
    }

    info!("Server shut down");
    Ok(())
}

/// Binds a Unix socket, clearing a stale socket file left by a previous run.
///
/// Anything at `path` that is not a socket is left alone and reported.
fn bind_unix(path: &Path) -> Result<UnixListener> {
    if let Ok(metadata) = std::fs::symlink_metadata(path) {
        if !metadata.file_type().is_socket() {
            bail!(
                "Refusing to replace {}: it exists and is not a socket",
                path.display()
            );
        }
        std::fs::remove_file(path).context("Failed to remove existing socket file")?;
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    UnixListener::bind(path).with_context(|| format!("Failed to bind {}", path.display()))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
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
}
