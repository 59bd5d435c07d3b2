//! HTTP surface: routes, handlers and the server loop.

mod client;
mod error;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::db::{ClientRepository, EntityStore};

pub use error::ApiError;

/// Shared by every request. Cloning is cheap; the store sits behind an Arc.
#[derive(Clone)]
pub struct AppState {
    pub repo: ClientRepository,
    pub page_size: u64,
}

impl AppState {
    pub fn new(store: Arc<dyn EntityStore>, page_size: u64) -> Self {
        Self {
            repo: ClientRepository::new(store),
            page_size,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { StatusCode::OK }))
        .merge(client_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn client_routes() -> Router<AppState> {
    Router::new()
        .route("/clients", get(client::list).post(client::create))
        .route(
            "/clients/:id",
            get(client::get_by_id)
                .put(client::update_by_id)
                .delete(client::delete_by_id),
        )
}

/// Serve until ctrl-c, then let in-flight requests finish
pub async fn serve(config: &Config, store: Arc<dyn EntityStore>) -> Result<()> {
    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(addr = %listener.local_addr()?, "listening");

    let app = router(AppState::new(store, config.page_size));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        // Without a signal handler the only way out is killing the process.
        error!(error = %err, "failed to install ctrl-c handler");
        std::future::pending::<()>().await;
    }
    info!("interrupt received, shutting down");
}
