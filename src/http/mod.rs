//! HTTP transport for the wallet service.
//!
//! | Method | Path                          | Success                       |
//! |--------|-------------------------------|-------------------------------|
//! | GET    | `/health`                     | 200 `OK`                      |
//! | POST   | `/api/v1/wallets`             | 201, new wallet id            |
//! | GET    | `/api/v1/wallets`             | 200, JSON array of wallets    |
//! | GET    | `/api/v1/wallets/:wallet_id`  | 200, balance                  |
//! | POST   | `/api/v1/wallets/:wallet_id`  | 200, balance after operation  |
//! | DELETE | `/api/v1/wallets/:wallet_id`  | 204                           |
//!
//! Everything except the wallet list answers in plain text.

mod error;
mod handlers;

use std::time::Duration;

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::application::WalletService;
use crate::storage::WalletStore;

pub use error::*;

/// Build the application router.
///
/// Requests running longer than `request_timeout` are answered with 408 and
/// their handler is dropped, which rolls back any open transaction.
pub fn router<S: WalletStore>(service: WalletService<S>, request_timeout: Duration) -> Router {
    let api = Router::new()
        .route(
            "/wallets",
            get(handlers::list_wallets::<S>).post(handlers::create_wallet::<S>),
        )
        .route(
            "/wallets/:wallet_id",
            get(handlers::get_balance::<S>)
                .post(handlers::apply_operation::<S>)
                .delete(handlers::delete_wallet::<S>),
        );

    Router::new()
        .route("/health", get(handlers::health_check::<S>))
        .nest("/api/v1", api)
        .with_state(service)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
}

/// Serve the API on `addr` until Ctrl-C.
pub async fn serve<S: WalletStore>(
    service: WalletService<S>,
    addr: &str,
    request_timeout: Duration,
) -> Result<()> {
    let app = router(service, request_timeout);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(addr = %addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
