//! HTTP JSON API server
//!
//! Routes are organized into modules:
//! - routes::transactions: transaction CRUD, listing and stats
//!
//! Everything except `/health` sits behind the authentication gate.

pub mod auth;
pub mod error;
pub mod response;
pub mod routes;

use axum::{
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use fintrack_config::Config;
use fintrack_core::TransactionService;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

pub use auth::{AuthUser, Authenticator, StaticTokenAuthenticator};
pub use error::ApiError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TransactionService>,
    pub auth: Arc<dyn Authenticator>,
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    use routes::transactions::{
        create_transaction, delete_transaction, get_transaction, list_transactions,
        transaction_stats, update_transaction,
    };

    let protected = Router::new()
        .route("/transactions", get(list_transactions).post(create_transaction))
        .route("/transactions/stats", get(transaction_stats))
        .route(
            "/transactions/:id",
            get(get_transaction).put(update_transaction).delete(delete_transaction),
        )
        .route_layer(from_fn_with_state(state.clone(), auth::require_auth));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Start the HTTP server
///
/// Builds the in-memory store, the service and the token gate from `config`,
/// then serves until Ctrl-C.
pub async fn start_server(config: Config) -> anyhow::Result<()> {
    let addr = config.bind_address();
    let authenticator = StaticTokenAuthenticator::from_config(&config.auth);
    if authenticator.is_empty() {
        log::warn!("No auth tokens configured; every transaction request will be rejected");
    }

    let state = AppState {
        service: Arc::new(TransactionService::in_memory(&config)),
        auth: Arc::new(authenticator),
    };
    let router = create_router(state);

    let listener = TcpListener::bind(&addr).await?;
    log::info!("Starting fintrack server on http://{}", addr);
    log::info!("Available routes:");
    log::info!("  - GET    /health");
    log::info!("  - POST   /transactions");
    log::info!("  - GET    /transactions");
    log::info!("  - GET    /transactions/stats");
    log::info!("  - GET    /transactions/:id");
    log::info!("  - PUT    /transactions/:id");
    log::info!("  - DELETE /transactions/:id");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("Server stopped gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
    }
}
