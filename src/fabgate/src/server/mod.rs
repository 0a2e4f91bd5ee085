//! The transactions HTTP API.
use axum::routing::{get, post};
use axum::Router;
use fabgate_core::{IdentityLifecycleManager, LedgerSession};
use std::sync::Arc;

pub mod error;
mod handlers;

pub struct AppState {
    pub lifecycle: Arc<IdentityLifecycleManager>,
    pub session: Arc<LedgerSession>,
    pub log: slog::Logger,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/transactions/enrolladmin", post(handlers::enroll_admin))
        .route("/transactions/register-user", post(handlers::register_user))
        .route("/transactions/query", post(handlers::query))
        .with_state(state)
}
