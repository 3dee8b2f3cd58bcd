// Routes module - Centralizes all route definitions
pub mod billing;
pub mod public;

use crate::app::AppState;
use axum::Router;
use std::sync::Arc;

/// Build the main application router
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(public::create_public_routes())
        .merge(billing::create_billing_routes())
}
