// Billing API proxy routes
use crate::app::AppState;
use crate::handlers::billing;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;

pub fn create_billing_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/usage", get(billing::get_usage))
        .route("/api/cost", get(billing::get_cost))
}
