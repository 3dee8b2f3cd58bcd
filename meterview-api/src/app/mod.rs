// Application state and cross-cutting layers
pub mod state;

pub use state::AppState;

use tower_http::cors::{Any, CorsLayer};

/// Permissive CORS: the dashboard may be served from any origin.
pub fn create_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
