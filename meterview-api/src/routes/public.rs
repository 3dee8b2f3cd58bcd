// Public routes: banner, health, version, API docs
use crate::app::AppState;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api_docs;
use crate::handlers::health;
use crate::version;

pub fn create_public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", api_docs::ApiDoc::openapi()),
        )
        .route("/", get(root))
        .route("/health", get(health::health))
        .route("/api/version", get(get_version))
}

#[utoipa::path(
    get,
    path = "/api/version",
    tag = "System",
    responses((status = 200, description = "Service version", body = version::VersionInfo))
)]
pub async fn get_version() -> axum::Json<version::VersionInfo> {
    axum::Json(version::get_version_info())
}

async fn root() -> &'static str {
    "Meterview API - billing usage and cost proxy"
}
