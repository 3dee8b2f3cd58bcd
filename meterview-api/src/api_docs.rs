use crate::error::ErrorBody;
use crate::handlers::{billing, health};
use crate::routes::public;
use crate::version::VersionInfo;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(title = "Meterview API", description = "Proxy to the billing usage and cost reports"),
    paths(
        billing::get_usage,
        billing::get_cost,
        health::health,
        public::get_version
    ),
    components(schemas(ErrorBody, VersionInfo, health::HealthResponse)),
    tags(
        (name = "Billing", description = "Usage and cost reports"),
        (name = "System", description = "Health and version")
    )
)]
pub struct ApiDoc;
