// Common test utilities and fixtures
use axum::Router;
use meterview_api::app::{create_cors, AppState};
use meterview_api::routes::create_router;
use meterview_api::Settings;
use meterview_providers::{BillingSource, Credentials, UpstreamConfig};
use std::sync::Arc;
use std::time::Duration;

pub const TEST_USERNAME: &str = "sb-test-client";
pub const TEST_PASSWORD: &str = "test-secret";

/// Settings pointing both reports at `base` with basic auth.
pub fn upstream_settings(base: &str) -> Settings {
    upstream_settings_with(base, Credentials::basic(TEST_USERNAME, TEST_PASSWORD))
}

pub fn upstream_settings_with(base: &str, credentials: Credentials) -> Settings {
    Settings {
        upstream: Some(UpstreamConfig {
            usage_url: format!("{}/reports/v1/monthlyUsage", base),
            cost_url: format!("{}/reports/v1/monthlySubaccountsCost", base),
            credentials,
            timeout: Duration::from_secs(5),
        }),
        ..Settings::default()
    }
}

/// Create a test application service for TestServer.
/// Same router and CORS layer as main.rs, state applied.
pub fn create_test_app_service(settings: Settings) -> Router {
    let state = AppState::new(&settings).expect("build app state");
    create_router().layer(create_cors()).with_state(state)
}

/// Same as `create_test_app_service`, with the billing API replaced by `source`.
pub fn create_test_app_with_source(source: Arc<dyn BillingSource>) -> Router {
    create_router()
        .layer(create_cors())
        .with_state(AppState::with_source(source))
}

pub fn usage_body() -> serde_json::Value {
    serde_json::json!({
        "content": [
            {
                "globalAccountName": "GA",
                "subaccountName": "dev",
                "reportYearMonth": 202501,
                "serviceName": "hana-cloud",
                "metricName": "capacity_units",
                "usage": 4
            }
        ]
    })
}
