use anyhow::Context;
use meterview_api::app::{create_cors, AppState};
use meterview_api::routes::create_router;
use meterview_api::Settings;
use std::net::SocketAddr;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    dotenv::dotenv().ok();

    let settings = Settings::from_env();
    match &settings.upstream {
        Some(up) => info!(
            usage_url = %up.usage_url,
            cost_url = %up.cost_url,
            credentials = ?up.credentials,
            "billing API configured"
        ),
        None => warn!(
            "billing API not configured (USAGE_API_URL, COST_API_URL, BILLING_USERNAME, BILLING_PASSWORD); report endpoints will answer 500"
        ),
    }

    let port = settings.port;
    let state = AppState::new(&settings).context("Failed to build billing API client")?;

    let app = create_router()
        .layer(create_cors()) // Apply CORS to ALL routes
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("meterview-api listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
