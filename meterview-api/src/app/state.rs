use crate::settings::Settings;
use meterview_common::FetchError;
use meterview_providers::{BillingSource, UpstreamClient};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    /// `None` when the billing API is not configured; handlers answer 500.
    pub billing: Option<Arc<dyn BillingSource>>,
}

impl AppState {
    pub fn new(settings: &Settings) -> Result<Arc<Self>, FetchError> {
        let billing: Option<Arc<dyn BillingSource>> = match settings.upstream.clone() {
            Some(config) => Some(Arc::new(UpstreamClient::new(config)?)),
            None => None,
        };
        Ok(Arc::new(Self { billing }))
    }

    /// State backed by an arbitrary billing source.
    pub fn with_source(billing: Arc<dyn BillingSource>) -> Arc<Self> {
        Arc::new(Self {
            billing: Some(billing),
        })
    }
}
