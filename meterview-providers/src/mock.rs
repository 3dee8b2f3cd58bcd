use crate::{BillingSource, FetchParams, ReportKind};
use async_trait::async_trait;
use meterview_common::FetchError;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// In-memory billing source with canned responses, for tests and demos.
#[derive(Default)]
pub struct MockBillingSource {
    responses: HashMap<ReportKind, Result<Value, FetchError>>,
    delays: HashMap<ReportKind, Duration>,
    calls: Mutex<Vec<FetchParams>>,
}

impl MockBillingSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, kind: ReportKind, response: Result<Value, FetchError>) -> Self {
        self.responses.insert(kind, response);
        self
    }

    pub fn with_delay(mut self, kind: ReportKind, delay: Duration) -> Self {
        self.delays.insert(kind, delay);
        self
    }

    /// Every params value this source has been asked for, in call order.
    pub fn calls(&self) -> Vec<FetchParams> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl BillingSource for MockBillingSource {
    async fn fetch(&self, params: &FetchParams) -> Result<Value, FetchError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(*params);
        }
        let kind = params.kind();
        if let Some(delay) = self.delays.get(&kind) {
            tokio::time::sleep(*delay).await;
        }
        self.responses.get(&kind).cloned().unwrap_or_else(|| {
            Err(FetchError::network(format!(
                "mock billing source has no {} response",
                kind
            )))
        })
    }
}
