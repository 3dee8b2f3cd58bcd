use crate::{BillingSource, FetchParams, ReportKind};
use async_trait::async_trait;
use meterview_common::FetchError;
use reqwest::Client;
use std::time::Duration;

const NETWORK_ERROR: &str =
    "Network error: Unable to connect to the server. Please check your internet connection.";

/// Talks to the meterview proxy service (`/api/usage`, `/api/cost`).
///
/// The proxy holds the billing credentials, so this side sends none.
pub struct ProxyBillingSource {
    client: Client,
    base_url: String,
}

impl ProxyBillingSource {
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| FetchError::network(format!("http client build failed: {}", e)))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url_for(&self, params: &FetchParams) -> String {
        match params {
            FetchParams::Usage { from, to } => format!(
                "{}/api/usage?fromDate={}&toDate={}",
                self.base_url, from, to
            ),
            FetchParams::Cost => format!("{}/api/cost", self.base_url),
        }
    }
}

#[async_trait]
impl BillingSource for ProxyBillingSource {
    async fn fetch(&self, params: &FetchParams) -> Result<serde_json::Value, FetchError> {
        let kind = params.kind();
        let url = self.url_for(params);
        tracing::debug!(kind = %kind, url = %url, "fetching report");

        let resp = self
            .client
            .get(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(kind = %kind, "proxy request failed: {}", e);
                if e.is_connect() || e.is_timeout() || e.is_request() {
                    FetchError::network(NETWORK_ERROR)
                } else {
                    FetchError::network(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            // The proxy reports failures as {"error": "..."}; fall back to the status line.
            let body: serde_json::Value = resp.json().await.unwrap_or_default();
            let message = body
                .get("error")
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .unwrap_or_else(|| default_failure(kind, status));
            return Err(FetchError::upstream(status.as_u16(), message));
        }

        resp.json::<serde_json::Value>()
            .await
            .map_err(|_| FetchError::MalformedResponse { fields: None })
    }
}

fn default_failure(kind: ReportKind, status: reqwest::StatusCode) -> String {
    format!(
        "Failed to fetch {} data: {} {}",
        kind,
        status.as_u16(),
        status.canonical_reason().unwrap_or("")
    )
    .trim_end()
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use meterview_common::YearMonth;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn usage_params() -> FetchParams {
        let from: YearMonth = "202501".parse().unwrap();
        let to: YearMonth = "202510".parse().unwrap();
        FetchParams::usage(from, to)
    }

    #[tokio::test]
    async fn usage_query_uses_from_and_to_dates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/usage"))
            .and(query_param("fromDate", "202501"))
            .and(query_param("toDate", "202510"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"usage": 1}])))
            .mount(&server)
            .await;

        let source = ProxyBillingSource::new(format!("{}/", server.uri())).unwrap();
        let v = source.fetch(&usage_params()).await.unwrap();
        assert_eq!(v, json!([{"usage": 1}]));
    }

    #[tokio::test]
    async fn error_field_of_failed_response_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cost"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(json!({"error": "Billing API configuration is missing"})),
            )
            .mount(&server)
            .await;

        let source = ProxyBillingSource::new(server.uri()).unwrap();
        let err = source.fetch(&FetchParams::Cost).await.unwrap_err();
        assert_eq!(
            err,
            FetchError::upstream(500, "Billing API configuration is missing")
        );
    }

    #[tokio::test]
    async fn failed_response_without_body_uses_status_line() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let source = ProxyBillingSource::new(server.uri()).unwrap();
        let err = source.fetch(&usage_params()).await.unwrap_err();
        assert_eq!(
            err.user_message(),
            "Failed to fetch usage data: 502 Bad Gateway"
        );
    }

    #[tokio::test]
    async fn unreachable_proxy_is_network_error() {
        let source = ProxyBillingSource::new("http://127.0.0.1:1").unwrap();
        let err = source.fetch(&FetchParams::Cost).await.unwrap_err();
        assert_eq!(err, FetchError::network(NETWORK_ERROR));
    }
}
