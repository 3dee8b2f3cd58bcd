use crate::{BillingSource, Credentials, FetchParams};
use async_trait::async_trait;
use meterview_common::{FetchError, YearMonth};
use reqwest::Client;
use std::time::Duration;

/// Where the billing API lives and how to authenticate against it.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub usage_url: String,
    pub cost_url: String,
    pub credentials: Credentials,
    pub timeout: Duration,
}

/// Client for the billing API itself (the side the proxy talks to).
pub struct UpstreamClient {
    client: Client,
    config: UpstreamConfig,
}

impl UpstreamClient {
    pub fn new(config: UpstreamConfig) -> Result<Self, FetchError> {
        // Default reqwest client has no overall timeout; a stalled billing API would hang the request.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(config.timeout)
            .build()
            .map_err(|e| FetchError::network(format!("http client build failed: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    /// Full upstream URL for a fetch, OData query options included.
    pub fn url_for(&self, params: &FetchParams) -> String {
        match params {
            FetchParams::Usage { from, to } => {
                append_query(&self.config.usage_url, "$filter", &usage_filter(*from, *to))
            }
            FetchParams::Cost => append_query(&self.config.cost_url, "$format", "json"),
        }
    }
}

/// OData filter selecting the inclusive month range.
pub fn usage_filter(from: YearMonth, to: YearMonth) -> String {
    format!(
        "reportYearMonth ge {} and reportYearMonth le {}",
        from, to
    )
}

fn append_query(base: &str, key: &str, value: &str) -> String {
    let sep = if base.contains('?') { '&' } else { '?' };
    format!("{}{}{}={}", base, sep, key, urlencoding::encode(value))
}

#[async_trait]
impl BillingSource for UpstreamClient {
    async fn fetch(&self, params: &FetchParams) -> Result<serde_json::Value, FetchError> {
        let url = self.url_for(params);
        let auth = self.config.credentials.authorization(&self.client).await?;

        let start = std::time::Instant::now();
        let resp = self
            .client
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, auth)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(
                    kind = %params.kind(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    is_timeout = e.is_timeout(),
                    is_connect = e.is_connect(),
                    "billing API unreachable: {}",
                    e
                );
                let msg = if e.is_timeout() {
                    "Billing API request timeout".to_string()
                } else {
                    format!("Cannot connect to billing API: {}", e)
                };
                FetchError::network(msg)
            })?;

        let status = resp.status();
        tracing::debug!(
            kind = %params.kind(),
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "billing API responded"
        );

        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            let mut message = format!(
                "Billing API returned {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            );
            let detail = detail.trim();
            if !detail.is_empty() {
                message.push_str(" - ");
                message.push_str(detail);
            }
            return Err(FetchError::upstream(status.as_u16(), message));
        }

        resp.json::<serde_json::Value>().await.map_err(|e| {
            tracing::warn!(kind = %params.kind(), "billing API sent non-JSON body: {}", e);
            FetchError::MalformedResponse { fields: None }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ym(s: &str) -> YearMonth {
        s.parse().unwrap()
    }

    fn client(base: &str) -> UpstreamClient {
        UpstreamClient::new(UpstreamConfig {
            usage_url: format!("{}/reports/v1/monthlyUsage", base),
            cost_url: format!("{}/odata/MonthlySubaccountCmCosts", base),
            credentials: Credentials::basic("user", "pass"),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn usage_url_carries_encoded_filter() {
        let c = client("https://billing.example");
        let url = c.url_for(&FetchParams::usage(ym("202501"), ym("202510")));
        assert_eq!(
            url,
            "https://billing.example/reports/v1/monthlyUsage?$filter=reportYearMonth%20ge%20202501%20and%20reportYearMonth%20le%20202510"
        );
    }

    #[test]
    fn cost_url_appends_to_existing_query() {
        let mut c = client("https://billing.example");
        c.config.cost_url = "https://billing.example/odata/Costs?sap-client=100".into();
        assert_eq!(
            c.url_for(&FetchParams::Cost),
            "https://billing.example/odata/Costs?sap-client=100&$format=json"
        );
    }

    #[tokio::test]
    async fn fetch_sends_basic_auth_and_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reports/v1/monthlyUsage"))
            .and(query_param(
                "$filter",
                "reportYearMonth ge 202501 and reportYearMonth le 202510",
            ))
            .and(header("authorization", "Basic dXNlcjpwYXNz"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": []})))
            .mount(&server)
            .await;

        let c = client(&server.uri());
        let v = c
            .fetch(&FetchParams::usage(ym("202501"), ym("202510")))
            .await
            .unwrap();
        assert_eq!(v, json!({"content": []}));
    }

    #[tokio::test]
    async fn non_success_becomes_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("missing role"))
            .mount(&server)
            .await;

        let err = client(&server.uri())
            .fetch(&FetchParams::Cost)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(403));
        assert_eq!(
            err.user_message(),
            "Billing API returned 403: Forbidden - missing role"
        );
    }

    #[tokio::test]
    async fn unreachable_is_network_error() {
        let c = client("http://127.0.0.1:1");
        let err = c.fetch(&FetchParams::Cost).await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }
}
