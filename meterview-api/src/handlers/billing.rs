use axum::extract::{Query, State};
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use axum::Json;
use meterview_common::YearMonth;
use meterview_providers::FetchParams;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::{ApiError, ErrorBody};

pub const CORRELATION_HEADER: &str = "x-correlation-id";

// --- Query parameters ---

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UsageQuery {
    /// First month of the range, `YYYYMM`.
    pub from_date: Option<String>,
    /// Last month of the range, `YYYYMM`.
    pub to_date: Option<String>,
}

impl UsageQuery {
    pub fn range(&self) -> Result<(YearMonth, YearMonth), ApiError> {
        let (Some(from), Some(to)) = (present(&self.from_date), present(&self.to_date)) else {
            return Err(ApiError::MissingRange);
        };
        let parse = |param: &'static str, value: &str| {
            value.parse::<YearMonth>().map_err(|_| ApiError::InvalidMonth {
                param,
                value: value.to_string(),
            })
        };
        Ok((parse("fromDate", from)?, parse("toDate", to)?))
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

// --- Handlers ---

#[utoipa::path(
    get,
    path = "/api/usage",
    tag = "Billing",
    params(UsageQuery),
    responses(
        (status = 200, description = "Monthly usage report, passed through from the billing API", body = serde_json::Value),
        (status = 400, description = "Missing or malformed month range", body = ErrorBody),
        (status = 500, description = "Billing API not configured or answered with an error", body = ErrorBody),
        (status = 502, description = "Billing API unreachable", body = ErrorBody)
    )
)]
pub async fn get_usage(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UsageQuery>,
) -> Response {
    match query.range() {
        Ok((from, to)) => proxy(&state, FetchParams::usage(from, to)).await,
        Err(e) => {
            tracing::info!(error = %e, "rejected usage request");
            e.into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/cost",
    tag = "Billing",
    responses(
        (status = 200, description = "Monthly subaccount cost report, passed through from the billing API", body = serde_json::Value),
        (status = 500, description = "Billing API not configured or answered with an error", body = ErrorBody),
        (status = 502, description = "Billing API unreachable", body = ErrorBody)
    )
)]
pub async fn get_cost(State(state): State<Arc<AppState>>) -> Response {
    proxy(&state, FetchParams::Cost).await
}

/// Forward one fetch to the billing API and pass its JSON through unchanged.
async fn proxy(state: &AppState, params: FetchParams) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    let span = tracing::info_span!(
        "billing_proxy",
        correlation_id = %correlation_id,
        kind = %params.kind()
    );

    let mut response = async {
        let Some(billing) = state.billing.as_ref() else {
            tracing::error!("billing API configuration is missing");
            return ApiError::NotConfigured.into_response();
        };

        let start = Instant::now();
        match billing.fetch(&params).await {
            Ok(body) => {
                tracing::info!(
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "billing API request succeeded"
                );
                Json(body).into_response()
            }
            Err(e) => {
                let err = ApiError::from(e);
                tracing::error!(
                    status = err.status().as_u16(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    error = %err,
                    "billing API request failed"
                );
                err.into_response()
            }
        }
    }
    .instrument(span)
    .await;

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        response.headers_mut().insert(CORRELATION_HEADER, value);
    }
    response
}
