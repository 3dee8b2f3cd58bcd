use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use meterview_common::FetchError;
use serde::Serialize;
use thiserror::Error;

/// Error body of every failing endpoint.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("fromDate and toDate are required")]
    MissingRange,

    #[error("{param} must be a YYYYMM month, got {value:?}")]
    InvalidMonth { param: &'static str, value: String },

    #[error("Billing API configuration is missing")]
    NotConfigured,

    #[error("{0}")]
    Fetch(#[from] FetchError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingRange | ApiError::InvalidMonth { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Fetch(FetchError::Upstream { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Fetch(FetchError::Network(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Fetch(FetchError::MalformedResponse { .. }) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
