//! Error translation at the HTTP boundary.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::service::ServiceError;

/// Errors a handler can produce: request validation failures, or anything
/// the service reported.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl ApiError {
    pub fn validation(detail: impl Into<String>) -> Self {
        ApiError::Validation(detail.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ApiError::Validation(detail) => (StatusCode::BAD_REQUEST, detail.clone()),
            ApiError::Service(err) => match err {
                ServiceError::Duplicate => (StatusCode::BAD_REQUEST, err.to_string()),
                ServiceError::NotFound => {
                    (StatusCode::NOT_FOUND, "Employee not found".to_string())
                }
                ServiceError::InvalidRequest(detail) => {
                    (StatusCode::BAD_REQUEST, detail.clone())
                }
                ServiceError::Inconsistent => {
                    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
                }
                ServiceError::Store(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal store error".to_string(),
                ),
            },
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
