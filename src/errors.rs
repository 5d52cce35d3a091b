use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::external::price_provider::PriceProviderError;
use crate::store::StoreError;

/// Errors surfaced through the HTTP layer.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidRange(String),
    #[error("Validation error: {0}")]
    Validation(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidRange(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
        };
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

impl From<QueryRejection> for AppError {
    fn from(value: QueryRejection) -> Self {
        AppError::Validation(value.body_text())
    }
}

/// Failure taxonomy of a backfill or incremental update run.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("no backup found, run `backfill` before an incremental update")]
    NoBackup,
    #[error(transparent)]
    Storage(#[from] StoreError),
    #[error("storage task failed: {0}")]
    Task(String),
}

impl From<PriceProviderError> for UpdateError {
    fn from(value: PriceProviderError) -> Self {
        UpdateError::Fetch(value.to_string())
    }
}
