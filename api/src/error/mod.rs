use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use tezos_indexer::infrastructure::persistence::StoreError;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Bad query parameter; reported to the caller, not logged as an error
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Database error: {0}")]
    Store(#[from] StoreError),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidParameter(msg) => {
                tracing::debug!(reason = %msg, "Rejected request");
                StatusCode::BAD_REQUEST
            }
            ApiError::Store(err) => {
                tracing::error!(error = %err, "Store error while serving request");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error while serving request");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = match self {
            ApiError::InvalidParameter(msg) => msg,
            // Store details stay in the logs
            ApiError::Store(_) | ApiError::Internal(_) => "internal server error".to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
