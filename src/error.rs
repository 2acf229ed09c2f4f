use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Every failure the aggregation layer and its HTTP surface can report.
///
/// Absence of metadata is not an error inside the core (lookups return
/// `Option`); `NotFound` only exists so handlers can answer with a 404.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Missing required fields: {0}")]
    Validation(String),
    #[error("Invalid request: {0}")]
    InvalidInput(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request timed out: {0}")]
    Timeout(String),
    #[error("Contract read failed: {0}")]
    ContractRead(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Short, human-readable summary used as the `error` field of responses.
    pub fn summary(&self) -> &'static str {
        match self {
            AppError::Configuration(_) => "Server is not configured for this operation",
            AppError::Validation(_) => "Missing required fields",
            AppError::InvalidInput(_) => "Invalid request",
            AppError::NotFound(_) => "Not found",
            AppError::Network(_) => "Upstream request failed",
            AppError::Timeout(_) => "Upstream request timed out",
            AppError::ContractRead(_) => "Failed to read campaign from ledger",
            AppError::Serialization(_) => "Malformed upstream response",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::ContractRead(_) => StatusCode::BAD_GATEWAY,
            AppError::Configuration(_) | AppError::Network(_) | AppError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout(err.to_string())
        } else if err.is_decode() {
            AppError::Serialization(err.to_string())
        } else {
            AppError::Network(err.to_string())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            AppError::Configuration(msg) => {
                tracing::error!("configuration error: {}", msg);
                json!({ "error": msg })
            }
            AppError::NotFound(msg) => json!({ "error": msg }),
            AppError::Validation(msg)
            | AppError::InvalidInput(msg)
            | AppError::Network(msg)
            | AppError::Timeout(msg)
            | AppError::ContractRead(msg)
            | AppError::Serialization(msg) => json!({
                "error": self.summary(),
                "details": msg,
            }),
        };

        (status, Json(body)).into_response()
    }
}
