use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
///
/// The ranking core only ever produces `NotFound`, `IndexOutOfRange`,
/// `MalformedData` and `InvalidInput`. The remaining variants belong to the
/// poster enrichment path, which absorbs them before they reach a caller.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Index out of range: {0}")]
    IndexOutOfRange(String),

    #[error("Malformed data: {0}")]
    MalformedData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Builds the error for a position outside `[0, len)`
    pub fn out_of_range(position: impl std::fmt::Display, len: usize) -> Self {
        AppError::IndexOutOfRange(format!(
            "position {} is outside the catalog range [0, {})",
            position, len
        ))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::IndexOutOfRange(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::MalformedData(_) | AppError::Cache(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::ExternalApi(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::HttpClient(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
