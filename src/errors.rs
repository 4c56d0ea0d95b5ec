use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Storage-layer I/O failure. Fatal to the call; details are logged,
    /// the client sees a generic internal error.
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
    /// Bad request input: unknown symbol, malformed parameter. Rejected
    /// before any I/O, with the valid universe/range named.
    #[error("Validation error: {0}")]
    Validation(String),
    /// The bar source failed and no cached fallback exists. Distinct from
    /// Validation so clients can tell "retry later" from "fix the request".
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, detail) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::DataUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, format!("Temporarily unavailable: {msg}"))
            }
            AppError::Storage(e) => {
                error!("Storage failure: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };
        (status, Json(json!({ "status": "error", "detail": detail }))).into_response()
    }
}
