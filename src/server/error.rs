//! Error-to-HTTP response conversion.
//!
//! Handlers return `Result<T, OptimizeError>` directly; the body is always
//! `{"error": "<message>"}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::OptimizeError;

impl IntoResponse for OptimizeError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Server error in API handler");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
