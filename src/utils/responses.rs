use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// The JSON error body every API error shares.
pub fn json_error(status: StatusCode, message: String, retryable: bool) -> Response {
    let body = json!({
        "error": message,
        "status": status.as_u16(),
        "retryable": retryable,
    });

    (status, axum::Json(body)).into_response()
}

#[derive(serde::Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
}
