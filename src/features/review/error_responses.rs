use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::data::models::{ReviewError, StoreError};
use crate::utils::json_error;

impl StoreError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            StoreError::NotFound => StatusCode::NOT_FOUND,
            StoreError::Constraint(_) => StatusCode::CONFLICT,
            StoreError::Integrity(_) => StatusCode::INTERNAL_SERVER_ERROR,
            StoreError::Database(_) | StoreError::Pool(_) | StoreError::Unavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }
}

impl IntoResponse for ReviewError {
    fn into_response(self) -> Response {
        let status = match &self {
            ReviewError::NotLoggedIn => StatusCode::UNAUTHORIZED,
            ReviewError::NoSession => StatusCode::NOT_FOUND,
            ReviewError::InvalidState { .. } | ReviewError::NothingToRetry => StatusCode::CONFLICT,
            ReviewError::Store(e) => e.status_code(),
            ReviewError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ReviewError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            log::error!("Review request failed: {}", self);
        }

        let retryable = self.is_retryable();
        json_error(status, self.to_string(), retryable)
    }
}
