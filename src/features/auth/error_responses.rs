use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::data::models::{LoginError, RegisterError};
use crate::utils::json_error;

impl IntoResponse for LoginError {
    fn into_response(self) -> Response {
        let status = match &self {
            LoginError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            LoginError::PoolError(_) => StatusCode::SERVICE_UNAVAILABLE,
            LoginError::DatabaseError(_)
            | LoginError::HashingError(_)
            | LoginError::SessionError(_)
            | LoginError::TaskError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            log::error!("Login failed: {:?}", self);
        }

        let retryable = status == StatusCode::SERVICE_UNAVAILABLE;
        json_error(status, self.to_string(), retryable)
    }
}

impl IntoResponse for RegisterError {
    fn into_response(self) -> Response {
        let status = match &self {
            RegisterError::EmailTaken => StatusCode::CONFLICT,
            RegisterError::ValidationError(_) => StatusCode::BAD_REQUEST,
            RegisterError::PoolError(_) => StatusCode::SERVICE_UNAVAILABLE,
            RegisterError::DatabaseError(_)
            | RegisterError::HashingError(_)
            | RegisterError::SessionError(_)
            | RegisterError::TaskError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            log::error!("Registration failed: {:?}", self);
        }

        let retryable = status == StatusCode::SERVICE_UNAVAILABLE;
        json_error(status, self.to_string(), retryable)
    }
}
