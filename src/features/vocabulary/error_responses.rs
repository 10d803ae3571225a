use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::data::models::VocabularyError;
use crate::utils::json_error;

impl IntoResponse for VocabularyError {
    fn into_response(self) -> Response {
        let (status, retryable) = match &self {
            VocabularyError::NotLoggedIn => (StatusCode::UNAUTHORIZED, false),
            VocabularyError::Validation(_) => (StatusCode::BAD_REQUEST, false),
            VocabularyError::NotFound => (StatusCode::NOT_FOUND, false),
            VocabularyError::Store(e) => (e.status_code(), e.is_transient()),
            VocabularyError::Task(_) => (StatusCode::INTERNAL_SERVER_ERROR, true),
        };

        if status.is_server_error() {
            log::error!("Vocabulary request failed: {}", self);
        }

        json_error(status, self.to_string(), retryable)
    }
}
