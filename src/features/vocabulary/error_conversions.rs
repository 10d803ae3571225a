use tokio::task::JoinError;
use validator::ValidationErrors;

use crate::data::models::{StoreError, VocabularyError};

impl From<StoreError> for VocabularyError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => VocabularyError::NotFound,
            // Only a bad reference in the request can trip a constraint
            // here, e.g. a book that doesn't exist.
            StoreError::Constraint(msg) => VocabularyError::Validation(msg),
            other => VocabularyError::Store(other),
        }
    }
}

impl From<ValidationErrors> for VocabularyError {
    fn from(err: ValidationErrors) -> Self {
        VocabularyError::Validation(err.to_string())
    }
}

impl From<JoinError> for VocabularyError {
    fn from(err: JoinError) -> Self {
        VocabularyError::Task(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    use super::*;

    #[test]
    fn rejected_write_is_a_client_error() {
        let err = VocabularyError::from(StoreError::Constraint("FOREIGN KEY constraint failed".into()));
        assert!(matches!(err, VocabularyError::Validation(_)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unavailable_store_stays_retryable() {
        let err = VocabularyError::from(StoreError::Unavailable("database is locked".into()));
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
