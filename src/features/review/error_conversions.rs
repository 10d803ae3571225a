use diesel::result::{DatabaseErrorKind, Error as DieselError};

use crate::data::models::{InvalidValue, StoreError};

impl From<DieselError> for StoreError {
    fn from(err: DieselError) -> Self {
        match &err {
            DieselError::NotFound => StoreError::NotFound,
            DieselError::DatabaseError(
                DatabaseErrorKind::ForeignKeyViolation
                | DatabaseErrorKind::UniqueViolation
                | DatabaseErrorKind::CheckViolation
                | DatabaseErrorKind::NotNullViolation,
                info,
            ) => StoreError::Constraint(info.message().to_string()),
            // SQLite reports a held write lock as an unclassified error.
            DieselError::DatabaseError(DatabaseErrorKind::Unknown, info)
                if is_lock_contention(info.message()) =>
            {
                StoreError::Unavailable(info.message().to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::Unknown, info)
                if info.message().contains("constraint failed") =>
            {
                StoreError::Constraint(info.message().to_string())
            }
            _ => StoreError::Database(err),
        }
    }
}

fn is_lock_contention(message: &str) -> bool {
    message.contains("database is locked") || message.contains("database table is locked")
}

impl From<r2d2::Error> for StoreError {
    fn from(err: r2d2::Error) -> Self {
        StoreError::Pool(err.to_string())
    }
}

impl From<InvalidValue> for StoreError {
    fn from(err: InvalidValue) -> Self {
        StoreError::Integrity(err.to_string())
    }
}
