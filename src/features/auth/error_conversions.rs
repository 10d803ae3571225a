use bcrypt::BcryptError;
use diesel::result::Error as DieselError;
use tokio::task::JoinError;
use tower_sessions::session::Error as SessionError;
use validator::ValidationErrors;

use crate::data::models::{LoginError, RegisterError};
use crate::data::repositories::user::CreateUserError;

impl From<DieselError> for LoginError {
    fn from(err: DieselError) -> Self {
        LoginError::DatabaseError(err)
    }
}

impl From<BcryptError> for LoginError {
    fn from(err: BcryptError) -> Self {
        LoginError::HashingError(err)
    }
}

impl From<SessionError> for LoginError {
    fn from(err: SessionError) -> Self {
        LoginError::SessionError(err.to_string())
    }
}

impl From<r2d2::Error> for LoginError {
    fn from(err: r2d2::Error) -> Self {
        LoginError::PoolError(err.to_string())
    }
}

impl From<BcryptError> for RegisterError {
    fn from(err: BcryptError) -> Self {
        RegisterError::HashingError(err)
    }
}

impl From<SessionError> for RegisterError {
    fn from(err: SessionError) -> Self {
        RegisterError::SessionError(err.to_string())
    }
}

impl From<ValidationErrors> for RegisterError {
    fn from(err: ValidationErrors) -> Self {
        RegisterError::ValidationError(err.to_string())
    }
}

impl From<r2d2::Error> for RegisterError {
    fn from(err: r2d2::Error) -> Self {
        RegisterError::PoolError(err.to_string())
    }
}

impl From<CreateUserError> for RegisterError {
    fn from(err: CreateUserError) -> Self {
        match err {
            CreateUserError::Database(e) => RegisterError::DatabaseError(e),
            CreateUserError::Hashing(e) => RegisterError::HashingError(e),
        }
    }
}

impl From<JoinError> for LoginError {
    fn from(err: JoinError) -> Self {
        LoginError::TaskError(err.to_string())
    }
}

impl From<JoinError> for RegisterError {
    fn from(err: JoinError) -> Self {
        RegisterError::TaskError(err.to_string())
    }
}
