use std::time::Duration;

use thiserror::Error;

use medfinder_core::error::CoreError;
use medfinder_db::error::DbError;

/// Service layer errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Spatial index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Query exceeded its {0:?} time limit")]
    Timeout(Duration),

    #[error(transparent)]
    DatabaseError(DbError),

    #[error(transparent)]
    CoreError(CoreError),
}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ValidationError(msg) | CoreError::InvalidInput(msg) => {
                Self::ValidationError(msg)
            }
            other => Self::CoreError(other),
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Conflict(msg) => Self::Conflict(msg),
            DbError::IndexUnavailable(msg) => Self::IndexUnavailable(msg),
            DbError::CoreError(core) => Self::from(core),
            other => Self::DatabaseError(other),
        }
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
