use salvo::http::StatusCode;
use thiserror::Error;

use medfinder_service::error::ServiceError;

/// Application-level errors (HTTP layer)
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    ServiceError(#[from] ServiceError),

    #[error(transparent)]
    DatabaseError(#[from] medfinder_db::error::DbError),

    #[error(transparent)]
    CoreError(#[from] medfinder_core::error::CoreError),
}

impl AppError {
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::ServiceError(err) => match err {
                ServiceError::ValidationError(_) => StatusCode::BAD_REQUEST,
                ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
                ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
                ServiceError::Conflict(_) => StatusCode::CONFLICT,
                ServiceError::IndexUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                ServiceError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                ServiceError::DatabaseError(_) | ServiceError::CoreError(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::DatabaseError(_) | Self::CoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the caller. Server-side failures never carry
    /// internal detail.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::ServiceError(
                ServiceError::ValidationError(msg)
                | ServiceError::NotFound(msg)
                | ServiceError::Forbidden(msg)
                | ServiceError::Conflict(msg),
            ) => msg.clone(),
            Self::ServiceError(ServiceError::IndexUnavailable(_)) => {
                "Spatial index unavailable".to_string()
            }
            Self::ServiceError(ServiceError::Timeout(_)) => "Search timed out".to_string(),
            _ => "Server error".to_string(),
        }
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;
