use thiserror::Error;

/// Database layer errors
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] diesel::result::Error),

    #[error("Pool error: {0}")]
    PoolError(#[from] diesel_async::pooled_connection::bb8::RunError),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Spatial index unavailable: {0}")]
    IndexUnavailable(String),

    #[error(transparent)]
    CoreError(#[from] medfinder_core::error::CoreError),
}

impl DbError {
    /// ## Summary
    /// Maps unique-constraint violations onto [`DbError::Conflict`], naming the
    /// violated constraint, and wraps everything else unchanged.
    #[must_use]
    pub fn from_write(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};

        match err {
            Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                let field = match info.constraint_name() {
                    Some("pharmacy_email_key") => "email",
                    Some("pharmacy_phone_key") => "phone",
                    _ => "record",
                };
                Self::Conflict(format!("A pharmacy with this {field} already exists"))
            }
            other => Self::DatabaseError(other),
        }
    }
}

pub type DbResult<T> = std::result::Result<T, DbError>;
