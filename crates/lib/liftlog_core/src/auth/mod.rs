//! Authentication and authorization logic.
//!
//! Provides password hashing, opaque bearer tokens and the user repository
//! that the HTTP layer composes into login and request authentication.

pub mod password;
pub mod tokens;
pub mod users;

use thiserror::Error;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Password hashing failed: {0}")]
    Encoding(String),

    #[error("Stored credential is unreadable: {0}")]
    Verification(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Map a unique-constraint violation to `Conflict`, passing other errors through.
    pub(crate) fn from_unique(e: sqlx::Error, what: impl FnOnce(Option<&str>) -> String) -> Self {
        if let sqlx::Error::Database(db) = &e
            && db.is_unique_violation()
        {
            return AuthError::Conflict(what(db.constraint()));
        }
        AuthError::DbError(e)
    }
}
