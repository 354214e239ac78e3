//! The error taxonomy shared by the store, the transaction service and the
//! HTTP handlers.
use axum::http::StatusCode;

use crate::constants::{ERR_DATABASE_OPERATION, ERR_UNAUTHORIZED};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The entity does not exist, was soft-deleted, or is owned by someone else.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The caller supplied input that breaks a model invariant.
    #[error("{0}")]
    Validation(String),

    /// The underlying store failed to read or commit.
    ///
    /// The message is for the server log only. Clients get a generic message.
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// No user is attached to the session.
    #[error("not logged in")]
    Unauthorized,

    /// The request collides with existing state, e.g. a taken username.
    #[error("{0}")]
    Conflict(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub fn persistence(context: &str, error: impl std::fmt::Display) -> Self {
        Error::Persistence(format!("{context}: {error}"))
    }
}

impl From<libsql::Error> for Error {
    fn from(e: libsql::Error) -> Self {
        Error::Persistence(e.to_string())
    }
}

impl From<Error> for (StatusCode, String) {
    fn from(e: Error) -> Self {
        match e {
            Error::NotFound(entity) => (StatusCode::NOT_FOUND, format!("{entity} not found")),
            Error::Validation(message) => (StatusCode::BAD_REQUEST, message),
            Error::Persistence(detail) => {
                tracing::error!("{detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ERR_DATABASE_OPERATION.to_string(),
                )
            }
            Error::Unauthorized => (StatusCode::UNAUTHORIZED, ERR_UNAUTHORIZED.to_string()),
            Error::Conflict(message) => (StatusCode::CONFLICT, message),
        }
    }
}
