//! Auth-level errors and translation of backend failures.

use crate::config::TableNames;
use fragql::OrmError;
use thiserror::Error;

/// Result type alias for auth adapter operations
pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    /// A key with the same id already exists.
    #[error("Duplicate key id")]
    DuplicateKeyId,

    /// A session with the same id already exists.
    #[error("Duplicate session id")]
    DuplicateSessionId,

    /// The referenced user does not exist.
    #[error("Invalid user id")]
    InvalidUserId,

    /// The backend answered with something the adapter cannot use.
    #[error("Unexpected value: {0}")]
    UnexpectedValue(String),

    /// Configuration could not be read or parsed.
    #[error("Config error: {0}")]
    Config(String),

    /// Any other error from the query layer.
    #[error(transparent)]
    Orm(#[from] OrmError),
}

impl AuthError {
    /// Host-framework error code for the translated variants.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::DuplicateKeyId => Some("AUTH_DUPLICATE_KEY_ID"),
            Self::DuplicateSessionId => Some("AUTH_DUPLICATE_SESSION_ID"),
            Self::InvalidUserId => Some("AUTH_INVALID_USER_ID"),
            _ => None,
        }
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::UnexpectedValue(message.into())
    }
}

/// Which constraint failures a write may be translated into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Violation {
    DuplicateKeyId,
    DuplicateSessionId,
    InvalidUserId,
}

/// Translate a query-layer error into an [`AuthError`].
///
/// Only backend errors are inspected, and only for the violations listed in
/// `expected`; everything else passes through as [`AuthError::Orm`].
pub(crate) fn translate(err: OrmError, tables: &TableNames, expected: &[Violation]) -> AuthError {
    let Some(text) = err.backend_text() else {
        return AuthError::Orm(err);
    };
    let unique = text.contains("UNIQUE constraint failed");
    for violation in expected {
        let translated = match violation {
            Violation::DuplicateKeyId if unique && text.contains(&format!("{}.id", tables.key)) => {
                AuthError::DuplicateKeyId
            }
            Violation::DuplicateSessionId
                if unique && text.contains(&format!("{}.id", tables.session)) =>
            {
                AuthError::DuplicateSessionId
            }
            Violation::InvalidUserId if text.contains("FOREIGN KEY constraint failed") => {
                AuthError::InvalidUserId
            }
            _ => continue,
        };
        tracing::debug!(
            target: "fragql_auth",
            error = %err,
            code = translated.code(),
            "translated backend error"
        );
        return translated;
    }
    AuthError::Orm(err)
}
