//! Error types for fragql

use std::error::Error as StdError;
use thiserror::Error;

/// Result type alias for fragql operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Boxed error raised by an execution backend.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Error types for resolving and executing fragment lists
#[derive(Debug, Error)]
pub enum OrmError {
    /// A fragment the resolver cannot turn into SQL.
    ///
    /// Always a programming error in the builder closure; never retried.
    #[error("Invalid fragment: {0}")]
    InvalidFragment(String),

    /// Any failure raised by the execution backend (constraint violation,
    /// lost connection, malformed SQL, ...). The text is kept verbatim.
    #[error("Backend error: {message}")]
    Backend {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// The backend call did not finish within the operator timeout.
    ///
    /// The pending backend future is dropped. Whether a write still took
    /// effect depends on the backend: `SqliteBackend` cancels the call and
    /// rolls back, unless its commit had already started.
    #[error("Query timeout after {0:?}")]
    Timeout(std::time::Duration),
}

impl OrmError {
    /// Create an invalid fragment error
    pub fn invalid_fragment(message: impl Into<String>) -> Self {
        Self::InvalidFragment(message.into())
    }

    /// Wrap an error raised by a backend.
    pub fn backend<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Backend {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// Create a backend error from a bare message.
    pub fn backend_message(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
            source: None,
        }
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Check if this is an invalid fragment error
    pub fn is_invalid_fragment(&self) -> bool {
        matches!(self, Self::InvalidFragment(_))
    }

    /// Check if this error came from the backend
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Backend { .. })
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// The backend's own error text, if this is a backend error.
    pub fn backend_text(&self) -> Option<&str> {
        match self {
            Self::Backend { message, .. } => Some(message),
            _ => None,
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<tokio_rusqlite::Error> for OrmError {
    fn from(err: tokio_rusqlite::Error) -> Self {
        match err {
            tokio_rusqlite::Error::Rusqlite(e) => Self::backend(e),
            other => Self::backend(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_keeps_message_and_source() {
        let err = OrmError::backend(std::io::Error::other("UNIQUE constraint failed: t.id"));
        assert!(err.is_backend());
        assert_eq!(err.backend_text(), Some("UNIQUE constraint failed: t.id"));
        assert!(err.source().is_some());
        assert_eq!(
            err.to_string(),
            "Backend error: UNIQUE constraint failed: t.id"
        );
    }

    #[test]
    fn non_backend_errors_have_no_backend_text() {
        assert_eq!(OrmError::invalid_fragment("x").backend_text(), None);
        assert!(OrmError::Timeout(std::time::Duration::from_secs(1)).is_timeout());
    }
}
