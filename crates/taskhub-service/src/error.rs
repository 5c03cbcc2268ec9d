//! Service error types.

use std::fmt;

use taskhub_storage::StorageError;

/// Errors returned by the account and task services.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Input was rejected before touching storage.
    #[error("Validation failed: {message}")]
    Validation {
        /// Which rule was violated.
        message: String,
    },

    /// The requestor does not own the resource.
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Description of the denied access.
        message: String,
    },

    /// Propagated unchanged from the storage layer.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ServiceError {
    /// Creates a new `Validation` error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a new `Forbidden` error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Classifies the error for mapping to a response.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::Storage(e) if e.is_not_found() => ErrorKind::NotFound,
            Self::Storage(e) if e.is_conflict() => ErrorKind::Conflict,
            Self::Storage(_) => ErrorKind::Infrastructure,
        }
    }

    /// Returns `true` if the error is the caller's fault.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.kind() != ErrorKind::Infrastructure
    }
}

/// Business classification of a [`ServiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Forbidden,
    NotFound,
    Conflict,
    Infrastructure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Forbidden => write!(f, "forbidden"),
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Infrastructure => write!(f, "infrastructure"),
        }
    }
}
