//! Storage error types shared by all backends.

use uuid::Uuid;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No account matches the given key.
    #[error("account not found: {key}")]
    AccountNotFound {
        /// The id or email that was looked up.
        key: String,
    },

    /// Another account already uses this email.
    #[error("email already taken: {email}")]
    EmailTaken {
        /// The conflicting email.
        email: String,
    },

    /// No task has the given id.
    #[error("task not found: {id}")]
    TaskNotFound {
        /// The id that was looked up.
        id: Uuid,
    },

    /// The database backend failed.
    #[error("database error: {message}")]
    Database {
        /// Backend error message.
        message: String,
    },

    /// A stored record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other storage failure.
    #[error("internal storage error: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
    },
}

impl StorageError {
    /// Creates an `AccountNotFound` error keyed by id.
    #[must_use]
    pub fn account_not_found(id: Uuid) -> Self {
        Self::AccountNotFound {
            key: id.to_string(),
        }
    }

    /// Creates an `AccountNotFound` error keyed by email.
    #[must_use]
    pub fn account_email_not_found(email: impl Into<String>) -> Self {
        Self::AccountNotFound { key: email.into() }
    }

    /// Creates an `EmailTaken` error.
    #[must_use]
    pub fn email_taken(email: impl Into<String>) -> Self {
        Self::EmailTaken {
            email: email.into(),
        }
    }

    /// Creates a `TaskNotFound` error.
    #[must_use]
    pub fn task_not_found(id: Uuid) -> Self {
        Self::TaskNotFound { id }
    }

    /// Creates a `Database` error.
    #[must_use]
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Creates an `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` for either not-found variant.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::AccountNotFound { .. } | Self::TaskNotFound { .. }
        )
    }

    /// Returns `true` if this is an account not-found error.
    #[must_use]
    pub fn is_account_not_found(&self) -> bool {
        matches!(self, Self::AccountNotFound { .. })
    }

    /// Returns `true` if this is a task not-found error.
    #[must_use]
    pub fn is_task_not_found(&self) -> bool {
        matches!(self, Self::TaskNotFound { .. })
    }

    /// Returns `true` if the error is a uniqueness conflict.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::EmailTaken { .. })
    }
}
