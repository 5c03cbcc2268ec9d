//! Authentication error types.

use crate::token::JwtError;

/// Errors raised while authenticating a request or building the token authority.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The bearer token is malformed, badly signed, expired or uses the wrong algorithm.
    #[error("Invalid token: {message}")]
    InvalidToken {
        /// Description of why the token is invalid.
        message: String,
    },

    /// The request carries no usable credentials.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Description of why the request is unauthorized.
        message: String,
    },

    /// Key material or settings are unusable.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// Signing or hashing failed for reasons outside the caller's control.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `InvalidToken` error.
    #[must_use]
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }

    /// Creates a new `Unauthorized` error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if the caller failed to authenticate.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidToken { .. } | Self::Unauthorized { .. })
    }

    /// Returns `true` if this is a server-side failure.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::Internal { .. })
    }

    /// Short machine-readable code for responses and logs.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidToken { .. } => "invalid_token",
            Self::Unauthorized { .. } => "unauthorized",
            Self::Configuration { .. } | Self::Internal { .. } => "internal_error",
        }
    }

    /// The message without the variant prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidToken { message }
            | Self::Unauthorized { message }
            | Self::Configuration { message }
            | Self::Internal { message } => message,
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        if err.is_key_error() {
            Self::configuration(err.to_string())
        } else if matches!(err, JwtError::EncodingError { .. }) {
            Self::internal(err.to_string())
        } else {
            Self::invalid_token(err.to_string())
        }
    }
}
