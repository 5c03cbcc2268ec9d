//! # taskhub-auth
//!
//! Authentication building blocks for the TaskHub server.
//!
//! ## Modules
//!
//! - [`config`] - Token and password configuration
//! - [`password`] - Argon2id password hashing and verification
//! - [`token`] - JWT issuance and validation
//! - [`middleware`] - Axum extractor that authenticates bearer tokens
//! - [`error`] - Authentication error types

pub mod config;
pub mod error;
pub mod middleware;
pub mod password;
pub mod token;

pub use config::{AuthConfig, ConfigError};
pub use error::AuthError;
pub use middleware::{AuthState, BearerAuth, Principal};
pub use password::PasswordCodec;
pub use token::{Claims, JwtError, JwtService, SigningAlgorithm, TokenKind};

/// Type alias for authentication results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Role assigned to every account.
pub const DEFAULT_ROLE: &str = "user";
