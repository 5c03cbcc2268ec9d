//! HTTP middleware for authentication.
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use taskhub_auth::middleware::{AuthState, BearerAuth};
//!
//! async fn me(BearerAuth(principal): BearerAuth) -> String {
//!     principal.email
//! }
//!
//! let app = Router::new()
//!     .route("/me", get(me))
//!     .with_state(AuthState::new(jwt_service));
//! ```

pub mod auth;
pub mod error;
pub mod types;

pub use auth::{AuthState, BearerAuth, parse_bearer};
pub use error::error_body;
pub use types::Principal;
