//! Bearer token extractor.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::AuthError;
use crate::middleware::types::Principal;
use crate::token::JwtService;

/// State the extractor needs from the application.
#[derive(Clone)]
pub struct AuthState {
    pub jwt_service: Arc<JwtService>,
}

impl AuthState {
    #[must_use]
    pub fn new(jwt_service: Arc<JwtService>) -> Self {
        Self { jwt_service }
    }
}

/// Extracts the token from an `Authorization` header value.
///
/// The header must be exactly `Bearer <token>`: two segments separated by a
/// single space, scheme spelled `Bearer`.
///
/// # Errors
///
/// Returns `AuthError::Unauthorized` when the header is empty or malformed.
pub fn parse_bearer(header: &str) -> Result<&str, AuthError> {
    if header.is_empty() {
        return Err(AuthError::unauthorized("authorization header is empty"));
    }

    let parts: Vec<&str> = header.split(' ').collect();
    match parts.as_slice() {
        ["Bearer", token] if !token.is_empty() => Ok(token),
        _ => Err(AuthError::unauthorized("authorization header is invalid")),
    }
}

/// Axum extractor that authenticates the request.
///
/// Rejects with 401 when the header is missing or malformed or the token
/// fails validation.
///
/// ```ignore
/// async fn handler(BearerAuth(principal): BearerAuth) -> String {
///     principal.user_id.to_string()
/// }
/// ```
pub struct BearerAuth(pub Principal);

impl<S> FromRequestParts<S> for BearerAuth
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let header = match parts.headers.get(AUTHORIZATION) {
            Some(value) => value
                .to_str()
                .map_err(|_| AuthError::unauthorized("authorization header is invalid"))?,
            None => "",
        };
        let token = parse_bearer(header)?;

        let claims = auth_state.jwt_service.validate(token).map_err(|e| {
            tracing::debug!(error = %e, "Failed to validate token");
            AuthError::invalid_token(e.to_string())
        })?;

        let principal = Principal::try_from(claims).map_err(|e| {
            tracing::debug!(error = %e, "Token carries a malformed principal");
            AuthError::invalid_token(e.to_string())
        })?;

        tracing::trace!(user_id = %principal.user_id, kind = %principal.kind, "Request authenticated");
        Ok(Self(principal))
    }
}
