//! Error response handling for authentication middleware.

use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::AuthError;

// =============================================================================
// IntoResponse Implementation
// =============================================================================

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::UNAUTHORIZED
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let message = if self.is_server_error() {
            tracing::error!(error = %self, "Authentication failed internally");
            "internal server error"
        } else {
            self.message()
        };

        let mut headers = HeaderMap::new();
        if status == StatusCode::UNAUTHORIZED {
            let www_auth = build_www_authenticate_header(self.code(), message);
            if let Ok(value) = HeaderValue::from_str(&www_auth) {
                headers.insert(header::WWW_AUTHENTICATE, value);
            }
        }

        (status, headers, Json(error_body(self.code(), message))).into_response()
    }
}

/// Builds the WWW-Authenticate header value (RFC 6750).
fn build_www_authenticate_header(error: &str, description: &str) -> String {
    let escaped_desc = description.replace('\"', "\\\"");
    format!("Bearer realm=\"taskhub\", error=\"{error}\", error_description=\"{escaped_desc}\"")
}

/// JSON body shared by every error response.
#[must_use]
pub fn error_body(code: &str, message: &str) -> serde_json::Value {
    json!({
        "error": {
            "code": code,
            "message": message,
        }
    })
}
