//! Input validators applied before anything reaches storage.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ServiceError;

/// Minimum password length for registration and login.
pub const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").expect("Invalid email regex")
});

/// Checks that `email` looks like `local@domain.tld`.
///
/// # Errors
///
/// Returns `ServiceError::Validation` otherwise.
pub fn validate_email(email: &str) -> Result<(), ServiceError> {
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(ServiceError::validation("invalid email format"))
    }
}

/// Password rules for new accounts: minimum length plus at least one
/// lowercase letter, uppercase letter, digit and symbol.
///
/// # Errors
///
/// Returns `ServiceError::Validation` naming the first rule that fails.
pub fn validate_password(password: &str) -> Result<(), ServiceError> {
    validate_password_length(password)?;

    if !password.chars().any(char::is_lowercase) {
        return Err(ServiceError::validation(
            "password must have at least one lowercase letter",
        ));
    }
    if !password.chars().any(char::is_uppercase) {
        return Err(ServiceError::validation(
            "password must have at least one uppercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ServiceError::validation(
            "password must have at least one number",
        ));
    }
    if !password
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace())
    {
        return Err(ServiceError::validation(
            "password must have at least one symbol",
        ));
    }
    Ok(())
}

/// Length-only check used at login.
///
/// # Errors
///
/// Returns `ServiceError::Validation` if the password is too short.
pub fn validate_password_length(password: &str) -> Result<(), ServiceError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ServiceError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Titles must contain something other than whitespace.
///
/// # Errors
///
/// Returns `ServiceError::Validation` for a blank title.
pub fn validate_title(title: &str) -> Result<(), ServiceError> {
    if title.trim().is_empty() {
        return Err(ServiceError::validation("title cannot be empty"));
    }
    Ok(())
}
