//! Input validation for registration and login.
//!
//! This module provides validation functions for display names, emails,
//! and passwords, plus email normalization.

use thiserror::Error;

use super::password::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};

/// Maximum display name length.
pub const MAX_NAME_LENGTH: usize = 50;

/// Maximum email length.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("Please add all fields")]
    MissingFields,

    /// Name is too long.
    #[error("name must be at most {MAX_NAME_LENGTH} characters")]
    NameTooLong,

    /// Name contains control characters.
    #[error("name contains invalid characters")]
    NameInvalidChars,

    /// Email is too long.
    #[error("email must be at most {MAX_EMAIL_LENGTH} characters")]
    EmailTooLong,

    /// Email format is invalid.
    #[error("invalid email format")]
    EmailInvalidFormat,

    /// Password is too short.
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    PasswordTooShort,

    /// Password is too long.
    #[error("password must be at most {MAX_PASSWORD_LENGTH} characters")]
    PasswordTooLong,
}

/// Trim and lowercase an email for storage and lookup.
///
/// # Examples
///
/// ```
/// use minidrive::auth::validation::normalize_email;
///
/// assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
/// ```
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate a display name.
///
/// Requirements:
/// - Not blank
/// - At most 50 characters
/// - No control characters
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingFields);
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::NameTooLong);
    }
    if name.chars().any(|c| c.is_control()) {
        return Err(ValidationError::NameInvalidChars);
    }
    Ok(())
}

/// Validate an (already normalized) email address.
///
/// # Examples
///
/// ```
/// use minidrive::auth::validation::validate_email;
///
/// assert!(validate_email("user@example.com").is_ok());
/// assert!(validate_email("invalid").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::MissingFields);
    }
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::EmailTooLong);
    }
    if email.chars().any(|c| c.is_whitespace()) {
        return Err(ValidationError::EmailInvalidFormat);
    }

    // One @, a non-empty local part, a dotted domain.
    let (local, domain) = email
        .split_once('@')
        .ok_or(ValidationError::EmailInvalidFormat)?;
    if local.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(ValidationError::EmailInvalidFormat);
    }
    if domain.split('.').any(|p| p.is_empty()) {
        return Err(ValidationError::EmailInvalidFormat);
    }

    Ok(())
}

/// Validate a password chosen at registration.
pub fn validate_registration_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::MissingFields);
    }
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooLong);
    }
    Ok(())
}

/// Validate all registration fields at once.
///
/// `email` must already be normalized. Returns the first error encountered.
pub fn validate_registration(
    name: &str,
    email: &str,
    password: &str,
) -> Result<(), ValidationError> {
    if name.trim().is_empty() || email.is_empty() || password.is_empty() {
        return Err(ValidationError::MissingFields);
    }
    validate_name(name)?;
    validate_email(email)?;
    validate_registration_password(password)?;
    Ok(())
}
