//! Account registration and login.

use tracing::{info, warn};

use crate::auth::password::{hash_password_blocking, verify_password_blocking};
use crate::auth::validation::{normalize_email, validate_registration};
use crate::db::{NewUser, User, UserRepository};
use crate::{DriveError, Result};

/// Message returned for any login failure.
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Registration request data.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    /// Display name.
    pub name: String,
    /// Email address (normalized during registration).
    pub email: String,
    /// Plain-text password.
    pub password: String,
}

impl RegistrationRequest {
    /// Create a new registration request.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Register a new member.
///
/// This function:
/// 1. Normalizes the email and validates all fields
/// 2. Checks if the email is already registered
/// 3. Hashes the password off the async runtime
/// 4. Creates the user, always as a member
pub async fn register(repo: &UserRepository<'_>, request: RegistrationRequest) -> Result<User> {
    let email = normalize_email(&request.email);
    validate_registration(&request.name, &email, &request.password)
        .map_err(|e| DriveError::Validation(e.to_string()))?;

    if repo.email_exists(&email).await? {
        return Err(DriveError::Conflict("User already exists".to_string()));
    }

    let hash = hash_password_blocking(request.password)
        .await
        .map_err(|e| DriveError::Validation(e.to_string()))?;

    // A concurrent registration can still win the race; the unique index
    // turns that into Conflict as well.
    let user = repo
        .create(&NewUser::new(request.name.trim(), email, hash))
        .await?;

    info!(user_id = user.id, "registered new user");
    Ok(user)
}

/// Authenticate by email and password.
///
/// Unknown email and wrong password fail identically.
pub async fn login(repo: &UserRepository<'_>, email: &str, password: &str) -> Result<User> {
    let email = normalize_email(email);
    if email.is_empty() || password.is_empty() {
        return Err(DriveError::Validation("Please add all fields".to_string()));
    }

    let Some(user) = repo.get_by_email(&email).await? else {
        return Err(DriveError::Auth(INVALID_CREDENTIALS.to_string()));
    };

    if verify_password_blocking(password.to_string(), user.password.clone())
        .await
        .is_err()
    {
        warn!(user_id = user.id, "failed login attempt");
        return Err(DriveError::Auth(INVALID_CREDENTIALS.to_string()));
    }

    info!(user_id = user.id, "user logged in");
    Ok(user)
}
