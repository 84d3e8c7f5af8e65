//! Request DTOs for Web API.
//!
//! Missing fields deserialize to empty strings so the workflows can report
//! them with a single message.

use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use super::validation::no_control_chars;

/// Registration request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// Display name.
    #[serde(default)]
    #[validate(custom(function = "no_control_chars"))]
    pub name: String,
    /// Email.
    #[serde(default)]
    #[validate(custom(function = "no_control_chars"))]
    pub email: String,
    /// Password.
    #[serde(default)]
    pub password: String,
}

/// Login request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// Email.
    #[serde(default)]
    #[validate(custom(function = "no_control_chars"))]
    pub email: String,
    /// Password.
    #[serde(default)]
    pub password: String,
}

/// Role change request.
///
/// The value is checked by the authorization rules, after the caller's role.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateRoleRequest {
    /// `"user"` or `"admin"`.
    #[serde(default)]
    pub role: String,
}

/// Query string of the inline view route.
#[derive(Debug, Default, Deserialize)]
pub struct ViewTokenQuery {
    /// Session token, for clients that cannot set headers.
    pub token: Option<String>,
}
