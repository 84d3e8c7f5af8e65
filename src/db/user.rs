//! User model for minidrive.
//!
//! This module defines the User struct and Role enum for identity management.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use crate::datetime;

/// User role.
///
/// Wire and storage form is `"user"` or `"admin"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Role {
    /// Regular account owning its own files.
    #[default]
    #[serde(rename = "user")]
    Member,
    /// Administrator with platform-wide visibility.
    #[serde(rename = "admin")]
    Administrator,
}

impl Role {
    /// Convert role to its wire/database string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "user",
            Role::Administrator => "admin",
        }
    }

    /// Whether this role grants administrator capabilities.
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Administrator)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    /// Parse the exact wire form. Case variants are not accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::Member),
            "admin" => Ok(Role::Administrator),
            _ => Err(format!("unknown role: {s}")),
        }
    }
}

/// A registered account.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Login email (unique, stored lowercase).
    pub email: String,
    /// Password hash (Argon2). Never serialized to clients.
    pub password: String,
    /// Role.
    pub role: Role,
    /// Account creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Check if this user is an administrator.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl<'r> FromRow<'r, SqliteRow> for User {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let role: String = row.try_get("role")?;

        Ok(User {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password: row.try_get("password")?,
            role: role.parse().map_err(|e: String| sqlx::Error::ColumnDecode {
                index: "role".to_string(),
                source: e.into(),
            })?,
            created_at: timestamp_column(row, "created_at")?,
            updated_at: timestamp_column(row, "updated_at")?,
        })
    }
}

/// Decode a fixed-width UTC text column.
pub(crate) fn timestamp_column(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    datetime::from_db(&raw).ok_or_else(|| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: format!("invalid timestamp: {raw}").into(),
    })
}

/// Data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Password hash (should be pre-hashed with Argon2).
    pub password: String,
    /// Role (defaults to Member).
    pub role: Role,
}

impl NewUser {
    /// Create a new member with the given fields.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password_hash.into(),
            role: Role::Member,
        }
    }

    /// Set the role.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}
