//! User repository for minidrive.
//!
//! This module provides CRUD operations for users in the database.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::user::{NewUser, Role, User};
use crate::datetime;
use crate::{DriveError, Result};

const USER_COLUMNS: &str = "id, name, email, password, role, created_at, updated_at";

/// A user together with their storage usage.
#[derive(Debug, Clone)]
pub struct UserUsage {
    /// The account.
    pub user: User,
    /// Number of files owned.
    pub file_count: i64,
    /// Sum of owned file sizes in bytes.
    pub total_size: i64,
}

/// Repository for user CRUD operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user in the database.
    ///
    /// Returns `Conflict` when the email is already registered.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let now = datetime::now_db();
        let result = sqlx::query(
            "INSERT INTO users (name, email, password, role, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password)
        .bind(new_user.role.as_str())
        .bind(&now)
        .bind(&now)
        .execute(self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => {
                DriveError::Conflict("User already exists".to_string())
            }
            _ => DriveError::from(e),
        })?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DriveError::NotFound("user".to_string()))
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    /// Get a user by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ? COLLATE NOCASE"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    /// Check if an email is already registered.
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? COLLATE NOCASE)",
        )
        .bind(email)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// List all users, newest first.
    pub async fn list_all(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(users)
    }

    /// List all users with their file count and total stored bytes, newest first.
    pub async fn list_with_usage(&self) -> Result<Vec<UserUsage>> {
        let users = self.list_all().await?;

        let usage: HashMap<i64, (i64, i64)> = sqlx::query_as::<_, (i64, i64, i64)>(
            "SELECT owner_id, COUNT(*), COALESCE(SUM(file_size), 0) FROM files GROUP BY owner_id",
        )
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(|(owner, count, size)| (owner, (count, size)))
        .collect();

        Ok(users
            .into_iter()
            .map(|user| {
                let (file_count, total_size) = usage.get(&user.id).copied().unwrap_or((0, 0));
                UserUsage {
                    user,
                    file_count,
                    total_size,
                }
            })
            .collect())
    }

    /// Set a user's role.
    ///
    /// Returns the updated user, or None if not found.
    pub async fn update_role(&self, id: i64, role: Role) -> Result<Option<User>> {
        let result = sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(datetime::now_db())
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Delete a user by ID.
    ///
    /// Returns true if a user was deleted.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count all users.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Count users with the given role.
    pub async fn count_by_role(&self, role: Role) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = ?")
            .bind(role.as_str())
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Count users created at or after the given instant.
    pub async fn count_created_since(&self, since: DateTime<Utc>) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE created_at >= ?")
            .bind(datetime::to_db(&since))
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
