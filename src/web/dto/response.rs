//! Response DTOs for Web API.
//!
//! Field names are camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::{Role, User, UserUsage};
use crate::file::{FileRecord, FileWithOwner, OwnerSummary};

/// Public view of an account.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[schema(value_type = String, example = "user")]
    pub role: Role,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Account plus a fresh session token, returned by register and login.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    /// Session token for the `Authorization: Bearer` header.
    pub token: String,
}

/// A file record.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileResponse {
    pub id: i64,
    /// Owner id.
    pub user: i64,
    pub file_name: String,
    pub blob_id: String,
    pub blob_url: String,
    pub file_type: String,
    /// Size in bytes.
    pub file_size: i64,
    pub created_at: DateTime<Utc>,
}

impl From<FileRecord> for FileResponse {
    fn from(file: FileRecord) -> Self {
        Self {
            id: file.id,
            user: file.owner_id,
            file_name: file.file_name,
            blob_id: file.blob_id,
            blob_url: file.blob_url,
            file_type: file.content_type,
            file_size: file.size,
            created_at: file.created_at,
        }
    }
}

/// Owner summary embedded in the admin file listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct OwnerResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl From<OwnerSummary> for OwnerResponse {
    fn from(owner: OwnerSummary) -> Self {
        Self {
            id: owner.id,
            name: owner.name,
            email: owner.email,
        }
    }
}

/// A file record with its owner, for the admin listing.
///
/// `user` is replaced by the owner object; it is null if the owner row is gone.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileWithOwnerResponse {
    pub id: i64,
    pub user: Option<OwnerResponse>,
    pub file_name: String,
    pub blob_id: String,
    pub blob_url: String,
    pub file_type: String,
    pub file_size: i64,
    pub created_at: DateTime<Utc>,
}

impl From<FileWithOwner> for FileWithOwnerResponse {
    fn from(entry: FileWithOwner) -> Self {
        let file = entry.file;
        Self {
            id: file.id,
            user: entry.owner.map(OwnerResponse::from),
            file_name: file.file_name,
            blob_id: file.blob_id,
            blob_url: file.blob_url,
            file_type: file.content_type,
            file_size: file.size,
            created_at: file.created_at,
        }
    }
}

/// An account with its storage usage, for the admin user listing.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserUsageResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[schema(value_type = String, example = "user")]
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub file_count: i64,
    /// Sum of file sizes in bytes.
    pub total_size: i64,
}

impl From<UserUsage> for UserUsageResponse {
    fn from(usage: UserUsage) -> Self {
        let user = usage.user;
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
            file_count: usage.file_count,
            total_size: usage.total_size,
        }
    }
}

/// Result of a role change.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoleUpdatedResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub message: String,
}

/// Result of deleting a user.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDeletedResponse {
    pub message: String,
    /// Number of file records removed with the account.
    pub deleted_files: u64,
}

/// A bare confirmation.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    /// Create a new message response.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Health check result.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}
