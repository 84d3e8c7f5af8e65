//! User management for administrators.
//!
//! - List users with their storage usage
//! - Change a user's role
//! - Delete a user together with their files

use std::time::Duration;

use tracing::{info, warn};

use crate::auth::{enforce, Action, Caller};
use crate::blob::{self, BlobStore, ResourceKind};
use crate::db::{Database, Role, User, UserRepository, UserUsage};
use crate::file::FileRepository;
use crate::{DriveError, Result};

/// Admin service for user management.
pub struct UserAdminService<'a> {
    db: &'a Database,
    blobs: &'a dyn BlobStore,
    timeout: Duration,
}

impl<'a> UserAdminService<'a> {
    /// Create a new UserAdminService.
    pub fn new(db: &'a Database, blobs: &'a dyn BlobStore, timeout: Duration) -> Self {
        Self { db, blobs, timeout }
    }

    /// List every user with file count and total size, newest first.
    pub async fn list_users(&self, caller: &Caller) -> Result<Vec<UserUsage>> {
        enforce(caller, &Action::ListAllUsers)?;
        UserRepository::new(self.db.pool()).list_with_usage().await
    }

    /// Change a user's role.
    ///
    /// `role` is the raw requested value; anything other than `"user"` or
    /// `"admin"` is rejected before the target is looked up.
    pub async fn update_role(&self, caller: &Caller, target_id: i64, role: &str) -> Result<User> {
        enforce(caller, &Action::UpdateRole { target_id, role })?;
        let role: Role = role.parse().map_err(DriveError::Validation)?;

        let user = UserRepository::new(self.db.pool())
            .update_role(target_id, role)
            .await?
            .ok_or_else(|| DriveError::NotFound("User".to_string()))?;

        info!(
            admin_id = caller.id,
            user_id = user.id,
            role = %user.role,
            "user role updated"
        );
        Ok(user)
    }

    /// Delete a user and every file they own.
    ///
    /// Blob deletions are best effort: failures are logged and the cascade
    /// continues. Returns the number of file records removed.
    pub async fn delete_user(&self, caller: &Caller, target_id: i64) -> Result<u64> {
        enforce(caller, &Action::DeleteUser { target_id })?;

        let users = UserRepository::new(self.db.pool());
        let files = FileRepository::new(self.db.pool());

        let target = users
            .get_by_id(target_id)
            .await?
            .ok_or_else(|| DriveError::NotFound("User".to_string()))?;

        for file in files.list_by_owner(target.id).await? {
            let kind = ResourceKind::from_content_type(&file.content_type);
            if let Err(e) =
                blob::with_timeout(self.timeout, self.blobs.delete(&file.blob_id, kind)).await
            {
                warn!(
                    user_id = target.id,
                    file_id = file.id,
                    blob_id = %file.blob_id,
                    error = %e,
                    "blob delete failed during user cascade"
                );
            }
        }

        let deleted_files = files.delete_by_owner(target.id).await?;
        users.delete(target.id).await?;

        info!(
            admin_id = caller.id,
            user_id = target.id,
            deleted_files,
            "user deleted"
        );
        Ok(deleted_files)
    }
}
