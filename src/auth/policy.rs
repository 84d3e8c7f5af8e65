//! Authorization rules.
//!
//! Every decision about who may touch which record is made by [`authorize`].
//! Workflows build an [`Action`] naming the resource, ask for a [`Decision`],
//! and perform the effect only on `Allow`.

use std::fmt;

use crate::db::{Role, User};
use crate::file::media::{self, MAX_UPLOAD_BYTES};
use crate::file::FileRecord;
use crate::DriveError;

/// The authenticated identity making a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    /// User ID.
    pub id: i64,
    /// Role as currently stored.
    pub role: Role,
}

impl Caller {
    /// Build a caller from a stored user.
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            role: user.role,
        }
    }

    /// Whether the caller is an administrator.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    fn owns(&self, file: &FileRecord) -> bool {
        file.owner_id == self.id
    }
}

/// An operation together with the resource it targets.
#[derive(Debug, Clone, Copy)]
pub enum Action<'a> {
    /// Read a record's metadata.
    ReadFile(&'a FileRecord),
    /// Stream a file for inline display.
    ViewFile(&'a FileRecord),
    /// Stream a file as an attachment.
    DownloadFile(&'a FileRecord),
    /// Delete a file and its blob.
    DeleteFile(&'a FileRecord),
    /// Upload a new file owned by the caller.
    UploadFile {
        /// Payload size in bytes.
        size: u64,
        /// Declared MIME type.
        content_type: &'a str,
        /// Original file name.
        file_name: &'a str,
    },
    /// List the caller's own files.
    ListOwnFiles,
    /// List every file on the platform.
    ListAllFiles,
    /// List every user.
    ListAllUsers,
    /// Read platform statistics.
    ViewStats,
    /// Change a user's role. `role` is the raw requested value.
    UpdateRole {
        /// User whose role changes.
        target_id: i64,
        /// Requested role string.
        role: &'a str,
    },
    /// Delete a user and everything they own.
    DeleteUser {
        /// User to delete.
        target_id: i64,
    },
}

impl Action<'_> {
    fn forbidden_message(&self) -> &'static str {
        match self {
            Action::ReadFile(_) | Action::ViewFile(_) | Action::DownloadFile(_) => {
                "Not authorized to access this file"
            }
            Action::DeleteFile(_) => "Not authorized to delete this file",
            Action::UploadFile { .. } | Action::ListOwnFiles => "Not authorized",
            Action::ListAllFiles
            | Action::ListAllUsers
            | Action::ViewStats
            | Action::UpdateRole { .. }
            | Action::DeleteUser { .. } => "Not authorized as an admin",
        }
    }
}

/// Why an action was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The caller lacks ownership or the administrator role.
    Forbidden,
    /// An administrator tried to demote themselves.
    SelfDemotionForbidden,
    /// An administrator tried to delete themselves.
    SelfDeletionForbidden,
    /// The requested role is not `user` or `admin`.
    InvalidRole,
    /// The upload exceeds the size limit.
    FileTooLarge,
    /// The upload's format is not accepted.
    UnsupportedMediaType,
    /// The upload carries no bytes.
    EmptyUpload,
}

/// Outcome of [`authorize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Proceed with the effect.
    Allow,
    /// Refuse with a reason.
    Deny(DenyReason),
}

/// A refused action, ready to surface to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Denied {
    /// Machine-readable reason.
    pub reason: DenyReason,
    /// Client-facing message.
    pub message: &'static str,
}

impl fmt::Display for Denied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message)
    }
}

impl std::error::Error for Denied {}

impl From<Denied> for DriveError {
    fn from(denied: Denied) -> Self {
        match denied.reason {
            DenyReason::Forbidden => DriveError::Permission(denied.message.to_string()),
            _ => DriveError::Validation(denied.message.to_string()),
        }
    }
}

/// Decide whether `caller` may perform `action`.
pub fn authorize(caller: &Caller, action: &Action<'_>) -> Decision {
    use Decision::{Allow, Deny};

    match *action {
        Action::ReadFile(file)
        | Action::ViewFile(file)
        | Action::DownloadFile(file)
        | Action::DeleteFile(file) => {
            if caller.owns(file) || caller.is_admin() {
                Allow
            } else {
                Deny(DenyReason::Forbidden)
            }
        }

        Action::UploadFile {
            size,
            content_type,
            file_name,
        } => {
            if size == 0 {
                Deny(DenyReason::EmptyUpload)
            } else if size > MAX_UPLOAD_BYTES {
                Deny(DenyReason::FileTooLarge)
            } else if media::resolve_content_type(content_type, file_name).is_none() {
                Deny(DenyReason::UnsupportedMediaType)
            } else {
                Allow
            }
        }

        Action::ListOwnFiles => Allow,

        Action::ListAllFiles | Action::ListAllUsers | Action::ViewStats => {
            if caller.is_admin() {
                Allow
            } else {
                Deny(DenyReason::Forbidden)
            }
        }

        Action::UpdateRole { target_id, role } => {
            if !caller.is_admin() {
                return Deny(DenyReason::Forbidden);
            }
            match role.parse::<Role>() {
                Err(_) => Deny(DenyReason::InvalidRole),
                Ok(Role::Member) if target_id == caller.id => {
                    Deny(DenyReason::SelfDemotionForbidden)
                }
                Ok(_) => Allow,
            }
        }

        Action::DeleteUser { target_id } => {
            if !caller.is_admin() {
                Deny(DenyReason::Forbidden)
            } else if target_id == caller.id {
                Deny(DenyReason::SelfDeletionForbidden)
            } else {
                Allow
            }
        }
    }
}

/// [`authorize`], converted to a `Result` carrying the client message.
pub fn enforce(caller: &Caller, action: &Action<'_>) -> Result<(), Denied> {
    match authorize(caller, action) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => Err(Denied {
            reason,
            message: match reason {
                DenyReason::Forbidden => action.forbidden_message(),
                DenyReason::SelfDemotionForbidden => "You cannot demote yourself",
                DenyReason::SelfDeletionForbidden => "You cannot delete yourself",
                DenyReason::InvalidRole => "Invalid role. Must be \"user\" or \"admin\"",
                DenyReason::FileTooLarge => "File too large. Maximum size is 5MB",
                DenyReason::UnsupportedMediaType => "File type not allowed",
                DenyReason::EmptyUpload => "Please upload a file",
            },
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const MEMBER: Caller = Caller {
        id: 1,
        role: Role::Member,
    };
    const OTHER: Caller = Caller {
        id: 2,
        role: Role::Member,
    };
    const ADMIN: Caller = Caller {
        id: 10,
        role: Role::Administrator,
    };

    fn file_owned_by(owner_id: i64) -> FileRecord {
        FileRecord {
            id: 100,
            owner_id,
            file_name: "a.pdf".to_string(),
            blob_id: "blob".to_string(),
            blob_url: "memory://blob".to_string(),
            content_type: "application/pdf".to_string(),
            size: 10,
            created_at: Utc::now(),
        }
    }

    fn upload(size: u64, content_type: &'static str, file_name: &'static str) -> Action<'static> {
        Action::UploadFile {
            size,
            content_type,
            file_name,
        }
    }

    #[test]
    fn test_file_access_iff_owner_or_admin() {
        let file = file_owned_by(MEMBER.id);
        let actions = [
            Action::ReadFile(&file),
            Action::ViewFile(&file),
            Action::DownloadFile(&file),
            Action::DeleteFile(&file),
        ];

        for action in &actions {
            assert_eq!(authorize(&MEMBER, action), Decision::Allow);
            assert_eq!(authorize(&ADMIN, action), Decision::Allow);
            assert_eq!(
                authorize(&OTHER, action),
                Decision::Deny(DenyReason::Forbidden)
            );
        }
    }

    #[test]
    fn test_file_access_exhaustive_small_domain() {
        let roles = [Role::Member, Role::Administrator];
        for caller_id in 1..=3 {
            for owner_id in 1..=3 {
                for role in roles {
                    let caller = Caller { id: caller_id, role };
                    let file = file_owned_by(owner_id);
                    let expected = caller_id == owner_id || role == Role::Administrator;
                    let decision = authorize(&caller, &Action::ReadFile(&file));
                    assert_eq!(decision == Decision::Allow, expected);
                }
            }
        }
    }

    #[test]
    fn test_admin_only_actions() {
        for action in [Action::ListAllFiles, Action::ListAllUsers, Action::ViewStats] {
            assert_eq!(authorize(&ADMIN, &action), Decision::Allow);
            assert_eq!(
                authorize(&MEMBER, &action),
                Decision::Deny(DenyReason::Forbidden)
            );
        }
    }

    #[test]
    fn test_list_own_files_any_caller() {
        assert_eq!(authorize(&MEMBER, &Action::ListOwnFiles), Decision::Allow);
        assert_eq!(authorize(&ADMIN, &Action::ListOwnFiles), Decision::Allow);
    }

    #[test]
    fn test_upload_limits() {
        assert_eq!(
            authorize(&MEMBER, &upload(1024, "application/pdf", "a.pdf")),
            Decision::Allow
        );
        assert_eq!(
            authorize(&MEMBER, &upload(MAX_UPLOAD_BYTES, "image/png", "a.png")),
            Decision::Allow
        );
        assert_eq!(
            authorize(&MEMBER, &upload(MAX_UPLOAD_BYTES + 1, "image/png", "a.png")),
            Decision::Deny(DenyReason::FileTooLarge)
        );
        assert_eq!(
            authorize(&MEMBER, &upload(0, "image/png", "a.png")),
            Decision::Deny(DenyReason::EmptyUpload)
        );
        assert_eq!(
            authorize(&MEMBER, &upload(10, "application/x-msdownload", "a.exe")),
            Decision::Deny(DenyReason::UnsupportedMediaType)
        );
    }

    #[test]
    fn test_upload_size_checked_before_type() {
        assert_eq!(
            authorize(&MEMBER, &upload(MAX_UPLOAD_BYTES + 1, "text/html", "a.html")),
            Decision::Deny(DenyReason::FileTooLarge)
        );
    }

    #[test]
    fn test_update_role_requires_admin() {
        let action = Action::UpdateRole {
            target_id: OTHER.id,
            role: "admin",
        };
        assert_eq!(
            authorize(&MEMBER, &action),
            Decision::Deny(DenyReason::Forbidden)
        );
        assert_eq!(authorize(&ADMIN, &action), Decision::Allow);
    }

    #[test]
    fn test_update_role_invalid_role() {
        for role in ["superuser", "Admin", "", "member"] {
            let action = Action::UpdateRole {
                target_id: OTHER.id,
                role,
            };
            assert_eq!(
                authorize(&ADMIN, &action),
                Decision::Deny(DenyReason::InvalidRole)
            );
        }
    }

    #[test]
    fn test_self_demotion_always_denied() {
        let action = Action::UpdateRole {
            target_id: ADMIN.id,
            role: "user",
        };
        assert_eq!(
            authorize(&ADMIN, &action),
            Decision::Deny(DenyReason::SelfDemotionForbidden)
        );

        // Re-asserting admin on oneself is harmless.
        let action = Action::UpdateRole {
            target_id: ADMIN.id,
            role: "admin",
        };
        assert_eq!(authorize(&ADMIN, &action), Decision::Allow);
    }

    #[test]
    fn test_invalid_role_reported_before_self_demotion() {
        let action = Action::UpdateRole {
            target_id: ADMIN.id,
            role: "nobody",
        };
        assert_eq!(
            authorize(&ADMIN, &action),
            Decision::Deny(DenyReason::InvalidRole)
        );
    }

    #[test]
    fn test_demoting_another_admin_allowed() {
        let action = Action::UpdateRole {
            target_id: 11,
            role: "user",
        };
        assert_eq!(authorize(&ADMIN, &action), Decision::Allow);
    }

    #[test]
    fn test_delete_user_rules() {
        assert_eq!(
            authorize(&ADMIN, &Action::DeleteUser { target_id: ADMIN.id }),
            Decision::Deny(DenyReason::SelfDeletionForbidden)
        );
        assert_eq!(
            authorize(&ADMIN, &Action::DeleteUser { target_id: MEMBER.id }),
            Decision::Allow
        );
        assert_eq!(
            authorize(&MEMBER, &Action::DeleteUser { target_id: OTHER.id }),
            Decision::Deny(DenyReason::Forbidden)
        );
        // Members cannot delete themselves through this path either.
        assert_eq!(
            authorize(&MEMBER, &Action::DeleteUser { target_id: MEMBER.id }),
            Decision::Deny(DenyReason::Forbidden)
        );
    }

    #[test]
    fn test_enforce_messages() {
        let file = file_owned_by(MEMBER.id);
        let err = enforce(&OTHER, &Action::DeleteFile(&file)).unwrap_err();
        assert_eq!(err.reason, DenyReason::Forbidden);
        assert_eq!(err.message, "Not authorized to delete this file");

        let err = enforce(&OTHER, &Action::ViewFile(&file)).unwrap_err();
        assert_eq!(err.message, "Not authorized to access this file");

        let err = enforce(&MEMBER, &Action::ViewStats).unwrap_err();
        assert_eq!(err.message, "Not authorized as an admin");

        let err = enforce(
            &ADMIN,
            &Action::UpdateRole {
                target_id: ADMIN.id,
                role: "user",
            },
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "You cannot demote yourself");

        assert!(enforce(&ADMIN, &Action::ViewStats).is_ok());
    }

    #[test]
    fn test_denied_maps_to_error_taxonomy() {
        let forbidden: DriveError = Denied {
            reason: DenyReason::Forbidden,
            message: "no",
        }
        .into();
        assert!(matches!(forbidden, DriveError::Permission(_)));

        let invalid: DriveError = Denied {
            reason: DenyReason::InvalidRole,
            message: "bad",
        }
        .into();
        assert!(matches!(invalid, DriveError::Validation(_)));
    }

    #[test]
    fn test_caller_from_user() {
        let user = User {
            id: 5,
            name: "A".to_string(),
            email: "a@example.com".to_string(),
            password: "hash".to_string(),
            role: Role::Administrator,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let caller = Caller::from_user(&user);
        assert_eq!(caller.id, 5);
        assert!(caller.is_admin());
    }
}
