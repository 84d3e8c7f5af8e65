//! Error types for minidrive.

use thiserror::Error;

/// Common error type for minidrive.
#[derive(Error, Debug)]
pub enum DriveError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error (missing, invalid, or expired credentials).
    #[error("authentication error: {0}")]
    Auth(String),

    /// Permission denied error.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// A unique value is already taken.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// The external blob provider failed or timed out.
    #[error("storage provider error: {0}")]
    Upstream(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for DriveError {
    fn from(e: sqlx::Error) -> Self {
        DriveError::Database(e.to_string())
    }
}

impl From<crate::blob::BlobError> for DriveError {
    fn from(e: crate::blob::BlobError) -> Self {
        DriveError::Upstream(e.to_string())
    }
}

/// Result type alias for minidrive operations.
pub type Result<T> = std::result::Result<T, DriveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_display() {
        let err = DriveError::Auth("invalid password".to_string());
        assert_eq!(err.to_string(), "authentication error: invalid password");
    }

    #[test]
    fn test_permission_error_display() {
        let err = DriveError::Permission("admin access required".to_string());
        assert_eq!(err.to_string(), "permission denied: admin access required");
    }

    #[test]
    fn test_not_found_error_display() {
        let err = DriveError::NotFound("file".to_string());
        assert_eq!(err.to_string(), "file not found");
    }

    #[test]
    fn test_conflict_error_display() {
        let err = DriveError::Conflict("email already registered".to_string());
        assert_eq!(err.to_string(), "conflict: email already registered");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DriveError = io_err.into();
        assert!(matches!(err, DriveError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_blob_error_becomes_upstream() {
        let err: DriveError = crate::blob::BlobError::Timeout.into();
        assert!(matches!(err, DriveError::Upstream(_)));
    }
}
