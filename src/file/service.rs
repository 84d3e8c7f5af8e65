//! File service for minidrive.
//!
//! This module provides the file workflows:
//! - Upload with size and format checks before any provider call
//! - Listing scoped to the caller, or platform-wide for administrators
//! - Streaming for inline view or download with access control
//! - Deletion of the blob, then the record

use std::time::Duration;

use bytes::Bytes;
use tracing::{info, warn};

use crate::auth::{enforce, Action, Caller};
use crate::blob::{self, BlobStore, BlobStream, ResourceKind};
use crate::db::Database;
use crate::{DriveError, Result};

use super::media;
use super::record::{FileRecord, FileRepository, FileWithOwner, NewFileRecord};
use super::MAX_FILENAME_LENGTH;

/// Request data for file upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Original file name as sent by the client.
    pub file_name: String,
    /// Declared MIME type.
    pub content_type: String,
    /// File content.
    pub content: Bytes,
}

impl UploadRequest {
    /// Create a new upload request.
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            content: content.into(),
        }
    }
}

/// How a file is being opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Displayed in the browser.
    View,
    /// Saved as an attachment.
    Download,
}

/// A record with a stream over its content.
pub struct OpenedFile {
    /// The record.
    pub record: FileRecord,
    /// Content stream.
    pub stream: BlobStream,
}

/// File service coordinating the registry, the blob store and the policy.
pub struct FileService<'a> {
    db: &'a Database,
    blobs: &'a dyn BlobStore,
    timeout: Duration,
}

impl<'a> FileService<'a> {
    /// Create a new FileService.
    pub fn new(db: &'a Database, blobs: &'a dyn BlobStore, timeout: Duration) -> Self {
        Self { db, blobs, timeout }
    }

    fn repo(&self) -> FileRepository<'_> {
        FileRepository::new(self.db.pool())
    }

    /// Upload a file owned by the caller.
    ///
    /// # Validation
    /// - File name: non-empty, at most 255 characters
    /// - Size: 1 byte to 5 MiB
    /// - Format: one of the accepted extensions, with a matching type
    ///
    /// # Returns
    /// The created record.
    pub async fn upload(&self, caller: &Caller, request: UploadRequest) -> Result<FileRecord> {
        let file_name = sanitize_file_name(&request.file_name);
        if file_name.is_empty() {
            return Err(DriveError::Validation("Please upload a file".to_string()));
        }
        if file_name.chars().count() > MAX_FILENAME_LENGTH {
            return Err(DriveError::Validation(format!(
                "file name must be at most {MAX_FILENAME_LENGTH} characters"
            )));
        }

        let size = request.content.len() as u64;
        enforce(
            caller,
            &Action::UploadFile {
                size,
                content_type: &request.content_type,
                file_name: &file_name,
            },
        )?;

        let content_type = media::resolve_content_type(&request.content_type, &file_name)
            .ok_or_else(|| DriveError::Validation("File type not allowed".to_string()))?;

        let blob = blob::with_timeout(
            self.timeout,
            self.blobs.put(request.content, &file_name, content_type),
        )
        .await
        .map_err(|e| {
            warn!(user_id = caller.id, error = %e, "blob upload failed");
            DriveError::from(e)
        })?;

        let new_file = NewFileRecord {
            owner_id: caller.id,
            file_name,
            blob: blob.clone(),
            content_type: content_type.to_string(),
            size: size as i64,
        };

        let record = match self.repo().create(&new_file).await {
            Ok(record) => record,
            Err(e) => {
                // Do not leave an unreferenced blob behind.
                let kind = ResourceKind::from_content_type(content_type);
                if let Err(cleanup) =
                    blob::with_timeout(self.timeout, self.blobs.delete(&blob.blob_id, kind)).await
                {
                    warn!(blob_id = %blob.blob_id, error = %cleanup, "orphaned blob after failed insert");
                }
                return Err(e);
            }
        };

        info!(
            user_id = caller.id,
            file_id = record.id,
            blob_id = %record.blob_id,
            size = record.size,
            "file uploaded"
        );
        Ok(record)
    }

    /// List the caller's files, newest first.
    pub async fn list_own(&self, caller: &Caller) -> Result<Vec<FileRecord>> {
        enforce(caller, &Action::ListOwnFiles)?;
        self.repo().list_by_owner(caller.id).await
    }

    /// List every file with its owner, newest first. Administrators only.
    pub async fn list_all(&self, caller: &Caller) -> Result<Vec<FileWithOwner>> {
        enforce(caller, &Action::ListAllFiles)?;
        self.repo().list_all_with_owner().await
    }

    /// Fetch a record the caller may read.
    pub async fn get(&self, caller: &Caller, file_id: i64) -> Result<FileRecord> {
        let record = self.find(file_id).await?;
        enforce(caller, &Action::ReadFile(&record))?;
        Ok(record)
    }

    /// Open a file's content for viewing or download.
    pub async fn open(&self, caller: &Caller, file_id: i64, mode: OpenMode) -> Result<OpenedFile> {
        let record = self.find(file_id).await?;
        let action = match mode {
            OpenMode::View => Action::ViewFile(&record),
            OpenMode::Download => Action::DownloadFile(&record),
        };
        enforce(caller, &action)?;

        let stream = blob::with_timeout(self.timeout, self.blobs.fetch(&record.blob_ref()))
            .await
            .map_err(|e| {
                warn!(file_id = record.id, blob_id = %record.blob_id, error = %e, "blob fetch failed");
                DriveError::from(e)
            })?;

        Ok(OpenedFile { record, stream })
    }

    /// Delete a file: the blob first, then the record.
    ///
    /// If the provider fails or times out the record is kept and the error
    /// is returned, so the file stays listed and the delete can be retried.
    pub async fn delete(&self, caller: &Caller, file_id: i64) -> Result<()> {
        let record = self.find(file_id).await?;
        enforce(caller, &Action::DeleteFile(&record))?;

        let kind = ResourceKind::from_content_type(&record.content_type);
        blob::with_timeout(self.timeout, self.blobs.delete(&record.blob_id, kind))
            .await
            .map_err(|e| {
                warn!(file_id = record.id, blob_id = %record.blob_id, error = %e, "blob delete failed; record kept");
                DriveError::from(e)
            })?;

        self.repo().delete(record.id).await?;
        info!(user_id = caller.id, file_id = record.id, "file deleted");
        Ok(())
    }

    async fn find(&self, file_id: i64) -> Result<FileRecord> {
        self.repo()
            .get_by_id(file_id)
            .await?
            .ok_or_else(|| DriveError::NotFound("File".to_string()))
    }
}

/// Keep only the final path component of a client-supplied file name.
fn sanitize_file_name(name: &str) -> String {
    name.rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}
