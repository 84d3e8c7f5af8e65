//! File management for minidrive.
//!
//! This module provides the file lifecycle:
//! - Accepted formats and the upload size limit
//! - The file registry, mapping records to blobs and owners
//! - Upload, listing, streaming and deletion with access control

pub mod media;
mod record;
mod service;

pub use record::{FileRecord, FileRepository, FileWithOwner, NewFileRecord, OwnerSummary};
pub use service::{FileService, OpenMode, OpenedFile, UploadRequest};

/// Maximum length for file names (in characters).
pub const MAX_FILENAME_LENGTH: usize = 255;
