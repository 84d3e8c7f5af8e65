//! Blob storage for minidrive.
//!
//! File bytes never live in the database. A [`BlobStore`] holds them and
//! hands back an opaque [`BlobRef`] that the file registry records.
//!
//! Backends:
//! - [`CloudinaryStore`]: Cloudinary media API over HTTPS
//! - [`LocalBlobStore`]: sharded directory on local disk
//! - [`MemoryBlobStore`]: in-process map, used by tests

mod cloudinary;
mod local;
mod memory;

pub use cloudinary::CloudinaryStore;
pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use thiserror::Error;

use crate::config::{StorageBackend, StorageConfig};

/// Streamed blob content.
pub type BlobStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

/// Errors reported by a blob backend.
#[derive(Error, Debug)]
pub enum BlobError {
    /// The blob does not exist at the provider.
    #[error("blob not found")]
    NotFound,

    /// The provider did not answer within the configured timeout.
    #[error("blob provider timed out")]
    Timeout,

    /// The provider rejected the request or returned an unexpected answer.
    #[error("blob provider error: {0}")]
    Provider(String),

    /// Local I/O failure.
    #[error("blob I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Handle to a stored blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobRef {
    /// Provider-assigned identifier.
    pub blob_id: String,
    /// Provider URL the content can be fetched from.
    pub url: String,
}

/// Provider resource class, derived from the declared content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// `image/*`
    Image,
    /// `video/*`
    Video,
    /// Everything else.
    Raw,
}

impl ResourceKind {
    /// Classify a MIME type.
    pub fn from_content_type(content_type: &str) -> Self {
        if content_type.starts_with("image/") {
            ResourceKind::Image
        } else if content_type.starts_with("video/") {
            ResourceKind::Video
        } else {
            ResourceKind::Raw
        }
    }

    /// Provider path segment for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Image => "image",
            ResourceKind::Video => "video",
            ResourceKind::Raw => "raw",
        }
    }
}

/// A backend holding file bytes.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes and return the handle the registry should record.
    async fn put(
        &self,
        bytes: Bytes,
        file_name: &str,
        content_type: &str,
    ) -> Result<BlobRef, BlobError>;

    /// Remove a blob. A blob that is already gone counts as removed.
    async fn delete(&self, blob_id: &str, kind: ResourceKind) -> Result<(), BlobError>;

    /// Open a stream over a blob's content.
    async fn fetch(&self, blob: &BlobRef) -> Result<BlobStream, BlobError>;

    /// Backend name for logging.
    fn name(&self) -> &'static str;
}

/// Run a blob call with an upper bound on its duration.
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, BlobError>
where
    F: Future<Output = Result<T, BlobError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(BlobError::Timeout),
    }
}

/// Build the configured backend.
pub fn from_config(config: &StorageConfig) -> crate::Result<Arc<dyn BlobStore>> {
    let store: Arc<dyn BlobStore> = match config.backend {
        StorageBackend::Local => Arc::new(LocalBlobStore::new(&config.local_path)?),
        StorageBackend::Cloudinary => Arc::new(CloudinaryStore::new(
            config.cloudinary.clone(),
            Duration::from_secs(config.timeout_secs),
        )?),
    };
    Ok(store)
}
