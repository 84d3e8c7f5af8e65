//! Local disk blob backend.
//!
//! Blobs are stored in a sharded directory structure:
//! ```text
//! {base_path}/
//! ├── ab/
//! │   └── ab12cd34-5678-90ab-cdef-123456789012.pdf
//! ├── cd/
//! │   └── cd90ab12-3456-7890-abcd-ef1234567890.png
//! └── ...
//! ```

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use uuid::Uuid;

use super::{BlobError, BlobRef, BlobStore, BlobStream, ResourceKind};

/// Blob store writing UUID-named files under a base directory.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    base_path: PathBuf,
}

impl LocalBlobStore {
    /// Create a store rooted at `base_path`, creating the directory if needed.
    pub fn new(base_path: impl Into<PathBuf>) -> crate::Result<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    /// Get the base path of this store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Full path for a blob id: `{base_path}/{shard}/{blob_id}`.
    fn blob_path(&self, blob_id: &str) -> Result<PathBuf, BlobError> {
        if !Self::is_valid_id(blob_id) {
            return Err(BlobError::NotFound);
        }
        Ok(self.base_path.join(&blob_id[..2]).join(blob_id))
    }

    /// Blob ids are generated here, so anything with path syntax is foreign.
    fn is_valid_id(blob_id: &str) -> bool {
        blob_id.len() >= 2
            && !blob_id.starts_with('.')
            && !blob_id.contains("..")
            && blob_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
    }

    /// Extract the file extension from a filename, "bin" if none.
    fn extract_extension(filename: &str) -> String {
        Path::new(filename)
            .extension()
            .and_then(|s| s.to_str())
            .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_else(|| "bin".to_string())
    }

    fn url_for(blob_id: &str) -> String {
        format!("local://{blob_id}")
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(
        &self,
        bytes: Bytes,
        file_name: &str,
        _content_type: &str,
    ) -> Result<BlobRef, BlobError> {
        let blob_id = format!("{}.{}", Uuid::new_v4(), Self::extract_extension(file_name));
        let path = self.blob_path(&blob_id)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, &bytes).await?;

        Ok(BlobRef {
            url: Self::url_for(&blob_id),
            blob_id,
        })
    }

    async fn delete(&self, blob_id: &str, _kind: ResourceKind) -> Result<(), BlobError> {
        let path = match self.blob_path(blob_id) {
            Ok(path) => path,
            Err(BlobError::NotFound) => return Ok(()),
            Err(e) => return Err(e),
        };

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn fetch(&self, blob: &BlobRef) -> Result<BlobStream, BlobError> {
        let path = self.blob_path(&blob.blob_id)?;
        let content = match fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(BlobError::NotFound),
            Err(e) => return Err(e.into()),
        };

        Ok(Box::pin(futures::stream::once(async move {
            Ok(Bytes::from(content))
        })))
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
