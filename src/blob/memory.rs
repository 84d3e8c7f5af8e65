//! In-process blob backend.
//!
//! Keeps blobs in a map and counts calls so tests can assert on what reached
//! the provider. Failures can be injected per operation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use super::{BlobError, BlobRef, BlobStore, BlobStream, ResourceKind};

#[derive(Debug, Clone)]
struct StoredBlob {
    content: Bytes,
    content_type: String,
}

/// Blob store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, StoredBlob>>,
    puts: AtomicUsize,
    deletes: AtomicUsize,
    fail_puts: AtomicBool,
    fail_deletes: AtomicBool,
    fail_fetches: AtomicBool,
    stall_deletes: AtomicBool,
}

impl MemoryBlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `put` calls received, successful or not.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Number of `delete` calls received, successful or not.
    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    /// Number of blobs currently held.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the store holds no blobs.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a blob id is currently held.
    pub fn contains(&self, blob_id: &str) -> bool {
        self.lock().contains_key(blob_id)
    }

    /// Make every `put` fail.
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Make every `delete` fail.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Make every `fetch` fail.
    pub fn fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    /// Make every `delete` hang long enough to trip a caller's timeout.
    pub fn stall_deletes(&self, stall: bool) {
        self.stall_deletes.store(stall, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, StoredBlob>> {
        // A poisoned map is still structurally valid.
        self.blobs.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        bytes: Bytes,
        _file_name: &str,
        content_type: &str,
    ) -> Result<BlobRef, BlobError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(BlobError::Provider("injected put failure".to_string()));
        }

        let blob_id = format!("mem-{}", Uuid::new_v4());
        self.lock().insert(
            blob_id.clone(),
            StoredBlob {
                content: bytes,
                content_type: content_type.to_string(),
            },
        );

        Ok(BlobRef {
            url: format!("memory://{blob_id}"),
            blob_id,
        })
    }

    async fn delete(&self, blob_id: &str, _kind: ResourceKind) -> Result<(), BlobError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.stall_deletes.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(BlobError::Provider("injected delete failure".to_string()));
        }

        self.lock().remove(blob_id);
        Ok(())
    }

    async fn fetch(&self, blob: &BlobRef) -> Result<BlobStream, BlobError> {
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(BlobError::Provider("injected fetch failure".to_string()));
        }

        let stored = self
            .lock()
            .get(&blob.blob_id)
            .cloned()
            .ok_or(BlobError::NotFound)?;

        tracing::trace!(
            blob_id = %blob.blob_id,
            content_type = %stored.content_type,
            "serving blob from memory"
        );
        Ok(Box::pin(futures::stream::once(async move {
            Ok(stored.content)
        })))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn test_put_fetch_delete() {
        let store = MemoryBlobStore::new();
        let blob = store
            .put(Bytes::from_static(b"abc"), "a.txt", "text/plain")
            .await
            .unwrap();
        assert_eq!(store.put_count(), 1);
        assert!(store.contains(&blob.blob_id));

        let chunks: Vec<Bytes> = store.fetch(&blob).await.unwrap().try_collect().await.unwrap();
        assert_eq!(chunks.concat(), b"abc");

        store.delete(&blob.blob_id, ResourceKind::Raw).await.unwrap();
        assert!(store.is_empty());
        assert_eq!(store.delete_count(), 1);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = MemoryBlobStore::new();
        store.fail_puts(true);
        assert!(store
            .put(Bytes::from_static(b"x"), "a.txt", "text/plain")
            .await
            .is_err());
        assert_eq!(store.put_count(), 1);
        assert!(store.is_empty());

        store.fail_puts(false);
        let blob = store
            .put(Bytes::from_static(b"x"), "a.txt", "text/plain")
            .await
            .unwrap();

        store.fail_deletes(true);
        assert!(store.delete(&blob.blob_id, ResourceKind::Raw).await.is_err());
        assert!(store.contains(&blob.blob_id));

        store.fail_fetches(true);
        assert!(store.fetch(&blob).await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_missing() {
        let store = MemoryBlobStore::new();
        let missing = BlobRef {
            blob_id: "nope".to_string(),
            url: String::new(),
        };
        assert!(matches!(store.fetch(&missing).await, Err(BlobError::NotFound)));
    }
}
