//! API handlers.

pub mod admin;
pub mod file;
pub mod health;
pub mod user;

pub use admin::*;
pub use file::*;
pub use health::*;
pub use user::*;

use std::sync::Arc;
use std::time::Duration;

use crate::admin::{StatsService, UserAdminService};
use crate::auth::TokenService;
use crate::blob::BlobStore;
use crate::db::{Database, UserRepository};
use crate::file::FileService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database pool.
    pub db: Database,
    /// Session token issuer.
    pub tokens: TokenService,
    /// Blob backend.
    pub blobs: Arc<dyn BlobStore>,
    /// Upper bound on each blob call.
    pub blob_timeout: Duration,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        db: Database,
        tokens: TokenService,
        blobs: Arc<dyn BlobStore>,
        blob_timeout: Duration,
    ) -> Self {
        Self {
            db,
            tokens,
            blobs,
            blob_timeout,
        }
    }

    /// Identity store.
    pub fn users(&self) -> UserRepository<'_> {
        UserRepository::new(self.db.pool())
    }

    /// File workflows.
    pub fn files(&self) -> FileService<'_> {
        FileService::new(&self.db, self.blobs.as_ref(), self.blob_timeout)
    }

    /// User administration workflows.
    pub fn user_admin(&self) -> UserAdminService<'_> {
        UserAdminService::new(&self.db, self.blobs.as_ref(), self.blob_timeout)
    }

    /// Platform statistics.
    pub fn stats(&self) -> StatsService<'_> {
        StatsService::new(&self.db)
    }
}
