//! minidrive - multi-tenant file storage
//!
//! Users register, upload files and manage the files they own.
//! Administrators see every file and user, change roles, remove users
//! together with their files, and read platform statistics. File bytes live
//! in a pluggable blob store; metadata and accounts live in SQLite.
//!
//! ```
//! let hash = minidrive::hash_password("secret1").unwrap();
//! assert!(minidrive::verify_password("secret1", &hash).is_ok());
//! ```

pub mod admin;
pub mod auth;
pub mod blob;
pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;
pub mod web;

pub use auth::{hash_password, verify_password};
pub use config::Config;
pub use db::{Database, Role, User};
pub use error::{DriveError, Result};
