//! Administration module for minidrive.
//!
//! This module provides administrative functionality:
//! - User management (list with usage, change role, delete with cascade)
//! - Platform statistics
//!
//! Every operation asks [`crate::auth::authorize`] first; only
//! administrators get past it.

mod stats;
mod user;

pub use stats::{average_files_per_user, PlatformStats, StatsService, RECENT_WINDOW_DAYS};
pub use user::UserAdminService;
