//! Platform statistics.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{enforce, Action, Caller};
use crate::datetime;
use crate::db::{Database, Role, UserRepository};
use crate::file::FileRepository;
use crate::Result;

/// Length of the "recent" window in days.
pub const RECENT_WINDOW_DAYS: i64 = 7;

/// Aggregate counts across the whole platform.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub total_users: i64,
    pub total_admins: i64,
    pub total_regular_users: i64,
    pub total_files: i64,
    /// Sum of all file sizes in bytes.
    pub total_storage: i64,
    /// Users created in the last 7 days.
    pub recent_users: i64,
    /// Files uploaded in the last 7 days.
    pub recent_files: i64,
    /// Files per user rounded to two decimals; 0 with no users.
    pub average_files_per_user: f64,
}

/// Mean files per user, rounded to two decimal places.
///
/// # Examples
///
/// ```
/// use minidrive::admin::average_files_per_user;
///
/// assert_eq!(average_files_per_user(0, 0), 0.0);
/// assert_eq!(average_files_per_user(10, 3), 3.33);
/// ```
pub fn average_files_per_user(total_files: i64, total_users: i64) -> f64 {
    if total_users <= 0 {
        return 0.0;
    }
    let average = total_files as f64 / total_users as f64;
    (average * 100.0).round() / 100.0
}

/// Service computing [`PlatformStats`].
pub struct StatsService<'a> {
    db: &'a Database,
}

impl<'a> StatsService<'a> {
    /// Create a new StatsService.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Compute statistics as of now.
    pub async fn compute(&self, caller: &Caller) -> Result<PlatformStats> {
        self.compute_at(caller, Utc::now()).await
    }

    /// Compute statistics with the recent window ending at `now`.
    pub async fn compute_at(&self, caller: &Caller, now: DateTime<Utc>) -> Result<PlatformStats> {
        enforce(caller, &Action::ViewStats)?;

        let users = UserRepository::new(self.db.pool());
        let files = FileRepository::new(self.db.pool());
        let since = datetime::days_ago(now, RECENT_WINDOW_DAYS);

        let total_users = users.count().await?;
        let total_admins = users.count_by_role(Role::Administrator).await?;
        let total_regular_users = users.count_by_role(Role::Member).await?;
        let total_files = files.count().await?;

        Ok(PlatformStats {
            total_users,
            total_admins,
            total_regular_users,
            total_files,
            total_storage: files.total_size().await?,
            recent_users: users.count_created_since(since).await?,
            recent_files: files.count_created_since(since).await?,
            average_files_per_user: average_files_per_user(total_files, total_users),
        })
    }
}
