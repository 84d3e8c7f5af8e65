//! File records and their repository.
//!
//! A record points at a blob and names exactly one owner. The repository
//! enforces no authorization.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use crate::blob::BlobRef;
use crate::datetime;
use crate::db::timestamp_column;
use crate::{DriveError, Result};

const FILE_COLUMNS: &str =
    "id, owner_id, file_name, blob_id, blob_url, file_type, file_size, created_at";

/// Metadata for a stored file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    /// Unique file ID.
    pub id: i64,
    /// Owning user. Never changes.
    pub owner_id: i64,
    /// Original file name.
    pub file_name: String,
    /// Provider blob identifier.
    pub blob_id: String,
    /// Provider URL.
    pub blob_url: String,
    /// MIME type.
    pub content_type: String,
    /// Size in bytes.
    pub size: i64,
    /// Upload timestamp.
    pub created_at: DateTime<Utc>,
}

impl FileRecord {
    /// Blob handle for this record.
    pub fn blob_ref(&self) -> BlobRef {
        BlobRef {
            blob_id: self.blob_id.clone(),
            url: self.blob_url.clone(),
        }
    }
}

impl<'r> FromRow<'r, SqliteRow> for FileRecord {
    fn from_row(row: &'r SqliteRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(FileRecord {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            file_name: row.try_get("file_name")?,
            blob_id: row.try_get("blob_id")?,
            blob_url: row.try_get("blob_url")?,
            content_type: row.try_get("file_type")?,
            size: row.try_get("file_size")?,
            created_at: timestamp_column(row, "created_at")?,
        })
    }
}

/// Owner summary embedded in platform-wide listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerSummary {
    /// User ID.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Email.
    pub email: String,
}

/// A record joined with its owner.
#[derive(Debug, Clone)]
pub struct FileWithOwner {
    /// The record.
    pub file: FileRecord,
    /// The owner, absent if the account row is gone.
    pub owner: Option<OwnerSummary>,
}

impl<'r> FromRow<'r, SqliteRow> for FileWithOwner {
    fn from_row(row: &'r SqliteRow) -> std::result::Result<Self, sqlx::Error> {
        let file = FileRecord::from_row(row)?;
        let name: Option<String> = row.try_get("owner_name")?;
        let email: Option<String> = row.try_get("owner_email")?;
        let owner = match (name, email) {
            (Some(name), Some(email)) => Some(OwnerSummary {
                id: file.owner_id,
                name,
                email,
            }),
            _ => None,
        };
        Ok(FileWithOwner { file, owner })
    }
}

/// Data for creating a new record.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    /// Owning user.
    pub owner_id: i64,
    /// Original file name.
    pub file_name: String,
    /// Blob handle returned by the store.
    pub blob: BlobRef,
    /// MIME type.
    pub content_type: String,
    /// Size in bytes.
    pub size: i64,
}

/// Repository for file record operations.
pub struct FileRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FileRepository<'a> {
    /// Create a new FileRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a record.
    pub async fn create(&self, new_file: &NewFileRecord) -> Result<FileRecord> {
        let result = sqlx::query(
            "INSERT INTO files (owner_id, file_name, blob_id, blob_url, file_type, file_size, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(new_file.owner_id)
        .bind(&new_file.file_name)
        .bind(&new_file.blob.blob_id)
        .bind(&new_file.blob.url)
        .bind(&new_file.content_type)
        .bind(new_file.size)
        .bind(datetime::now_db())
        .execute(self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DriveError::NotFound("File".to_string()))
    }

    /// Get a record by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<FileRecord>> {
        let file = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(file)
    }

    /// List a user's records, newest first.
    pub async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<FileRecord>> {
        let files = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE owner_id = ?
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(owner_id)
        .fetch_all(self.pool)
        .await?;
        Ok(files)
    }

    /// List every record, newest first.
    pub async fn list_all(&self) -> Result<Vec<FileRecord>> {
        let files = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(files)
    }

    /// List every record with its owner's name and email, newest first.
    pub async fn list_all_with_owner(&self) -> Result<Vec<FileWithOwner>> {
        let files = sqlx::query_as::<_, FileWithOwner>(
            "SELECT f.id, f.owner_id, f.file_name, f.blob_id, f.blob_url, f.file_type,
                    f.file_size, f.created_at, u.name AS owner_name, u.email AS owner_email
             FROM files f
             LEFT JOIN users u ON u.id = f.owner_id
             ORDER BY f.created_at DESC, f.id DESC",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(files)
    }

    /// Delete a record by ID.
    ///
    /// Returns true if a record was deleted.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every record owned by a user. Returns the number removed.
    pub async fn delete_by_owner(&self, owner_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM files WHERE owner_id = ?")
            .bind(owner_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Count a user's records.
    pub async fn count_by_owner(&self, owner_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files WHERE owner_id = ?")
            .bind(owner_id)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Total bytes owned by a user.
    pub async fn sum_size_by_owner(&self, owner_id: i64) -> Result<i64> {
        let total: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(file_size), 0) FROM files WHERE owner_id = ?")
                .bind(owner_id)
                .fetch_one(self.pool)
                .await?;
        Ok(total)
    }

    /// Count all records.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Total bytes across all records.
    pub async fn total_size(&self) -> Result<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(file_size), 0) FROM files")
            .fetch_one(self.pool)
            .await?;
        Ok(total)
    }

    /// Count records created at or after the given instant.
    pub async fn count_created_since(&self, since: DateTime<Utc>) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files WHERE created_at >= ?")
            .bind(datetime::to_db(&since))
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, NewUser, UserRepository};
    use chrono::Duration;

    async fn setup() -> (Database, i64, i64) {
        let db = Database::open_in_memory().await.unwrap();
        let users = UserRepository::new(db.pool());
        let alice = users
            .create(&NewUser::new("Alice", "alice@example.com", "hash"))
            .await
            .unwrap();
        let bob = users
            .create(&NewUser::new("Bob", "bob@example.com", "hash"))
            .await
            .unwrap();
        (db, alice.id, bob.id)
    }

    fn new_file(owner_id: i64, name: &str, size: i64) -> NewFileRecord {
        NewFileRecord {
            owner_id,
            file_name: name.to_string(),
            blob: BlobRef {
                blob_id: format!("blob-{name}"),
                url: format!("memory://blob-{name}"),
            },
            content_type: "text/plain".to_string(),
            size,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (db, alice, _) = setup().await;
        let repo = FileRepository::new(db.pool());

        let file = repo.create(&new_file(alice, "a.txt", 10)).await.unwrap();
        assert_eq!(file.owner_id, alice);
        assert_eq!(file.file_name, "a.txt");
        assert_eq!(file.blob_ref().blob_id, "blob-a.txt");
        assert_eq!(file.size, 10);

        let fetched = repo.get_by_id(file.id).await.unwrap().unwrap();
        assert_eq!(fetched, file);
        assert!(repo.get_by_id(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_by_owner_newest_first() {
        let (db, alice, bob) = setup().await;
        let repo = FileRepository::new(db.pool());

        let first = repo.create(&new_file(alice, "1.txt", 1)).await.unwrap();
        let second = repo.create(&new_file(alice, "2.txt", 2)).await.unwrap();
        repo.create(&new_file(bob, "b.txt", 3)).await.unwrap();

        let ids: Vec<i64> = repo
            .list_by_owner(alice)
            .await
            .unwrap()
            .iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert_eq!(repo.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_list_all_with_owner() {
        let (db, alice, _) = setup().await;
        let repo = FileRepository::new(db.pool());
        repo.create(&new_file(alice, "a.txt", 1)).await.unwrap();

        let files = repo.list_all_with_owner().await.unwrap();
        assert_eq!(files.len(), 1);
        let owner = files[0].owner.as_ref().unwrap();
        assert_eq!(owner.id, alice);
        assert_eq!(owner.name, "Alice");
        assert_eq!(owner.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_aggregates() {
        let (db, alice, bob) = setup().await;
        let repo = FileRepository::new(db.pool());
        repo.create(&new_file(alice, "1.txt", 100)).await.unwrap();
        repo.create(&new_file(alice, "2.txt", 50)).await.unwrap();
        repo.create(&new_file(bob, "3.txt", 7)).await.unwrap();

        assert_eq!(repo.count_by_owner(alice).await.unwrap(), 2);
        assert_eq!(repo.sum_size_by_owner(alice).await.unwrap(), 150);
        assert_eq!(repo.sum_size_by_owner(9999).await.unwrap(), 0);
        assert_eq!(repo.count().await.unwrap(), 3);
        assert_eq!(repo.total_size().await.unwrap(), 157);

        let now = Utc::now();
        assert_eq!(
            repo.count_created_since(now - Duration::days(7))
                .await
                .unwrap(),
            3
        );
        assert_eq!(
            repo.count_created_since(now + Duration::days(1))
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_delete_and_delete_by_owner() {
        let (db, alice, bob) = setup().await;
        let repo = FileRepository::new(db.pool());
        let a1 = repo.create(&new_file(alice, "1.txt", 1)).await.unwrap();
        repo.create(&new_file(alice, "2.txt", 1)).await.unwrap();
        repo.create(&new_file(alice, "3.txt", 1)).await.unwrap();
        repo.create(&new_file(bob, "b.txt", 1)).await.unwrap();

        assert!(repo.delete(a1.id).await.unwrap());
        assert!(!repo.delete(a1.id).await.unwrap());

        assert_eq!(repo.delete_by_owner(alice).await.unwrap(), 2);
        assert_eq!(repo.count_by_owner(alice).await.unwrap(), 0);
        assert_eq!(repo.count_by_owner(bob).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_usage_matches_user_listing() {
        let (db, alice, _) = setup().await;
        let repo = FileRepository::new(db.pool());
        repo.create(&new_file(alice, "1.txt", 40)).await.unwrap();
        repo.create(&new_file(alice, "2.txt", 2)).await.unwrap();

        let usage = UserRepository::new(db.pool()).list_with_usage().await.unwrap();
        let alice_usage = usage.iter().find(|u| u.user.id == alice).unwrap();
        assert_eq!(alice_usage.file_count, 2);
        assert_eq!(alice_usage.total_size, 42);
    }

    #[tokio::test]
    async fn test_usage_is_per_owner() {
        let (db, alice, bob) = setup().await;
        let repo = FileRepository::new(db.pool());
        repo.create(&new_file(alice, "a.txt", 10)).await.unwrap();
        repo.create(&new_file(bob, "b1.txt", 5)).await.unwrap();
        repo.create(&new_file(bob, "b2.txt", 7)).await.unwrap();
        repo.create(&new_file(bob, "b3.txt", 1)).await.unwrap();

        let usage = UserRepository::new(db.pool()).list_with_usage().await.unwrap();
        let ids: Vec<i64> = usage.iter().map(|u| u.user.id).collect();
        assert_eq!(ids, vec![bob, alice]);
        assert_eq!((usage[0].file_count, usage[0].total_size), (3, 13));
        assert_eq!((usage[1].file_count, usage[1].total_size), (1, 10));
    }
}
