//! Database schema and migrations for minidrive.
//!
//! This module contains all database migrations that will be applied
//! sequentially when the database is first opened or upgraded.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: Users table
    r#"
CREATE TABLE users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    email       TEXT NOT NULL,
    password    TEXT NOT NULL,                    -- Argon2 hash
    role        TEXT NOT NULL DEFAULT 'user',     -- 'user', 'admin'
    created_at  TEXT NOT NULL,                    -- fixed-width UTC
    updated_at  TEXT NOT NULL
);

CREATE UNIQUE INDEX idx_users_email_nocase ON users(email COLLATE NOCASE);
CREATE INDEX idx_users_role ON users(role);
CREATE INDEX idx_users_created_at ON users(created_at);
"#,
    // v2: File records
    r#"
CREATE TABLE files (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    file_name   TEXT NOT NULL,
    blob_id     TEXT NOT NULL,
    blob_url    TEXT NOT NULL,
    file_type   TEXT NOT NULL,                    -- declared MIME type
    file_size   INTEGER NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE INDEX idx_files_owner ON files(owner_id, created_at);
CREATE INDEX idx_files_created_at ON files(created_at);
"#,
];
