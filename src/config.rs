//! Configuration module for minidrive.

use serde::Deserialize;
use std::path::Path;

use crate::{DriveError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5001
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection string (e.g. `sqlite://data/minidrive.db`).
    #[serde(default = "default_db_url")]
    pub url: String,
}

fn default_db_url() -> String {
    "sqlite://data/minidrive.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_db_url(),
        }
    }
}

/// Session token configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Secret used to sign session tokens (must be set).
    #[serde(default)]
    pub jwt_secret: String,
    /// Session token lifetime in seconds.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
}

fn default_token_ttl() -> u64 {
    30 * 24 * 60 * 60 // 30 days
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_secs: default_token_ttl(),
        }
    }
}

/// Web layer configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// CORS allowed origins.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    /// Rate limit for login and registration (requests per minute per IP).
    #[serde(default = "default_login_rate_limit")]
    pub login_rate_limit: u32,
    /// Rate limit for the rest of the API (requests per minute per IP).
    #[serde(default = "default_api_rate_limit")]
    pub api_rate_limit: u32,
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:5173".to_string()]
}

fn default_login_rate_limit() -> u32 {
    10
}

fn default_api_rate_limit() -> u32 {
    300
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            cors_origins: default_cors_origins(),
            login_rate_limit: default_login_rate_limit(),
            api_rate_limit: default_api_rate_limit(),
        }
    }
}

/// Which blob backend holds file bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Sharded directory on local disk.
    #[default]
    Local,
    /// Cloudinary media API.
    Cloudinary,
}

/// Cloudinary credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct CloudinaryConfig {
    /// Cloud name (account identifier).
    #[serde(default)]
    pub cloud_name: String,
    /// API key.
    #[serde(default)]
    pub api_key: String,
    /// API secret used to sign requests.
    #[serde(default)]
    pub api_secret: String,
    /// Folder uploads are placed in.
    #[serde(default = "default_cloudinary_folder")]
    pub folder: String,
    /// Base URL of the API.
    #[serde(default = "default_cloudinary_api_base")]
    pub api_base: String,
}

fn default_cloudinary_folder() -> String {
    "mini-drive".to_string()
}

fn default_cloudinary_api_base() -> String {
    "https://api.cloudinary.com/v1_1/".to_string()
}

impl Default for CloudinaryConfig {
    fn default() -> Self {
        Self {
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            folder: default_cloudinary_folder(),
            api_base: default_cloudinary_api_base(),
        }
    }
}

/// Blob storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Backend selection.
    #[serde(default)]
    pub backend: StorageBackend,
    /// Directory used by the local backend.
    #[serde(default = "default_local_path")]
    pub local_path: String,
    /// Timeout applied to every blob call, in seconds.
    #[serde(default = "default_storage_timeout")]
    pub timeout_secs: u64,
    /// Cloudinary settings (used when backend = "cloudinary").
    #[serde(default)]
    pub cloudinary: CloudinaryConfig,
}

fn default_local_path() -> String {
    "data/blobs".to_string()
}

fn default_storage_timeout() -> u64 {
    30
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            local_path: default_local_path(),
            timeout_secs: default_storage_timeout(),
            cloudinary: CloudinaryConfig::default(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/minidrive.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Session token configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Web layer configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Blob storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(DriveError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| DriveError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `MINIDRIVE_DATABASE_URL`
    /// - `MINIDRIVE_JWT_SECRET`
    /// - `MINIDRIVE_TOKEN_TTL_SECS`
    /// - `MINIDRIVE_CORS_ORIGIN` (comma separated)
    /// - `MINIDRIVE_PORT`
    /// - `CLOUDINARY_CLOUD_NAME`, `CLOUDINARY_API_KEY`, `CLOUDINARY_API_SECRET`
    ///
    /// Empty values are ignored.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("MINIDRIVE_DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(secret) = get("MINIDRIVE_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(ttl) = get("MINIDRIVE_TOKEN_TTL_SECS").and_then(|v| v.parse().ok()) {
            self.auth.token_ttl_secs = ttl;
        }
        if let Some(origins) = get("MINIDRIVE_CORS_ORIGIN") {
            self.web.cors_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }
        if let Some(port) = get("MINIDRIVE_PORT").and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }
        if let Some(name) = get("CLOUDINARY_CLOUD_NAME") {
            self.storage.cloudinary.cloud_name = name;
        }
        if let Some(key) = get("CLOUDINARY_API_KEY") {
            self.storage.cloudinary.api_key = key;
        }
        if let Some(secret) = get("CLOUDINARY_API_SECRET") {
            self.storage.cloudinary.api_secret = secret;
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - the token signing secret is not set
    /// - the token lifetime is zero
    /// - the cloudinary backend is selected without full credentials
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            return Err(DriveError::Config(
                "jwt_secret is not set. \
                 Set it in config.toml or via MINIDRIVE_JWT_SECRET environment variable."
                    .to_string(),
            ));
        }
        if self.auth.token_ttl_secs == 0 {
            return Err(DriveError::Config(
                "token_ttl_secs must be greater than zero".to_string(),
            ));
        }
        if self.storage.backend == StorageBackend::Cloudinary {
            let c = &self.storage.cloudinary;
            if c.cloud_name.is_empty() || c.api_key.is_empty() || c.api_secret.is_empty() {
                return Err(DriveError::Config(
                    "cloudinary backend requires cloud_name, api_key and api_secret".to_string(),
                ));
            }
        }
        Ok(())
    }
}
