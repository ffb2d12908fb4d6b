//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration files (config/default.toml, config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::{net::IpAddr, path::PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub cloudflare: Option<CloudflareConfig>,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8000)
    pub port: u16,
    /// Public domain (e.g., "videos.example.com")
    pub domain: String,
    /// Protocol ("http" or "https")
    pub protocol: String,
    /// Allowed CORS origin, or "*" for any
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl ServerConfig {
    /// Get the base URL for the instance
    ///
    /// # Returns
    /// Full URL like "https://videos.example.com"
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.domain)
    }
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub media: MediaStorageConfig,
}

/// Where uploaded media is persisted
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Cloudflare R2 (S3-compatible)
    R2,
    /// Plain directory on the local filesystem
    #[default]
    Local,
}

/// Media storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MediaStorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// R2 bucket name for media
    pub bucket: String,
    /// Public URL prefix for stored objects
    /// e.g., "https://media.example.com"
    pub public_url: String,
    /// Directory used by the local backend
    #[serde(default = "default_local_dir")]
    pub local_dir: PathBuf,
}

fn default_local_dir() -> PathBuf {
    PathBuf::from("data/media")
}

/// Cloudflare credentials (required for the R2 backend)
#[derive(Debug, Clone, Deserialize)]
pub struct CloudflareConfig {
    /// Cloudflare account ID
    pub account_id: String,
    /// R2 access key ID
    pub r2_access_key_id: String,
    /// R2 secret access key
    pub r2_secret_access_key: String,
}

/// Token configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for access and refresh tokens (32+ bytes)
    pub token_secret: String,
    /// Access token lifetime in seconds (default: 86400 = 1 day)
    pub access_token_ttl: i64,
    /// Refresh token lifetime in seconds (default: 864000 = 10 days)
    pub refresh_token_ttl: i64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl LoggingConfig {
    /// Filter used when `RUST_LOG` is not set
    pub fn default_filter(&self) -> String {
        format!("vidtube={},tower_http=debug", self.level.trim())
    }

    pub fn is_json(&self) -> bool {
        self.format.trim().eq_ignore_ascii_case("json")
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (VIDTUBE__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("server.domain", "localhost:8000")?
            .set_default("server.protocol", "http")?
            .set_default("database.path", "data/vidtube.db")?
            .set_default("storage.media.backend", "local")?
            .set_default("storage.media.bucket", "vidtube-media")?
            .set_default("storage.media.public_url", "http://localhost:8000/media")?
            .set_default("auth.access_token_ttl", 86400)?
            .set_default("auth.refresh_token_ttl", 864000)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("VIDTUBE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Cookies carrying tokens get the `Secure` flag outside local development.
    pub fn should_use_secure_cookies(&self) -> bool {
        self.server.protocol.eq_ignore_ascii_case("https")
            || !is_local_server_domain(&self.server.domain)
    }

    pub(crate) fn validate(&self) -> Result<(), crate::error::AppError> {
        const MIN_TOKEN_SECRET_BYTES: usize = 32;

        if self.auth.token_secret.as_bytes().len() < MIN_TOKEN_SECRET_BYTES {
            return Err(crate::error::AppError::Config(format!(
                "auth.token_secret must be at least {} bytes",
                MIN_TOKEN_SECRET_BYTES
            )));
        }

        if self.auth.access_token_ttl <= 0 || self.auth.refresh_token_ttl <= 0 {
            return Err(crate::error::AppError::Config(
                "auth token lifetimes must be greater than 0".to_string(),
            ));
        }

        if self.storage.media.backend == StorageBackend::R2 && self.cloudflare.is_none() {
            return Err(crate::error::AppError::Config(
                "cloudflare credentials are required when storage.media.backend=r2".to_string(),
            ));
        }

        if self.should_use_secure_cookies() && !self.server.protocol.eq_ignore_ascii_case("https") {
            return Err(crate::error::AppError::Config(
                "server.protocol must be https for non-local server domains".to_string(),
            ));
        }

        Ok(())
    }
}

fn normalized_server_host(domain: &str) -> String {
    let trimmed = domain.trim();
    let parsed_host = url::Url::parse(&format!("http://{trimmed}"))
        .ok()
        .and_then(|url| url.host_str().map(|host| host.to_string()));
    let host = parsed_host.unwrap_or_else(|| trimmed.to_string());
    host.trim_end_matches('.').to_ascii_lowercase()
}

fn is_local_server_domain(domain: &str) -> bool {
    let host = normalized_server_host(domain);
    if host == "localhost" || host.ends_with(".localhost") {
        return true;
    }

    if let Ok(ip) = host.trim_start_matches('[').trim_end_matches(']').parse::<IpAddr>() {
        return ip.is_loopback() || ip.is_unspecified();
    }

    false
}
