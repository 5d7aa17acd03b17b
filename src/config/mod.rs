//! Configuration management
//!
//! Configuration is loaded from `config.yml` and then overridden by
//! environment variables. Two families of variables are honoured:
//! - `CLUBSITE_*` for every setting
//! - the legacy `DB_HOST`/`DB_PORT`/`DB_USER`/`DB_PASSWORD`/`DB_NAME` and
//!   `SERVER_PORT` variables used by existing deployments
//!
//! Missing optional values are filled with defaults.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Media storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Club/site configuration
    #[serde(default)]
    pub site: SiteConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin, `*` allows any origin
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_cors_origin() -> String {
    "*".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (mysql or sqlite)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Maximum pooled connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Timeout for establishing a connection, in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Timeout for acquiring a pooled connection, in seconds
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    /// Idle connections are closed after this many seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout(),
            acquire_timeout_secs: default_acquire_timeout(),
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}

impl DatabaseConfig {
    /// Configuration for an in-memory SQLite database
    pub fn in_memory() -> Self {
        Self {
            driver: DatabaseDriver::Sqlite,
            url: ":memory:".to_string(),
            ..Self::default()
        }
    }
}

fn default_database_url() -> String {
    "mysql://root@localhost:3306/streamline_sport".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_acquire_timeout() -> u64 {
    60
}

fn default_idle_timeout() -> u64 {
    600
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// MySQL (default, production)
    #[default]
    Mysql,
    /// SQLite (tests and local development)
    Sqlite,
}

impl std::fmt::Display for DatabaseDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mysql => write!(f, "mysql"),
            Self::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Media storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory holding `images/` and `files/`
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
    /// Maximum image upload size in bytes (default: 10MB)
    #[serde(default = "default_max_image_size")]
    pub max_image_size: u64,
    /// Maximum document upload size in bytes (default: 50MB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Thumbnails fit inside a square of this many pixels
    #[serde(default = "default_thumbnail_size")]
    pub thumbnail_size: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            max_image_size: default_max_image_size(),
            max_file_size: default_max_file_size(),
            thumbnail_size: default_thumbnail_size(),
        }
    }
}

impl StorageConfig {
    /// Largest request body any upload route has to accept
    pub fn body_limit(&self) -> usize {
        let largest = self.max_image_size.max(self.max_file_size);
        usize::try_from(largest).unwrap_or(usize::MAX).saturating_add(1024 * 1024)
    }
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("static")
}

fn default_max_image_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

fn default_max_file_size() -> u64 {
    50 * 1024 * 1024 // 50MB
}

fn default_thumbnail_size() -> u32 {
    300
}

/// A club served by this backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClubConfig {
    pub id: String,
    pub name: String,
    pub title_prefix: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Site configuration: the active club and the known clubs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Identifier of the club this deployment serves
    #[serde(default = "default_club_id")]
    pub club_id: String,
    /// Known clubs, keyed by id
    #[serde(default = "default_clubs")]
    pub clubs: BTreeMap<String, ClubConfig>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            club_id: default_club_id(),
            clubs: default_clubs(),
        }
    }
}

impl SiteConfig {
    /// Look up a club, falling back to the default club for unknown ids
    pub fn club(&self, id: &str) -> ClubConfig {
        self.clubs
            .get(id)
            .or_else(|| self.clubs.get(DEFAULT_CLUB_ID))
            .cloned()
            .unwrap_or_else(default_club)
    }

    /// The club this deployment serves
    pub fn current_club(&self) -> ClubConfig {
        self.club(&self.club_id)
    }
}

/// Id of the built-in club used when nothing else matches
pub const DEFAULT_CLUB_ID: &str = "swimdorval";

fn default_club_id() -> String {
    DEFAULT_CLUB_ID.to_string()
}

fn default_club() -> ClubConfig {
    ClubConfig {
        id: DEFAULT_CLUB_ID.to_string(),
        name: "Dorval Swim Club".to_string(),
        title_prefix: "Swim Dorval".to_string(),
        description: Some("Competitive and recreational swimming in Dorval".to_string()),
    }
}

fn default_clubs() -> BTreeMap<String, ClubConfig> {
    let club = default_club();
    BTreeMap::from([(club.id.clone(), club)])
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// A missing or empty file yields the default configuration.
    /// Invalid YAML is reported with its line and column.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: format_yaml_error(&e),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Recognised variables:
    /// - CLUBSITE_SERVER_HOST, CLUBSITE_SERVER_PORT, CLUBSITE_SERVER_CORS_ORIGIN
    /// - CLUBSITE_DATABASE_DRIVER, CLUBSITE_DATABASE_URL
    /// - CLUBSITE_STORAGE_ROOT, CLUBSITE_CLUB_ID
    /// - DB_HOST, DB_PORT, DB_USER, DB_PASSWORD, DB_NAME, SERVER_PORT
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if self.storage.thumbnail_size == 0 {
            return Err(ConfigError::ValidationError(
                "storage.thumbnail_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        self.apply_legacy_env();

        if let Ok(host) = std::env::var("CLUBSITE_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("CLUBSITE_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("CLUBSITE_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        if let Ok(driver) = std::env::var("CLUBSITE_DATABASE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                _ => {} // Ignore invalid values
            }
        }
        if let Ok(url) = std::env::var("CLUBSITE_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(root) = std::env::var("CLUBSITE_STORAGE_ROOT") {
            self.storage.root = PathBuf::from(root);
        }
        if let Ok(club_id) = std::env::var("CLUBSITE_CLUB_ID") {
            self.site.club_id = club_id;
        }
    }

    /// Variables understood by deployments that predate `CLUBSITE_*`
    fn apply_legacy_env(&mut self) {
        if let Ok(port) = std::env::var("SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }

        let host = std::env::var("DB_HOST").ok();
        let name = std::env::var("DB_NAME").ok();
        if host.is_none() && name.is_none() {
            return;
        }

        let port = std::env::var("DB_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3306);
        let user = std::env::var("DB_USER").unwrap_or_else(|_| "root".to_string());
        let password = std::env::var("DB_PASSWORD").unwrap_or_default();

        self.database.driver = DatabaseDriver::Mysql;
        self.database.url = mysql_url(
            host.as_deref().unwrap_or("localhost"),
            port,
            &user,
            &password,
            name.as_deref().unwrap_or("streamline_sport"),
        );
    }
}

/// Compose a MySQL connection URL from its parts
pub fn mysql_url(host: &str, port: u16, user: &str, password: &str, database: &str) -> String {
    let credentials = if password.is_empty() {
        urlencoding::encode(user).into_owned()
    } else {
        format!("{}:{}", urlencoding::encode(user), urlencoding::encode(password))
    };
    format!("mysql://{}@{}:{}/{}", credentials, host, port, database)
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared by every test that touches process environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
