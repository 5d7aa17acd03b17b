//! Database connection pool abstraction
//!
//! Production runs against MySQL; tests and local development use SQLite.
//! Both are reached through the object-safe [`DatabasePool`] trait so the
//! rest of the application never names a concrete driver.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{
    mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions},
    sqlite::{SqlitePool, SqlitePoolOptions},
    Executor, Row,
};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{DatabaseConfig, DatabaseDriver};

/// A borrowed view of the concrete pool behind a [`DatabasePool`].
#[derive(Clone, Copy)]
pub enum Backend<'a> {
    Sqlite(&'a SqlitePool),
    Mysql(&'a MySqlPool),
}

/// Database pool trait that abstracts over the supported backends.
#[async_trait]
pub trait DatabasePool: Send + Sync {
    /// Execute a raw SQL statement that doesn't return rows
    async fn execute(&self, query: &str) -> Result<u64>;

    /// Check if the database connection is healthy
    async fn ping(&self) -> Result<()>;

    /// Version string reported by the server
    async fn server_version(&self) -> Result<String>;

    /// Name of the database the pool is connected to, if any
    async fn current_database(&self) -> Result<Option<String>>;

    /// Whether a table exists in the current database
    async fn table_exists(&self, table: &str) -> Result<bool>;

    /// Close the connection pool
    async fn close(&self);

    /// Get the database driver type
    fn driver(&self) -> DatabaseDriver;

    /// Borrow the concrete pool
    fn backend(&self) -> Backend<'_>;
}

/// SQLite connection pool implementation
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Create a new SQLite connection pool
    ///
    /// `:memory:` databases are private to a connection, so they get a
    /// single connection that is never recycled.
    pub async fn new(url: &str) -> Result<Self> {
        let in_memory = url == ":memory:" || url.starts_with("sqlite::memory:");

        if !in_memory {
            let path = url.strip_prefix("sqlite:").unwrap_or(url);
            let path = path.split('?').next().unwrap_or(path);
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
                }
            }
        }

        let connection_url = if in_memory {
            "sqlite::memory:".to_string()
        } else if url.starts_with("sqlite:") {
            if url.contains('?') {
                url.to_string()
            } else {
                format!("{}?mode=rwc", url)
            }
        } else {
            format!("sqlite:{}?mode=rwc", url)
        };

        let options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(Option::<Duration>::None)
                .max_lifetime(Option::<Duration>::None)
        } else {
            SqlitePoolOptions::new().max_connections(10)
        };

        let pool = options
            .connect(&connection_url)
            .await
            .with_context(|| format!("Failed to connect to SQLite database: {}", url))?;

        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&pool)
            .await
            .context("Failed to enable foreign keys")?;

        Ok(Self { pool })
    }

    /// Get a reference to the underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl DatabasePool for SqliteDatabase {
    async fn execute(&self, query: &str) -> Result<u64> {
        let result = sqlx::query(query)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to execute query: {}", query))?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("Database ping failed")?;
        Ok(())
    }

    async fn server_version(&self) -> Result<String> {
        let row = sqlx::query("SELECT sqlite_version() AS version")
            .fetch_one(&self.pool)
            .await
            .context("Failed to read SQLite version")?;
        Ok(row.try_get("version")?)
    }

    async fn current_database(&self) -> Result<Option<String>> {
        Ok(Some("main".to_string()))
    }

    async fn table_exists(&self, table: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(table)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check table existence")?;
        let count: i64 = row.try_get("count")?;
        Ok(count > 0)
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn driver(&self) -> DatabaseDriver {
        DatabaseDriver::Sqlite
    }

    fn backend(&self) -> Backend<'_> {
        Backend::Sqlite(&self.pool)
    }
}

/// MySQL connection pool implementation
pub struct MysqlDatabase {
    pool: MySqlPool,
}

impl MysqlDatabase {
    /// Create a new MySQL connection pool
    ///
    /// Every new connection runs in `TRADITIONAL` SQL mode with a utf8
    /// client charset and a UTC session time zone.
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let url = if config.url.starts_with("mysql://") {
            config.url.clone()
        } else {
            format!("mysql://{}", config.url)
        };

        let options = MySqlConnectOptions::from_str(&url)
            .with_context(|| format!("Invalid MySQL URL for {}", redact_url(&url)))?
            .charset("utf8")
            .timezone(Some("+00:00".to_string()));

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_secs)))
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    conn.execute("SET SESSION sql_mode = 'TRADITIONAL'").await?;
                    Ok(())
                })
            })
            .connect_with(options);

        let pool = tokio::time::timeout(Duration::from_secs(config.connect_timeout_secs), pool)
            .await
            .map_err(|_| anyhow::anyhow!("Timed out connecting to MySQL at {}", redact_url(&url)))?
            .map_err(|e| {
                tracing::error!("MySQL connection failed for {}: {}", redact_url(&url), e);
                e
            })
            .with_context(|| format!("Failed to connect to MySQL database: {}", redact_url(&url)))?;

        tracing::info!("Connected to MySQL at {}", redact_url(&url));
        Ok(Self { pool })
    }

    /// Get a reference to the underlying pool
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

#[async_trait]
impl DatabasePool for MysqlDatabase {
    async fn execute(&self, query: &str) -> Result<u64> {
        let result = sqlx::query(query)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to execute query: {}", query))?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("Database ping failed")?;
        Ok(())
    }

    async fn server_version(&self) -> Result<String> {
        let row = sqlx::query("SELECT VERSION() AS version")
            .fetch_one(&self.pool)
            .await
            .context("Failed to read MySQL version")?;
        Ok(row.try_get("version")?)
    }

    async fn current_database(&self) -> Result<Option<String>> {
        let row = sqlx::query("SELECT DATABASE() AS name")
            .fetch_one(&self.pool)
            .await
            .context("Failed to read current database")?;
        Ok(row.try_get("name")?)
    }

    async fn table_exists(&self, table: &str) -> Result<bool> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM information_schema.tables WHERE table_schema = DATABASE() AND table_name = ?",
        )
        .bind(table)
        .fetch_one(&self.pool)
        .await
        .context("Failed to check table existence")?;
        let count: i64 = row.try_get("count")?;
        Ok(count > 0)
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn driver(&self) -> DatabaseDriver {
        DatabaseDriver::Mysql
    }

    fn backend(&self) -> Backend<'_> {
        Backend::Mysql(&self.pool)
    }
}

/// Type alias for a shared database pool
pub type DynDatabasePool = Arc<dyn DatabasePool>;

/// Create a database connection pool based on configuration.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn create_pool(config: &DatabaseConfig) -> Result<DynDatabasePool> {
    match config.driver {
        DatabaseDriver::Sqlite => {
            let db = SqliteDatabase::new(&config.url).await?;
            Ok(Arc::new(db))
        }
        DatabaseDriver::Mysql => {
            let db = MysqlDatabase::new(config).await?;
            Ok(Arc::new(db))
        }
    }
}

/// Create a SQLite in-memory database pool for testing
pub async fn create_test_pool() -> Result<DynDatabasePool> {
    create_pool(&DatabaseConfig::in_memory()).await
}

/// Strip the password from a connection URL before it is logged
pub fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let Some((credentials, host)) = rest.rsplit_once('@') else {
        return url.to_string();
    };
    match credentials.split_once(':') {
        Some((user, _)) => format!("{}://{}:***@{}", scheme, user, host),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_pool_creation() {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.expect("Failed to create pool");
        assert_eq!(pool.driver(), DatabaseDriver::Sqlite);
        assert!(matches!(pool.backend(), Backend::Sqlite(_)));
    }

    #[tokio::test]
    async fn test_sqlite_pool_ping_and_version() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        pool.ping().await.expect("Ping should succeed");

        let version = pool.server_version().await.expect("version");
        assert!(version.starts_with('3'));
        assert_eq!(pool.current_database().await.unwrap().as_deref(), Some("main"));
    }

    #[tokio::test]
    async fn test_sqlite_pool_execute_and_table_exists() {
        let pool = create_test_pool().await.expect("Failed to create pool");

        assert!(!pool.table_exists("things").await.unwrap());
        pool.execute("CREATE TABLE things (id INTEGER PRIMARY KEY, name TEXT)")
            .await
            .expect("Failed to create table");
        assert!(pool.table_exists("things").await.unwrap());

        let affected = pool
            .execute("INSERT INTO things (name) VALUES ('a')")
            .await
            .expect("Failed to insert");
        assert_eq!(affected, 1);
    }

    #[tokio::test]
    async fn test_in_memory_pool_shares_one_database() {
        let pool = create_test_pool().await.unwrap();
        pool.execute("CREATE TABLE shared (id INTEGER PRIMARY KEY)").await.unwrap();

        // Concurrent users must see the same schema.
        let (a, b) = tokio::join!(pool.table_exists("shared"), pool.table_exists("shared"));
        assert!(a.unwrap());
        assert!(b.unwrap());
    }

    #[tokio::test]
    async fn test_sqlite_file_pool_creates_nested_directories() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("nested").join("dir").join("club.db");

        let config = DatabaseConfig {
            driver: DatabaseDriver::Sqlite,
            url: db_path.to_string_lossy().to_string(),
            ..DatabaseConfig::default()
        };

        let pool = create_pool(&config).await.expect("Failed to create pool");
        pool.ping().await.expect("Ping should succeed");
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_pool_close() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        pool.close().await;
        assert!(pool.ping().await.is_err());
    }

    #[test]
    fn test_redact_url() {
        assert_eq!(
            redact_url("mysql://club:secret@db:3306/swim"),
            "mysql://club:***@db:3306/swim"
        );
        assert_eq!(redact_url("mysql://root@localhost/swim"), "mysql://root@localhost/swim");
        assert_eq!(redact_url(":memory:"), ":memory:");
    }

    // MySQL tests require a running server; set MYSQL_TEST_URL to run them.
    #[tokio::test]
    #[ignore = "Requires MySQL server"]
    async fn test_mysql_pool_session_setup() {
        let url = std::env::var("MYSQL_TEST_URL")
            .unwrap_or_else(|_| "mysql://root@localhost/test".to_string());
        let config = DatabaseConfig {
            driver: DatabaseDriver::Mysql,
            url,
            ..DatabaseConfig::default()
        };

        let pool = create_pool(&config).await.expect("Failed to create pool");
        assert_eq!(pool.driver(), DatabaseDriver::Mysql);
        pool.ping().await.expect("Ping should succeed");

        let Backend::Mysql(mysql) = pool.backend() else {
            panic!("expected a MySQL backend");
        };
        let row = sqlx::query("SELECT @@SESSION.sql_mode AS mode")
            .fetch_one(mysql)
            .await
            .unwrap();
        let mode: String = row.get("mode");
        assert!(mode.contains("STRICT_TRANS_TABLES"));
    }
}
