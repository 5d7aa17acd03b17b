//! Database layer
//!
//! The club site runs against the legacy MySQL database in production and
//! against SQLite for local development and tests. Both drivers sit behind
//! the [`DatabasePool`] trait so services never know which one is in use.
//!
//! # Usage
//!
//! ```ignore
//! use clubsite::config::DatabaseConfig;
//! use clubsite::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, redact_url, Backend, DatabasePool, DynDatabasePool,
    MysqlDatabase, SqliteDatabase,
};
