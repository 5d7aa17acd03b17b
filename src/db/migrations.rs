//! Database migrations
//!
//! Schema changes are embedded in the binary as SQL strings, one variant per
//! driver, and recorded in the `_migrations` table once applied.
//!
//! Every table is created with `CREATE TABLE IF NOT EXISTS` so that pointing
//! the server at an existing club database leaves its data untouched. MySQL
//! indexes are declared inline for the same reason.
//!
//! ```ignore
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};

use super::{Backend, DynDatabasePool};
use crate::config::DatabaseDriver;

/// A database migration with SQL for both SQLite and MySQL
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements for SQLite
    pub up_sqlite: &'static str,
    /// SQL statements for MySQL
    pub up_mysql: &'static str,
}

/// Migration record stored in the database
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    pub applied_at: DateTime<Utc>,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_news",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS news (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                author VARCHAR(255) NOT NULL,
                news_date DATE NOT NULL,
                show_in_homepage BOOLEAN NOT NULL DEFAULT 0,
                `order` INTEGER NOT NULL DEFAULT 0,
                post_to_public BOOLEAN NOT NULL DEFAULT 0,
                post_to_member BOOLEAN NOT NULL DEFAULT 0,
                date_added TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                status INTEGER NOT NULL DEFAULT 1
            );
            CREATE INDEX IF NOT EXISTS idx_news_status_order ON news(status, `order`);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS news (
                id INT NOT NULL AUTO_INCREMENT,
                author VARCHAR(255) NOT NULL,
                news_date DATE NOT NULL,
                show_in_homepage TINYINT(1) NOT NULL DEFAULT 0,
                `order` INT NOT NULL DEFAULT 0,
                post_to_public TINYINT(1) NOT NULL DEFAULT 0,
                post_to_member TINYINT(1) NOT NULL DEFAULT 0,
                date_added DATETIME NOT NULL,
                status TINYINT NOT NULL DEFAULT 1,
                PRIMARY KEY (id),
                KEY idx_news_status_order (status, `order`)
            ) DEFAULT CHARSET=utf8;
        "#,
    },
    Migration {
        version: 2,
        name: "create_news_content",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS news_content (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                news_id INTEGER NOT NULL,
                language_id INTEGER NOT NULL,
                title VARCHAR(255) NOT NULL,
                summary TEXT,
                article TEXT,
                image_filename VARCHAR(255),
                image_thumbnail VARCHAR(255),
                slug_url VARCHAR(255),
                date_added TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                added_by INTEGER,
                date_updated TIMESTAMP,
                updated_by INTEGER,
                status INTEGER NOT NULL DEFAULT 1
            );
            CREATE INDEX IF NOT EXISTS idx_news_content_news ON news_content(news_id, language_id);
            CREATE INDEX IF NOT EXISTS idx_news_content_slug ON news_content(slug_url, language_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS news_content (
                id INT NOT NULL AUTO_INCREMENT,
                news_id INT NOT NULL,
                language_id INT NOT NULL,
                title VARCHAR(255) NOT NULL,
                summary TEXT,
                article MEDIUMTEXT,
                image_filename VARCHAR(255),
                image_thumbnail VARCHAR(255),
                slug_url VARCHAR(255),
                date_added DATETIME NOT NULL,
                added_by INT,
                date_updated DATETIME,
                updated_by INT,
                status TINYINT NOT NULL DEFAULT 1,
                PRIMARY KEY (id),
                KEY idx_news_content_news (news_id, language_id),
                KEY idx_news_content_slug (slug_url, language_id)
            ) DEFAULT CHARSET=utf8;
        "#,
    },
    Migration {
        version: 3,
        name: "create_gallery",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS gallery (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                gallery_name_en VARCHAR(255) NOT NULL,
                gallery_name_fr VARCHAR(255) NOT NULL,
                description_en TEXT,
                description_fr TEXT,
                `order` INTEGER NOT NULL DEFAULT 0,
                member_only BOOLEAN NOT NULL DEFAULT 0,
                date_created TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                added_by INTEGER,
                date_updated TIMESTAMP,
                updated_by INTEGER,
                status INTEGER NOT NULL DEFAULT 1
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS gallery (
                id INT NOT NULL AUTO_INCREMENT,
                gallery_name_en VARCHAR(255) NOT NULL,
                gallery_name_fr VARCHAR(255) NOT NULL,
                description_en TEXT,
                description_fr TEXT,
                `order` INT NOT NULL DEFAULT 0,
                member_only TINYINT(1) NOT NULL DEFAULT 0,
                date_created DATETIME NOT NULL,
                added_by INT,
                date_updated DATETIME,
                updated_by INT,
                status TINYINT NOT NULL DEFAULT 1,
                PRIMARY KEY (id)
            ) DEFAULT CHARSET=utf8;
        "#,
    },
    Migration {
        version: 4,
        name: "create_gallery_images",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS gallery_images (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                gallery_id INTEGER NOT NULL,
                image_filename VARCHAR(255) NOT NULL,
                thumbnail_filename VARCHAR(255) NOT NULL,
                `order` INTEGER NOT NULL DEFAULT 0,
                date_created TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                added_by INTEGER,
                status INTEGER NOT NULL DEFAULT 1
            );
            CREATE INDEX IF NOT EXISTS idx_gallery_images_gallery ON gallery_images(gallery_id, status);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS gallery_images (
                id INT NOT NULL AUTO_INCREMENT,
                gallery_id INT NOT NULL,
                image_filename VARCHAR(255) NOT NULL,
                thumbnail_filename VARCHAR(255) NOT NULL,
                `order` INT NOT NULL DEFAULT 0,
                date_created DATETIME NOT NULL,
                added_by INT,
                status TINYINT NOT NULL DEFAULT 1,
                PRIMARY KEY (id),
                KEY idx_gallery_images_gallery (gallery_id, status)
            ) DEFAULT CHARSET=utf8;
        "#,
    },
    Migration {
        version: 5,
        name: "create_slider",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS slider (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                image_en VARCHAR(255),
                image_fr VARCHAR(255),
                link_en VARCHAR(500),
                link_fr VARCHAR(500),
                `order` INTEGER NOT NULL DEFAULT 0,
                status INTEGER NOT NULL DEFAULT 1,
                date_created TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                added_by INTEGER,
                date_updated TIMESTAMP,
                updated_by INTEGER
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS slider (
                id INT NOT NULL AUTO_INCREMENT,
                image_en VARCHAR(255),
                image_fr VARCHAR(255),
                link_en VARCHAR(500),
                link_fr VARCHAR(500),
                `order` INT NOT NULL DEFAULT 0,
                status TINYINT NOT NULL DEFAULT 1,
                date_created DATETIME NOT NULL,
                added_by INT,
                date_updated DATETIME,
                updated_by INT,
                PRIMARY KEY (id)
            ) DEFAULT CHARSET=utf8;
        "#,
    },
    // The page tables belong to the legacy site; only the menu reads them.
    Migration {
        version: 6,
        name: "create_pages",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS pages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                parent_id INTEGER,
                page_type_id INTEGER NOT NULL DEFAULT 1,
                sort_order INTEGER NOT NULL DEFAULT 0,
                is_public BOOLEAN NOT NULL DEFAULT 1,
                show_in_menu BOOLEAN NOT NULL DEFAULT 1,
                is_main_item BOOLEAN NOT NULL DEFAULT 0,
                status INTEGER NOT NULL DEFAULT 1
            );
            CREATE TABLE IF NOT EXISTS page_content (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                page_id INTEGER NOT NULL,
                language_id INTEGER NOT NULL,
                title VARCHAR(255) NOT NULL,
                url VARCHAR(255) NOT NULL,
                status INTEGER NOT NULL DEFAULT 1
            );
            CREATE INDEX IF NOT EXISTS idx_page_content_page ON page_content(page_id, language_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS pages (
                id INT NOT NULL AUTO_INCREMENT,
                parent_id INT,
                page_type_id INT NOT NULL DEFAULT 1,
                sort_order INT NOT NULL DEFAULT 0,
                is_public TINYINT(1) NOT NULL DEFAULT 1,
                show_in_menu TINYINT(1) NOT NULL DEFAULT 1,
                is_main_item TINYINT(1) NOT NULL DEFAULT 0,
                status TINYINT NOT NULL DEFAULT 1,
                PRIMARY KEY (id)
            ) DEFAULT CHARSET=utf8;
            CREATE TABLE IF NOT EXISTS page_content (
                id INT NOT NULL AUTO_INCREMENT,
                page_id INT NOT NULL,
                language_id INT NOT NULL,
                title VARCHAR(255) NOT NULL,
                url VARCHAR(255) NOT NULL,
                status TINYINT NOT NULL DEFAULT 1,
                PRIMARY KEY (id),
                KEY idx_page_content_page (page_id, language_id)
            ) DEFAULT CHARSET=utf8;
        "#,
    },
];

/// Run all pending migrations
///
/// Returns the number of migrations applied.
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    let applied_versions: Vec<i64> = applied.iter().map(|m| m.version).collect();

    let mut count = 0;

    for migration in MIGRATIONS {
        if !applied_versions.contains(&i64::from(migration.version)) {
            tracing::info!("Applying migration {}: {}", migration.version, migration.name);
            apply_migration(pool, migration)
                .await
                .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
        DatabaseDriver::Mysql => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INT PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
    };

    pool.execute(sql).await?;
    Ok(())
}

async fn get_applied_migrations(pool: &DynDatabasePool) -> Result<Vec<MigrationRecord>> {
    match pool.backend() {
        Backend::Sqlite(p) => get_applied_migrations_sqlite(p).await,
        Backend::Mysql(p) => get_applied_migrations_mysql(p).await,
    }
}

async fn get_applied_migrations_sqlite(pool: &SqlitePool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|row| {
            Ok::<_, anyhow::Error>(MigrationRecord {
                version: row.try_get("version")?,
                name: row.try_get("name")?,
                applied_at: row.try_get("applied_at")?,
            })
        })
        .collect()
}

async fn get_applied_migrations_mysql(pool: &MySqlPool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|row| {
            let version: i32 = row.try_get("version")?;
            Ok::<_, anyhow::Error>(MigrationRecord {
                version: i64::from(version),
                name: row.try_get("name")?,
                applied_at: row.try_get("applied_at")?,
            })
        })
        .collect()
}

async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    match pool.backend() {
        Backend::Sqlite(p) => apply_migration_sqlite(p, migration).await,
        Backend::Mysql(p) => apply_migration_mysql(p, migration).await,
    }
}

async fn apply_migration_sqlite(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    for statement in split_sql_statements(migration.up_sqlite) {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;

    Ok(())
}

async fn apply_migration_mysql(pool: &MySqlPool, migration: &Migration) -> Result<()> {
    for statement in split_sql_statements(migration.up_mysql) {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;

    Ok(())
}

/// Truncate SQL for error messages
fn truncate_sql(sql: &str) -> String {
    match sql.char_indices().nth(100) {
        Some((idx, _)) => format!("{}...", &sql[..idx]),
        None => sql.to_string(),
    }
}

/// Split SQL into individual statements, skipping comment-only fragments
fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !is_comment_only(stmt))
        .collect()
}

/// Check if a string contains only SQL comments
fn is_comment_only(s: &str) -> bool {
    s.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

/// Check if migrations are up to date
pub async fn is_up_to_date(pool: &DynDatabasePool) -> Result<bool> {
    Ok(pending_count(pool).await? == 0)
}

/// Get pending migrations count
pub async fn pending_count(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    Ok(MIGRATIONS
        .iter()
        .filter(|m| !applied.iter().any(|a| a.version == i64::from(m.version)))
        .count())
}

/// Get the total number of migrations defined
pub fn total_migrations() -> usize {
    MIGRATIONS.len()
}
