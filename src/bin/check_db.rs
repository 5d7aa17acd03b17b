//! CLI tool to diagnose the database connection.
//!
//! Usage: `cargo run --bin check-db`
//!
//! Reads `config.yml`, `.env` and the usual environment overrides, connects,
//! and reports the server version, the current database, which content
//! tables exist and how many migrations are pending. Exits with status 1 on
//! failure.

use std::path::Path;
use std::process::ExitCode;

use clubsite::config::{Config, DatabaseConfig};
use clubsite::db::{self, migrations, redact_url, DynDatabasePool};

const CONTENT_TABLES: &[&str] = &[
    "news",
    "news_content",
    "gallery",
    "gallery_images",
    "slider",
    "pages",
    "page_content",
];

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv_loaded = dotenvy::dotenv().is_ok();

    let config = match Config::load_with_env(Path::new("config.yml")) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("Checking database connection...\n");
    print_settings(&config.database, dotenv_loaded);

    let pool = match db::create_pool(&config.database).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("\nConnection failed: {:#}\n", e);
            eprintln!("Troubleshooting:");
            eprintln!("  1. Verify the database server is running");
            eprintln!("  2. Check the credentials in .env or config.yml");
            eprintln!("  3. Make sure the database exists");
            return ExitCode::FAILURE;
        }
    };

    let result = run_checks(&pool).await;
    pool.close().await;

    match result {
        Ok(()) => {
            println!("\nAll checks passed.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("\nCheck failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_settings(database: &DatabaseConfig, dotenv_loaded: bool) {
    println!("Configuration:");
    println!("  .env file: {}", if dotenv_loaded { "loaded" } else { "not found" });
    println!("  Driver: {}", database.driver);
    println!("  URL: {}", redact_url(&database.url));
    println!("  Max connections: {}", database.max_connections);
    println!();
}

async fn run_checks(pool: &DynDatabasePool) -> anyhow::Result<()> {
    pool.ping().await?;
    println!("1. Ping ok");

    println!("2. Server version: {}", pool.server_version().await?);
    println!(
        "3. Current database: {}",
        pool.current_database().await?.as_deref().unwrap_or("none")
    );

    println!("4. Content tables:");
    for table in CONTENT_TABLES {
        let status = if pool.table_exists(table).await? { "present" } else { "missing" };
        println!("   {:<16} {}", table, status);
    }

    let pending = migrations::pending_count(pool).await?;
    println!(
        "5. Migrations: {} of {} applied, {} pending",
        migrations::total_migrations() - pending,
        migrations::total_migrations(),
        pending
    );
    Ok(())
}
