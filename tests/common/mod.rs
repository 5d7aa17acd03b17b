use std::io::Cursor;

use axum::Router;
use axum_test::multipart::Part;
use axum_test::TestServer;
use clubsite::api::{self, AppState};
use clubsite::config::{Config, StorageConfig};
use clubsite::db::{create_test_pool, migrations, DynDatabasePool};
use image::{DynamicImage, ImageFormat, RgbImage};
use tempfile::TempDir;

pub const CLUB: &str = "swimdorval";

#[allow(dead_code)]
pub struct TestEnv {
    pub app: TestServer,
    pub pool: DynDatabasePool,
    pub media: TempDir,
}

impl TestEnv {
    /// Router over a migrated in-memory database and a temporary media root
    ///
    /// # Panics
    /// Panics if the database or the test server cannot be set up
    pub async fn new() -> Self {
        Self::with_storage(|_| {}).await
    }

    /// Same as `new`, with the storage limits adjusted by `configure`
    ///
    /// # Panics
    /// Panics if the database or the test server cannot be set up
    pub async fn with_storage(configure: impl FnOnce(&mut StorageConfig)) -> Self {
        let (router, pool, media) = test_router_with(configure).await;
        let app = TestServer::new(router).unwrap();

        TestEnv { app, pool, media }
    }

    /// Insert a legacy page with its content row in `language_id`
    #[allow(dead_code)]
    pub async fn insert_page(
        &self,
        id: i64,
        parent_id: Option<i64>,
        sort_order: i32,
        is_main_item: bool,
        language_id: i32,
        title: &str,
    ) {
        let parent = parent_id.map_or_else(|| "NULL".to_string(), |p| p.to_string());
        self.pool
            .execute(&format!(
                "INSERT INTO pages (id, parent_id, page_type_id, sort_order, is_public, show_in_menu, is_main_item, status) \
                 VALUES ({}, {}, 1, {}, 1, 1, {}, 1)",
                id,
                parent,
                sort_order,
                i32::from(is_main_item)
            ))
            .await
            .unwrap();
        self.pool
            .execute(&format!(
                "INSERT INTO page_content (page_id, language_id, title, url, status) \
                 VALUES ({}, {}, '{}', '/page-{}', 1)",
                id, language_id, title, id
            ))
            .await
            .unwrap();
    }
}

/// Build the full application router for tests
///
/// # Panics
/// Panics if the in-memory database cannot be created or migrated
#[allow(dead_code)]
pub async fn test_router() -> (Router, DynDatabasePool, TempDir) {
    test_router_with(|_| {}).await
}

/// Build the application router over storage tweaked by `configure`
///
/// # Panics
/// Panics if the in-memory database cannot be created or migrated
pub async fn test_router_with(configure: impl FnOnce(&mut StorageConfig)) -> (Router, DynDatabasePool, TempDir) {
    let media = TempDir::new().unwrap();
    let mut storage = StorageConfig {
        root: media.path().to_path_buf(),
        ..StorageConfig::default()
    };
    configure(&mut storage);
    let config = Config {
        storage,
        ..Config::default()
    };

    let pool = create_test_pool().await.unwrap();
    migrations::run_migrations(&pool).await.unwrap();

    let state = AppState::new(pool.clone(), &config);
    (api::build_router(state, &config), pool, media)
}

/// Encoded PNG of the given size
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::new(width, height));
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

#[allow(dead_code)]
pub fn png_part(name: &str) -> Part {
    Part::bytes(png_bytes(16, 16))
        .file_name(name.to_string())
        .mime_type("image/png")
}
