//! Database repositories
//!
//! One repository per entity. The SQL is shared between SQLite and MySQL,
//! so each repository writes its queries once inside a `*_queries!` macro
//! that expands into a `sqlite` and a `mysql` module; [`dispatch!`] then
//! routes every call to the module matching the pool's backend.

use sqlx::mysql::MySqlQueryResult;
use sqlx::sqlite::SqliteQueryResult;

/// Call `sqlite::$func` or `mysql::$func` depending on the pool backend.
macro_rules! dispatch {
    ($pool:expr, $func:ident($($arg:expr),* $(,)?)) => {
        match $pool.backend() {
            $crate::db::Backend::Sqlite(p) => sqlite::$func(p $(, $arg)*).await,
            $crate::db::Backend::Mysql(p) => mysql::$func(p $(, $arg)*).await,
        }
    };
}

pub mod gallery;
pub mod gallery_image;
pub mod menu;
pub mod news;
pub mod slider;

pub use gallery::{GalleryRepository, SqlxGalleryRepository};
pub use gallery_image::{GalleryImageRepository, SqlxGalleryImageRepository};
pub use menu::{build_menu_tree, MenuRepository, SqlxMenuRepository};
pub use news::{NewsRepository, SqlxNewsRepository};
pub use slider::{SliderRepository, SqlxSliderRepository};

/// Id of the row created by an `INSERT`
pub(crate) trait InsertId {
    fn insert_id(&self) -> i64;
}

impl InsertId for SqliteQueryResult {
    fn insert_id(&self) -> i64 {
        self.last_insert_rowid()
    }
}

impl InsertId for MySqlQueryResult {
    fn insert_id(&self) -> i64 {
        i64::try_from(self.last_insert_id()).unwrap_or(i64::MAX)
    }
}

/// Decode a `status` column
pub(crate) fn decode_status(value: i32) -> anyhow::Result<crate::models::RecordStatus> {
    crate::models::RecordStatus::try_from(value).map_err(anyhow::Error::msg)
}
