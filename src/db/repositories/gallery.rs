//! Gallery repository

use crate::db::DynDatabasePool;
use crate::models::Gallery;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

use super::{decode_status, InsertId};

#[async_trait]
pub trait GalleryRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Gallery>>;
    async fn get(&self, id: i64) -> Result<Option<Gallery>>;
    async fn max_order(&self) -> Result<i32>;
    async fn create(&self, gallery: &Gallery) -> Result<Gallery>;
    async fn update(&self, gallery: &Gallery) -> Result<()>;
    /// Delete the gallery and every image in it
    async fn soft_delete(&self, id: i64) -> Result<bool>;
    async fn set_order(&self, id: i64, order: i32) -> Result<bool>;
}

pub struct SqlxGalleryRepository {
    pool: DynDatabasePool,
}

impl SqlxGalleryRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn GalleryRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl GalleryRepository for SqlxGalleryRepository {
    async fn list(&self) -> Result<Vec<Gallery>> {
        dispatch!(self.pool, list())
    }

    async fn get(&self, id: i64) -> Result<Option<Gallery>> {
        dispatch!(self.pool, get(id))
    }

    async fn max_order(&self) -> Result<i32> {
        dispatch!(self.pool, max_order())
    }

    async fn create(&self, gallery: &Gallery) -> Result<Gallery> {
        dispatch!(self.pool, create(gallery))
    }

    async fn update(&self, gallery: &Gallery) -> Result<()> {
        dispatch!(self.pool, update(gallery))
    }

    async fn soft_delete(&self, id: i64) -> Result<bool> {
        dispatch!(self.pool, soft_delete(id))
    }

    async fn set_order(&self, id: i64, order: i32) -> Result<bool> {
        dispatch!(self.pool, set_order(id, order))
    }
}

const GALLERY_SELECT: &str = "SELECT id, gallery_name_en, gallery_name_fr, description_en, description_fr, \
     `order`, member_only, date_created, added_by, date_updated, updated_by, status FROM gallery";

macro_rules! gallery_queries {
    ($module:ident, $pool:ty, $row:ty) => {
        mod $module {
            use super::*;

            pub(super) async fn list(pool: &$pool) -> Result<Vec<Gallery>> {
                let sql = format!("{} WHERE status != 2 ORDER BY `order` ASC, id ASC", GALLERY_SELECT);
                let rows = sqlx::query(&sql)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list galleries")?;
                rows.iter().map(row_to_gallery).collect()
            }

            pub(super) async fn get(pool: &$pool, id: i64) -> Result<Option<Gallery>> {
                let sql = format!("{} WHERE id = ? AND status != 2", GALLERY_SELECT);
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get gallery")?;
                row.as_ref().map(row_to_gallery).transpose()
            }

            pub(super) async fn max_order(pool: &$pool) -> Result<i32> {
                let row = sqlx::query("SELECT MAX(`order`) AS max_order FROM gallery WHERE status != 2")
                    .fetch_one(pool)
                    .await
                    .context("Failed to read max gallery order")?;
                let max: Option<i32> = row.try_get("max_order")?;
                Ok(max.unwrap_or(0))
            }

            pub(super) async fn create(pool: &$pool, gallery: &Gallery) -> Result<Gallery> {
                let result = sqlx::query(
                    "INSERT INTO gallery (gallery_name_en, gallery_name_fr, description_en, description_fr, \
                     `order`, member_only, date_created, added_by, status) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(&gallery.gallery_name_en)
                .bind(&gallery.gallery_name_fr)
                .bind(&gallery.description_en)
                .bind(&gallery.description_fr)
                .bind(gallery.order)
                .bind(gallery.member_only)
                .bind(gallery.date_created)
                .bind(gallery.added_by)
                .bind(gallery.status.as_i32())
                .execute(pool)
                .await
                .context("Failed to create gallery")?;

                Ok(Gallery {
                    id: result.insert_id(),
                    ..gallery.clone()
                })
            }

            pub(super) async fn update(pool: &$pool, gallery: &Gallery) -> Result<()> {
                sqlx::query(
                    "UPDATE gallery SET gallery_name_en = ?, gallery_name_fr = ?, description_en = ?, \
                     description_fr = ?, `order` = ?, member_only = ?, date_updated = ?, updated_by = ? \
                     WHERE id = ? AND status != 2",
                )
                .bind(&gallery.gallery_name_en)
                .bind(&gallery.gallery_name_fr)
                .bind(&gallery.description_en)
                .bind(&gallery.description_fr)
                .bind(gallery.order)
                .bind(gallery.member_only)
                .bind(gallery.date_updated)
                .bind(gallery.updated_by)
                .bind(gallery.id)
                .execute(pool)
                .await
                .context("Failed to update gallery")?;
                Ok(())
            }

            pub(super) async fn soft_delete(pool: &$pool, id: i64) -> Result<bool> {
                let mut tx = pool.begin().await.context("Failed to begin transaction")?;

                let result = sqlx::query("UPDATE gallery SET status = 2 WHERE id = ? AND status != 2")
                    .bind(id)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to delete gallery")?;
                if result.rows_affected() == 0 {
                    return Ok(false);
                }

                sqlx::query("UPDATE gallery_images SET status = 2 WHERE gallery_id = ? AND status != 2")
                    .bind(id)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to delete gallery images")?;

                tx.commit().await.context("Failed to commit gallery delete")?;
                Ok(true)
            }

            pub(super) async fn set_order(pool: &$pool, id: i64, order: i32) -> Result<bool> {
                let mut tx = pool.begin().await.context("Failed to begin transaction")?;

                let current = sqlx::query("SELECT `order` FROM gallery WHERE id = ? AND status != 2")
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await
                    .context("Failed to read gallery order")?;
                let Some(current) = current else {
                    return Ok(false);
                };
                let previous: i32 = current.try_get("order")?;

                sqlx::query("UPDATE gallery SET `order` = ? WHERE `order` = ? AND id != ? AND status != 2")
                    .bind(previous)
                    .bind(order)
                    .bind(id)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to swap gallery order")?;
                sqlx::query("UPDATE gallery SET `order` = ? WHERE id = ?")
                    .bind(order)
                    .bind(id)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to update gallery order")?;

                tx.commit().await.context("Failed to commit gallery order")?;
                Ok(true)
            }

            fn row_to_gallery(row: &$row) -> Result<Gallery> {
                Ok(Gallery {
                    id: row.try_get("id")?,
                    gallery_name_en: row.try_get("gallery_name_en")?,
                    gallery_name_fr: row.try_get("gallery_name_fr")?,
                    description_en: row.try_get("description_en")?,
                    description_fr: row.try_get("description_fr")?,
                    order: row.try_get("order")?,
                    member_only: row.try_get("member_only")?,
                    date_created: row.try_get("date_created")?,
                    added_by: row.try_get("added_by")?,
                    date_updated: row.try_get("date_updated")?,
                    updated_by: row.try_get("updated_by")?,
                    status: decode_status(row.try_get("status")?)?,
                })
            }
        }
    };
}

gallery_queries!(sqlite, sqlx::SqlitePool, sqlx::sqlite::SqliteRow);
gallery_queries!(mysql, sqlx::MySqlPool, sqlx::mysql::MySqlRow);
