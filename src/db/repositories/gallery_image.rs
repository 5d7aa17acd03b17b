//! Gallery image repository
//!
//! Image ordering is scoped to the owning gallery.

use crate::db::DynDatabasePool;
use crate::models::GalleryImage;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

use super::{decode_status, InsertId};

#[async_trait]
pub trait GalleryImageRepository: Send + Sync {
    async fn list(&self, gallery_id: i64) -> Result<Vec<GalleryImage>>;
    async fn get(&self, gallery_id: i64, image_id: i64) -> Result<Option<GalleryImage>>;
    async fn max_order(&self, gallery_id: i64) -> Result<i32>;
    async fn create(&self, image: &GalleryImage) -> Result<GalleryImage>;
    async fn soft_delete(&self, gallery_id: i64, image_id: i64) -> Result<bool>;
    async fn set_order(&self, gallery_id: i64, image_id: i64, order: i32) -> Result<bool>;
}

pub struct SqlxGalleryImageRepository {
    pool: DynDatabasePool,
}

impl SqlxGalleryImageRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn GalleryImageRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl GalleryImageRepository for SqlxGalleryImageRepository {
    async fn list(&self, gallery_id: i64) -> Result<Vec<GalleryImage>> {
        dispatch!(self.pool, list(gallery_id))
    }

    async fn get(&self, gallery_id: i64, image_id: i64) -> Result<Option<GalleryImage>> {
        dispatch!(self.pool, get(gallery_id, image_id))
    }

    async fn max_order(&self, gallery_id: i64) -> Result<i32> {
        dispatch!(self.pool, max_order(gallery_id))
    }

    async fn create(&self, image: &GalleryImage) -> Result<GalleryImage> {
        dispatch!(self.pool, create(image))
    }

    async fn soft_delete(&self, gallery_id: i64, image_id: i64) -> Result<bool> {
        dispatch!(self.pool, soft_delete(gallery_id, image_id))
    }

    async fn set_order(&self, gallery_id: i64, image_id: i64, order: i32) -> Result<bool> {
        dispatch!(self.pool, set_order(gallery_id, image_id, order))
    }
}

const IMAGE_SELECT: &str = "SELECT id, gallery_id, image_filename, thumbnail_filename, `order`, \
     date_created, added_by, status FROM gallery_images";

macro_rules! gallery_image_queries {
    ($module:ident, $pool:ty, $row:ty) => {
        mod $module {
            use super::*;

            pub(super) async fn list(pool: &$pool, gallery_id: i64) -> Result<Vec<GalleryImage>> {
                let sql = format!(
                    "{} WHERE gallery_id = ? AND status != 2 ORDER BY `order` ASC, id ASC",
                    IMAGE_SELECT
                );
                let rows = sqlx::query(&sql)
                    .bind(gallery_id)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list gallery images")?;
                rows.iter().map(row_to_image).collect()
            }

            pub(super) async fn get(pool: &$pool, gallery_id: i64, image_id: i64) -> Result<Option<GalleryImage>> {
                let sql = format!("{} WHERE id = ? AND gallery_id = ? AND status != 2", IMAGE_SELECT);
                let row = sqlx::query(&sql)
                    .bind(image_id)
                    .bind(gallery_id)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get gallery image")?;
                row.as_ref().map(row_to_image).transpose()
            }

            pub(super) async fn max_order(pool: &$pool, gallery_id: i64) -> Result<i32> {
                let row = sqlx::query(
                    "SELECT MAX(`order`) AS max_order FROM gallery_images WHERE gallery_id = ? AND status != 2",
                )
                .bind(gallery_id)
                .fetch_one(pool)
                .await
                .context("Failed to read max image order")?;
                let max: Option<i32> = row.try_get("max_order")?;
                Ok(max.unwrap_or(0))
            }

            pub(super) async fn create(pool: &$pool, image: &GalleryImage) -> Result<GalleryImage> {
                let result = sqlx::query(
                    "INSERT INTO gallery_images (gallery_id, image_filename, thumbnail_filename, `order`, \
                     date_created, added_by, status) VALUES (?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(image.gallery_id)
                .bind(&image.image_filename)
                .bind(&image.thumbnail_filename)
                .bind(image.order)
                .bind(image.date_created)
                .bind(image.added_by)
                .bind(image.status.as_i32())
                .execute(pool)
                .await
                .context("Failed to create gallery image")?;

                Ok(GalleryImage {
                    id: result.insert_id(),
                    ..image.clone()
                })
            }

            pub(super) async fn soft_delete(pool: &$pool, gallery_id: i64, image_id: i64) -> Result<bool> {
                let result = sqlx::query(
                    "UPDATE gallery_images SET status = 2 WHERE id = ? AND gallery_id = ? AND status != 2",
                )
                .bind(image_id)
                .bind(gallery_id)
                .execute(pool)
                .await
                .context("Failed to delete gallery image")?;
                Ok(result.rows_affected() > 0)
            }

            pub(super) async fn set_order(pool: &$pool, gallery_id: i64, image_id: i64, order: i32) -> Result<bool> {
                let mut tx = pool.begin().await.context("Failed to begin transaction")?;

                let current = sqlx::query(
                    "SELECT `order` FROM gallery_images WHERE id = ? AND gallery_id = ? AND status != 2",
                )
                .bind(image_id)
                .bind(gallery_id)
                .fetch_optional(&mut *tx)
                .await
                .context("Failed to read image order")?;
                let Some(current) = current else {
                    return Ok(false);
                };
                let previous: i32 = current.try_get("order")?;

                sqlx::query(
                    "UPDATE gallery_images SET `order` = ? \
                     WHERE gallery_id = ? AND `order` = ? AND id != ? AND status != 2",
                )
                .bind(previous)
                .bind(gallery_id)
                .bind(order)
                .bind(image_id)
                .execute(&mut *tx)
                .await
                .context("Failed to swap image order")?;
                sqlx::query("UPDATE gallery_images SET `order` = ? WHERE id = ?")
                    .bind(order)
                    .bind(image_id)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to update image order")?;

                tx.commit().await.context("Failed to commit image order")?;
                Ok(true)
            }

            fn row_to_image(row: &$row) -> Result<GalleryImage> {
                Ok(GalleryImage {
                    id: row.try_get("id")?,
                    gallery_id: row.try_get("gallery_id")?,
                    image_filename: row.try_get("image_filename")?,
                    thumbnail_filename: row.try_get("thumbnail_filename")?,
                    order: row.try_get("order")?,
                    date_created: row.try_get("date_created")?,
                    added_by: row.try_get("added_by")?,
                    status: decode_status(row.try_get("status")?)?,
                })
            }
        }
    };
}

gallery_image_queries!(sqlite, sqlx::SqlitePool, sqlx::sqlite::SqliteRow);
gallery_image_queries!(mysql, sqlx::MySqlPool, sqlx::mysql::MySqlRow);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::models::RecordStatus;
    use chrono::Utc;

    async fn setup() -> SqlxGalleryImageRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool).await.expect("Failed to run migrations");
        SqlxGalleryImageRepository::new(pool)
    }

    fn image(gallery_id: i64, name: &str, order: i32) -> GalleryImage {
        GalleryImage {
            id: 0,
            gallery_id,
            image_filename: name.to_string(),
            thumbnail_filename: name.to_string(),
            order,
            date_created: Utc::now(),
            added_by: None,
            status: RecordStatus::Active,
        }
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_gallery() {
        let repo = setup().await;
        let a = repo.create(&image(1, "a.jpg", 2)).await.unwrap();
        let b = repo.create(&image(1, "b.jpg", 1)).await.unwrap();
        repo.create(&image(2, "c.jpg", 1)).await.unwrap();

        let ids: Vec<i64> = repo.list(1).await.unwrap().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
        assert_eq!(repo.max_order(1).await.unwrap(), 2);
        assert_eq!(repo.max_order(3).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_get_requires_matching_gallery() {
        let repo = setup().await;
        let created = repo.create(&image(1, "a.jpg", 1)).await.unwrap();

        assert!(repo.get(1, created.id).await.unwrap().is_some());
        assert!(repo.get(2, created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_soft_delete() {
        let repo = setup().await;
        let created = repo.create(&image(1, "a.jpg", 1)).await.unwrap();

        assert!(!repo.soft_delete(2, created.id).await.unwrap());
        assert!(repo.soft_delete(1, created.id).await.unwrap());
        assert!(repo.get(1, created.id).await.unwrap().is_none());
        assert!(!repo.soft_delete(1, created.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_set_order_only_swaps_within_gallery() {
        let repo = setup().await;
        let a = repo.create(&image(1, "a.jpg", 1)).await.unwrap();
        let b = repo.create(&image(1, "b.jpg", 2)).await.unwrap();
        let other = repo.create(&image(2, "c.jpg", 2)).await.unwrap();

        assert!(repo.set_order(1, a.id, 2).await.unwrap());
        assert_eq!(repo.get(1, a.id).await.unwrap().unwrap().order, 2);
        assert_eq!(repo.get(1, b.id).await.unwrap().unwrap().order, 1);
        assert_eq!(repo.get(2, other.id).await.unwrap().unwrap().order, 2);
    }
}
