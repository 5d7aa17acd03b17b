//! Slider repository

use crate::db::DynDatabasePool;
use crate::models::Slider;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

use super::{decode_status, InsertId};

#[async_trait]
pub trait SliderRepository: Send + Sync {
    /// Active and inactive slides
    async fn list(&self) -> Result<Vec<Slider>>;
    /// Slides shown on the homepage
    async fn list_active(&self) -> Result<Vec<Slider>>;
    async fn get(&self, id: i64) -> Result<Option<Slider>>;
    async fn max_order(&self) -> Result<i32>;
    async fn create(&self, slider: &Slider) -> Result<Slider>;
    async fn update(&self, slider: &Slider) -> Result<()>;
    async fn soft_delete(&self, id: i64) -> Result<bool>;
    async fn set_order(&self, id: i64, order: i32) -> Result<bool>;
}

pub struct SqlxSliderRepository {
    pool: DynDatabasePool,
}

impl SqlxSliderRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SliderRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SliderRepository for SqlxSliderRepository {
    async fn list(&self) -> Result<Vec<Slider>> {
        dispatch!(self.pool, list())
    }

    async fn list_active(&self) -> Result<Vec<Slider>> {
        dispatch!(self.pool, list_active())
    }

    async fn get(&self, id: i64) -> Result<Option<Slider>> {
        dispatch!(self.pool, get(id))
    }

    async fn max_order(&self) -> Result<i32> {
        dispatch!(self.pool, max_order())
    }

    async fn create(&self, slider: &Slider) -> Result<Slider> {
        dispatch!(self.pool, create(slider))
    }

    async fn update(&self, slider: &Slider) -> Result<()> {
        dispatch!(self.pool, update(slider))
    }

    async fn soft_delete(&self, id: i64) -> Result<bool> {
        dispatch!(self.pool, soft_delete(id))
    }

    async fn set_order(&self, id: i64, order: i32) -> Result<bool> {
        dispatch!(self.pool, set_order(id, order))
    }
}

const SLIDER_SELECT: &str = "SELECT id, image_en, image_fr, link_en, link_fr, `order`, status, \
     date_created, added_by, date_updated, updated_by FROM slider";

macro_rules! slider_queries {
    ($module:ident, $pool:ty, $row:ty) => {
        mod $module {
            use super::*;

            pub(super) async fn list(pool: &$pool) -> Result<Vec<Slider>> {
                let sql = format!("{} WHERE status != 2 ORDER BY `order` ASC, id ASC", SLIDER_SELECT);
                let rows = sqlx::query(&sql)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list slides")?;
                rows.iter().map(row_to_slider).collect()
            }

            pub(super) async fn list_active(pool: &$pool) -> Result<Vec<Slider>> {
                let sql = format!("{} WHERE status = 1 ORDER BY `order` ASC, id ASC", SLIDER_SELECT);
                let rows = sqlx::query(&sql)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list active slides")?;
                rows.iter().map(row_to_slider).collect()
            }

            pub(super) async fn get(pool: &$pool, id: i64) -> Result<Option<Slider>> {
                let sql = format!("{} WHERE id = ? AND status != 2", SLIDER_SELECT);
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get slide")?;
                row.as_ref().map(row_to_slider).transpose()
            }

            pub(super) async fn max_order(pool: &$pool) -> Result<i32> {
                let row = sqlx::query("SELECT MAX(`order`) AS max_order FROM slider WHERE status != 2")
                    .fetch_one(pool)
                    .await
                    .context("Failed to read max slide order")?;
                let max: Option<i32> = row.try_get("max_order")?;
                Ok(max.unwrap_or(0))
            }

            pub(super) async fn create(pool: &$pool, slider: &Slider) -> Result<Slider> {
                let result = sqlx::query(
                    "INSERT INTO slider (image_en, image_fr, link_en, link_fr, `order`, status, \
                     date_created, added_by) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(&slider.image_en)
                .bind(&slider.image_fr)
                .bind(&slider.link_en)
                .bind(&slider.link_fr)
                .bind(slider.order)
                .bind(slider.status.as_i32())
                .bind(slider.date_created)
                .bind(slider.added_by)
                .execute(pool)
                .await
                .context("Failed to create slide")?;

                Ok(Slider {
                    id: result.insert_id(),
                    ..slider.clone()
                })
            }

            pub(super) async fn update(pool: &$pool, slider: &Slider) -> Result<()> {
                sqlx::query(
                    "UPDATE slider SET image_en = ?, image_fr = ?, link_en = ?, link_fr = ?, status = ?, \
                     date_updated = ?, updated_by = ? WHERE id = ? AND status != 2",
                )
                .bind(&slider.image_en)
                .bind(&slider.image_fr)
                .bind(&slider.link_en)
                .bind(&slider.link_fr)
                .bind(slider.status.as_i32())
                .bind(slider.date_updated)
                .bind(slider.updated_by)
                .bind(slider.id)
                .execute(pool)
                .await
                .context("Failed to update slide")?;
                Ok(())
            }

            pub(super) async fn soft_delete(pool: &$pool, id: i64) -> Result<bool> {
                let result = sqlx::query("UPDATE slider SET status = 2 WHERE id = ? AND status != 2")
                    .bind(id)
                    .execute(pool)
                    .await
                    .context("Failed to delete slide")?;
                Ok(result.rows_affected() > 0)
            }

            pub(super) async fn set_order(pool: &$pool, id: i64, order: i32) -> Result<bool> {
                let mut tx = pool.begin().await.context("Failed to begin transaction")?;

                let current = sqlx::query("SELECT `order` FROM slider WHERE id = ? AND status != 2")
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await
                    .context("Failed to read slide order")?;
                let Some(current) = current else {
                    return Ok(false);
                };
                let previous: i32 = current.try_get("order")?;

                sqlx::query("UPDATE slider SET `order` = ? WHERE `order` = ? AND id != ? AND status != 2")
                    .bind(previous)
                    .bind(order)
                    .bind(id)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to swap slide order")?;
                sqlx::query("UPDATE slider SET `order` = ? WHERE id = ?")
                    .bind(order)
                    .bind(id)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to update slide order")?;

                tx.commit().await.context("Failed to commit slide order")?;
                Ok(true)
            }

            fn row_to_slider(row: &$row) -> Result<Slider> {
                Ok(Slider {
                    id: row.try_get("id")?,
                    image_en: row.try_get("image_en")?,
                    image_fr: row.try_get("image_fr")?,
                    link_en: row.try_get("link_en")?,
                    link_fr: row.try_get("link_fr")?,
                    order: row.try_get("order")?,
                    status: decode_status(row.try_get("status")?)?,
                    date_created: row.try_get("date_created")?,
                    added_by: row.try_get("added_by")?,
                    date_updated: row.try_get("date_updated")?,
                    updated_by: row.try_get("updated_by")?,
                })
            }
        }
    };
}

slider_queries!(sqlite, sqlx::SqlitePool, sqlx::sqlite::SqliteRow);
slider_queries!(mysql, sqlx::MySqlPool, sqlx::mysql::MySqlRow);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::models::RecordStatus;
    use chrono::Utc;

    async fn setup() -> SqlxSliderRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool).await.expect("Failed to run migrations");
        SqlxSliderRepository::new(pool)
    }

    fn slide(order: i32, status: RecordStatus) -> Slider {
        Slider {
            id: 0,
            image_en: Some("slider_1.jpg".to_string()),
            image_fr: None,
            link_en: Some("https://example.org".to_string()),
            link_fr: None,
            order,
            status,
            date_created: Utc::now(),
            added_by: None,
            date_updated: None,
            updated_by: None,
        }
    }

    #[tokio::test]
    async fn test_list_and_list_active() {
        let repo = setup().await;
        let active = repo.create(&slide(1, RecordStatus::Active)).await.unwrap();
        let hidden = repo.create(&slide(2, RecordStatus::Inactive)).await.unwrap();

        let all: Vec<i64> = repo.list().await.unwrap().iter().map(|s| s.id).collect();
        assert_eq!(all, vec![active.id, hidden.id]);

        let shown = repo.list_active().await.unwrap();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].id, active.id);
        assert_eq!(shown[0].image_en.as_deref(), Some("slider_1.jpg"));
        assert_eq!(shown[0].image_fr, None);
    }

    #[tokio::test]
    async fn test_update_slide() {
        let repo = setup().await;
        let mut created = repo.create(&slide(1, RecordStatus::Active)).await.unwrap();
        created.image_fr = Some("slider_2.jpg".to_string());
        created.status = RecordStatus::Inactive;
        created.date_updated = Some(Utc::now());
        repo.update(&created).await.unwrap();

        let fetched = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.image_fr.as_deref(), Some("slider_2.jpg"));
        assert_eq!(fetched.status, RecordStatus::Inactive);
        assert!(repo.list_active().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_soft_delete_and_reorder() {
        let repo = setup().await;
        let a = repo.create(&slide(1, RecordStatus::Active)).await.unwrap();
        let b = repo.create(&slide(2, RecordStatus::Active)).await.unwrap();

        assert!(repo.set_order(b.id, 1).await.unwrap());
        assert_eq!(repo.get(a.id).await.unwrap().unwrap().order, 2);

        assert!(repo.soft_delete(a.id).await.unwrap());
        assert!(repo.get(a.id).await.unwrap().is_none());
        assert_eq!(repo.max_order().await.unwrap(), 1);
        assert!(!repo.set_order(a.id, 1).await.unwrap());
    }
}
