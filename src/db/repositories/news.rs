//! News repository
//!
//! Covers the `news` parent table and its `news_content` language rows.
//! Rows with status 2 are soft-deleted and never returned.

use crate::db::DynDatabasePool;
use crate::models::{Language, LocalizedNews, News, NewsContent};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

use super::{decode_status, InsertId};

#[async_trait]
pub trait NewsRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<News>>;
    async fn get(&self, id: i64) -> Result<Option<News>>;
    async fn list_contents(&self, news_id: i64) -> Result<Vec<NewsContent>>;
    async fn list_all_contents(&self) -> Result<Vec<NewsContent>>;
    async fn list_public(&self, language: Language) -> Result<Vec<LocalizedNews>>;
    async fn get_public_by_slug(&self, slug: &str, language: Language) -> Result<Option<LocalizedNews>>;
    async fn max_order(&self) -> Result<i32>;
    async fn create(&self, news: &News) -> Result<News>;
    async fn update(&self, news: &News) -> Result<()>;
    async fn create_content(&self, content: &NewsContent) -> Result<NewsContent>;
    async fn update_content(&self, content: &NewsContent) -> Result<()>;
    /// Whether a live content row in `language` already uses `slug`,
    /// ignoring rows that belong to `exclude_news_id`
    async fn slug_exists(&self, slug: &str, language: Language, exclude_news_id: Option<i64>) -> Result<bool>;
    /// Mark the news row and all its content rows deleted
    async fn soft_delete(&self, id: i64) -> Result<bool>;
    /// Move a row to `order`, swapping with the row that held it
    async fn set_order(&self, id: i64, order: i32) -> Result<bool>;
}

pub struct SqlxNewsRepository {
    pool: DynDatabasePool,
}

impl SqlxNewsRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn NewsRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl NewsRepository for SqlxNewsRepository {
    async fn list(&self) -> Result<Vec<News>> {
        dispatch!(self.pool, list())
    }

    async fn get(&self, id: i64) -> Result<Option<News>> {
        dispatch!(self.pool, get(id))
    }

    async fn list_contents(&self, news_id: i64) -> Result<Vec<NewsContent>> {
        dispatch!(self.pool, list_contents(news_id))
    }

    async fn list_all_contents(&self) -> Result<Vec<NewsContent>> {
        dispatch!(self.pool, list_all_contents())
    }

    async fn list_public(&self, language: Language) -> Result<Vec<LocalizedNews>> {
        dispatch!(self.pool, list_public(language))
    }

    async fn get_public_by_slug(&self, slug: &str, language: Language) -> Result<Option<LocalizedNews>> {
        dispatch!(self.pool, get_public_by_slug(slug, language))
    }

    async fn max_order(&self) -> Result<i32> {
        dispatch!(self.pool, max_order())
    }

    async fn create(&self, news: &News) -> Result<News> {
        dispatch!(self.pool, create(news))
    }

    async fn update(&self, news: &News) -> Result<()> {
        dispatch!(self.pool, update(news))
    }

    async fn create_content(&self, content: &NewsContent) -> Result<NewsContent> {
        dispatch!(self.pool, create_content(content))
    }

    async fn update_content(&self, content: &NewsContent) -> Result<()> {
        dispatch!(self.pool, update_content(content))
    }

    async fn slug_exists(&self, slug: &str, language: Language, exclude_news_id: Option<i64>) -> Result<bool> {
        dispatch!(self.pool, slug_exists(slug, language, exclude_news_id))
    }

    async fn soft_delete(&self, id: i64) -> Result<bool> {
        dispatch!(self.pool, soft_delete(id))
    }

    async fn set_order(&self, id: i64, order: i32) -> Result<bool> {
        dispatch!(self.pool, set_order(id, order))
    }
}

const NEWS_SELECT: &str = "SELECT id, author, news_date, show_in_homepage, `order`, post_to_public, \
     post_to_member, date_added, status FROM news";

const CONTENT_COLUMNS: &str = "c.id, c.news_id, c.language_id, c.title, c.summary, c.article, \
     c.image_filename, c.image_thumbnail, c.slug_url, c.date_added, c.added_by, c.date_updated, \
     c.updated_by, c.status";

const PUBLIC_SELECT: &str = "SELECT n.id, n.author, n.news_date, n.show_in_homepage, n.`order`, \
     n.post_to_public, n.post_to_member, n.date_added, n.status, c.id AS content_id, c.language_id, \
     c.title, c.summary, c.article, c.image_filename, c.image_thumbnail, c.slug_url \
     FROM news n INNER JOIN news_content c \
     ON c.news_id = n.id AND c.language_id = ? AND c.status != 2 \
     WHERE n.status != 2 AND n.post_to_public = 1";

const PUBLIC_ORDER: &str = "ORDER BY n.`order` ASC, n.news_date DESC, n.id DESC";

macro_rules! news_queries {
    ($module:ident, $pool:ty, $row:ty) => {
        mod $module {
            use super::*;

            pub(super) async fn list(pool: &$pool) -> Result<Vec<News>> {
                let sql = format!("{} WHERE status != 2 ORDER BY `order` ASC, news_date DESC, id DESC", NEWS_SELECT);
                let rows = sqlx::query(&sql)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list news")?;
                rows.iter().map(row_to_news).collect()
            }

            pub(super) async fn get(pool: &$pool, id: i64) -> Result<Option<News>> {
                let sql = format!("{} WHERE id = ? AND status != 2", NEWS_SELECT);
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get news")?;
                row.as_ref().map(row_to_news).transpose()
            }

            pub(super) async fn list_contents(pool: &$pool, news_id: i64) -> Result<Vec<NewsContent>> {
                let sql = format!(
                    "SELECT {} FROM news_content c WHERE c.news_id = ? AND c.status != 2 \
                     AND c.language_id IN (1, 2) ORDER BY c.language_id, c.id",
                    CONTENT_COLUMNS
                );
                let rows = sqlx::query(&sql)
                    .bind(news_id)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list news content")?;
                rows.iter().map(row_to_content).collect()
            }

            pub(super) async fn list_all_contents(pool: &$pool) -> Result<Vec<NewsContent>> {
                let sql = format!(
                    "SELECT {} FROM news_content c INNER JOIN news n ON n.id = c.news_id \
                     WHERE c.status != 2 AND n.status != 2 AND c.language_id IN (1, 2) \
                     ORDER BY c.news_id, c.language_id, c.id",
                    CONTENT_COLUMNS
                );
                let rows = sqlx::query(&sql)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list news content")?;
                rows.iter().map(row_to_content).collect()
            }

            pub(super) async fn list_public(pool: &$pool, language: Language) -> Result<Vec<LocalizedNews>> {
                let sql = format!("{} {}", PUBLIC_SELECT, PUBLIC_ORDER);
                let rows = sqlx::query(&sql)
                    .bind(language.id())
                    .fetch_all(pool)
                    .await
                    .context("Failed to list public news")?;
                rows.iter().map(row_to_localized).collect()
            }

            pub(super) async fn get_public_by_slug(
                pool: &$pool,
                slug: &str,
                language: Language,
            ) -> Result<Option<LocalizedNews>> {
                let sql = format!("{} AND c.slug_url = ? {} LIMIT 1", PUBLIC_SELECT, PUBLIC_ORDER);
                let row = sqlx::query(&sql)
                    .bind(language.id())
                    .bind(slug)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get news by slug")?;
                row.as_ref().map(row_to_localized).transpose()
            }

            pub(super) async fn max_order(pool: &$pool) -> Result<i32> {
                let row = sqlx::query("SELECT MAX(`order`) AS max_order FROM news WHERE status != 2")
                    .fetch_one(pool)
                    .await
                    .context("Failed to read max news order")?;
                let max: Option<i32> = row.try_get("max_order")?;
                Ok(max.unwrap_or(0))
            }

            pub(super) async fn create(pool: &$pool, news: &News) -> Result<News> {
                let result = sqlx::query(
                    "INSERT INTO news (author, news_date, show_in_homepage, `order`, post_to_public, \
                     post_to_member, date_added, status) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(&news.author)
                .bind(news.news_date)
                .bind(news.show_in_homepage)
                .bind(news.order)
                .bind(news.post_to_public)
                .bind(news.post_to_member)
                .bind(news.date_added)
                .bind(news.status.as_i32())
                .execute(pool)
                .await
                .context("Failed to create news")?;

                Ok(News {
                    id: result.insert_id(),
                    ..news.clone()
                })
            }

            pub(super) async fn update(pool: &$pool, news: &News) -> Result<()> {
                sqlx::query(
                    "UPDATE news SET author = ?, news_date = ?, show_in_homepage = ?, `order` = ?, \
                     post_to_public = ?, post_to_member = ? WHERE id = ? AND status != 2",
                )
                .bind(&news.author)
                .bind(news.news_date)
                .bind(news.show_in_homepage)
                .bind(news.order)
                .bind(news.post_to_public)
                .bind(news.post_to_member)
                .bind(news.id)
                .execute(pool)
                .await
                .context("Failed to update news")?;
                Ok(())
            }

            pub(super) async fn create_content(pool: &$pool, content: &NewsContent) -> Result<NewsContent> {
                let result = sqlx::query(
                    "INSERT INTO news_content (news_id, language_id, title, summary, article, image_filename, \
                     image_thumbnail, slug_url, date_added, added_by, status) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(content.news_id)
                .bind(content.language.id())
                .bind(&content.title)
                .bind(&content.summary)
                .bind(&content.article)
                .bind(&content.image_filename)
                .bind(&content.image_thumbnail)
                .bind(&content.slug_url)
                .bind(content.date_added)
                .bind(content.added_by)
                .bind(content.status.as_i32())
                .execute(pool)
                .await
                .context("Failed to create news content")?;

                Ok(NewsContent {
                    id: result.insert_id(),
                    ..content.clone()
                })
            }

            pub(super) async fn update_content(pool: &$pool, content: &NewsContent) -> Result<()> {
                sqlx::query(
                    "UPDATE news_content SET title = ?, summary = ?, article = ?, image_filename = ?, \
                     image_thumbnail = ?, slug_url = ?, date_updated = ?, updated_by = ? \
                     WHERE id = ? AND status != 2",
                )
                .bind(&content.title)
                .bind(&content.summary)
                .bind(&content.article)
                .bind(&content.image_filename)
                .bind(&content.image_thumbnail)
                .bind(&content.slug_url)
                .bind(content.date_updated)
                .bind(content.updated_by)
                .bind(content.id)
                .execute(pool)
                .await
                .context("Failed to update news content")?;
                Ok(())
            }

            pub(super) async fn slug_exists(
                pool: &$pool,
                slug: &str,
                language: Language,
                exclude_news_id: Option<i64>,
            ) -> Result<bool> {
                let row = match exclude_news_id {
                    Some(news_id) => sqlx::query(
                        "SELECT COUNT(*) AS count FROM news_content \
                         WHERE slug_url = ? AND language_id = ? AND status != 2 AND news_id != ?",
                    )
                    .bind(slug)
                    .bind(language.id())
                    .bind(news_id)
                    .fetch_one(pool)
                    .await,
                    None => sqlx::query(
                        "SELECT COUNT(*) AS count FROM news_content \
                         WHERE slug_url = ? AND language_id = ? AND status != 2",
                    )
                    .bind(slug)
                    .bind(language.id())
                    .fetch_one(pool)
                    .await,
                }
                .context("Failed to check slug")?;
                let count: i64 = row.try_get("count")?;
                Ok(count > 0)
            }

            pub(super) async fn soft_delete(pool: &$pool, id: i64) -> Result<bool> {
                let mut tx = pool.begin().await.context("Failed to begin transaction")?;

                let result = sqlx::query("UPDATE news SET status = 2 WHERE id = ? AND status != 2")
                    .bind(id)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to delete news")?;
                if result.rows_affected() == 0 {
                    return Ok(false);
                }

                sqlx::query("UPDATE news_content SET status = 2, date_updated = ? WHERE news_id = ? AND status != 2")
                    .bind(Utc::now())
                    .bind(id)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to delete news content")?;

                tx.commit().await.context("Failed to commit news delete")?;
                Ok(true)
            }

            pub(super) async fn set_order(pool: &$pool, id: i64, order: i32) -> Result<bool> {
                let mut tx = pool.begin().await.context("Failed to begin transaction")?;

                let current = sqlx::query("SELECT `order` FROM news WHERE id = ? AND status != 2")
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await
                    .context("Failed to read news order")?;
                let Some(current) = current else {
                    return Ok(false);
                };
                let previous: i32 = current.try_get("order")?;

                sqlx::query("UPDATE news SET `order` = ? WHERE `order` = ? AND id != ? AND status != 2")
                    .bind(previous)
                    .bind(order)
                    .bind(id)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to swap news order")?;
                sqlx::query("UPDATE news SET `order` = ? WHERE id = ?")
                    .bind(order)
                    .bind(id)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to update news order")?;

                tx.commit().await.context("Failed to commit news order")?;
                Ok(true)
            }

            fn row_to_news(row: &$row) -> Result<News> {
                Ok(News {
                    id: row.try_get("id")?,
                    author: row.try_get("author")?,
                    news_date: row.try_get("news_date")?,
                    show_in_homepage: row.try_get("show_in_homepage")?,
                    order: row.try_get("order")?,
                    post_to_public: row.try_get("post_to_public")?,
                    post_to_member: row.try_get("post_to_member")?,
                    date_added: row.try_get("date_added")?,
                    status: decode_status(row.try_get("status")?)?,
                })
            }

            fn row_to_content(row: &$row) -> Result<NewsContent> {
                let language_id: i32 = row.try_get("language_id")?;
                Ok(NewsContent {
                    id: row.try_get("id")?,
                    news_id: row.try_get("news_id")?,
                    language: Language::from_id(language_id)
                        .ok_or_else(|| anyhow::anyhow!("Unknown language id: {}", language_id))?,
                    title: row.try_get("title")?,
                    summary: row.try_get("summary")?,
                    article: row.try_get("article")?,
                    image_filename: row.try_get("image_filename")?,
                    image_thumbnail: row.try_get("image_thumbnail")?,
                    slug_url: row.try_get("slug_url")?,
                    date_added: row.try_get("date_added")?,
                    added_by: row.try_get("added_by")?,
                    date_updated: row.try_get("date_updated")?,
                    updated_by: row.try_get("updated_by")?,
                    status: decode_status(row.try_get("status")?)?,
                })
            }

            fn row_to_localized(row: &$row) -> Result<LocalizedNews> {
                Ok(LocalizedNews {
                    id: row.try_get("id")?,
                    author: row.try_get("author")?,
                    news_date: row.try_get("news_date")?,
                    show_in_homepage: row.try_get("show_in_homepage")?,
                    order: row.try_get("order")?,
                    post_to_public: row.try_get("post_to_public")?,
                    post_to_member: row.try_get("post_to_member")?,
                    date_added: row.try_get("date_added")?,
                    status: decode_status(row.try_get("status")?)?,
                    content_id: row.try_get("content_id")?,
                    language_id: row.try_get("language_id")?,
                    title: row.try_get("title")?,
                    summary: row.try_get("summary")?,
                    article: row.try_get("article")?,
                    image: row.try_get("image_filename")?,
                    thumbnail: row.try_get("image_thumbnail")?,
                    slug: row.try_get("slug_url")?,
                })
            }
        }
    };
}

news_queries!(sqlite, sqlx::SqlitePool, sqlx::sqlite::SqliteRow);
news_queries!(mysql, sqlx::MySqlPool, sqlx::mysql::MySqlRow);
