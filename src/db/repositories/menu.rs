//! Menu repository
//!
//! Reads the legacy `pages`/`page_content` tables and folds the visible rows
//! into a tree.

use crate::db::DynDatabasePool;
use crate::models::{Language, MenuItem, MenuPage};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[async_trait]
pub trait MenuRepository: Send + Sync {
    /// Public, non-deleted pages shown in the menu that have content in `language`
    async fn list_visible(&self, language: Language) -> Result<Vec<MenuPage>>;

    async fn visible_tree(&self, language: Language) -> Result<Vec<MenuItem>>;
}

pub struct SqlxMenuRepository {
    pool: DynDatabasePool,
}

impl SqlxMenuRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn MenuRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl MenuRepository for SqlxMenuRepository {
    async fn list_visible(&self, language: Language) -> Result<Vec<MenuPage>> {
        dispatch!(self.pool, list_visible(language))
    }

    async fn visible_tree(&self, language: Language) -> Result<Vec<MenuItem>> {
        let pages = self.list_visible(language).await?;
        Ok(build_menu_tree(pages))
    }
}

/// Build the menu tree from flat page rows.
///
/// Roots are top-level rows flagged `is_main_item`. Rows whose parent is not
/// part of `pages` are dropped, and every id appears at most once.
pub fn build_menu_tree(pages: Vec<MenuPage>) -> Vec<MenuItem> {
    let mut page_map: HashMap<i64, MenuPage> = HashMap::new();
    for page in pages {
        page_map.entry(page.id).or_insert(page);
    }

    let mut roots: Vec<i64> = Vec::new();
    let mut children_map: HashMap<i64, Vec<i64>> = HashMap::new();
    for (id, page) in &page_map {
        match page.parent() {
            None if page.is_main_item => roots.push(*id),
            None => {}
            Some(parent_id) => children_map.entry(parent_id).or_default().push(*id),
        }
    }

    let sort_key = |id: &i64| page_map.get(id).map(|p| (p.sort_order, p.id));
    roots.sort_by_key(sort_key);
    for children in children_map.values_mut() {
        children.sort_by_key(sort_key);
    }

    fn build_subtree(
        ids: &[i64],
        page_map: &HashMap<i64, MenuPage>,
        children_map: &HashMap<i64, Vec<i64>>,
        visited: &mut HashSet<i64>,
    ) -> Vec<MenuItem> {
        let mut items = Vec::with_capacity(ids.len());
        for id in ids {
            if !visited.insert(*id) {
                continue;
            }
            let Some(page) = page_map.get(id) else {
                continue;
            };
            let children = match children_map.get(id) {
                Some(child_ids) => build_subtree(child_ids, page_map, children_map, visited),
                None => Vec::new(),
            };
            items.push(MenuItem::with_children(page.clone(), children));
        }
        items
    }

    let mut visited = HashSet::new();
    build_subtree(&roots, &page_map, &children_map, &mut visited)
}

macro_rules! menu_queries {
    ($module:ident, $pool:ty, $row:ty) => {
        mod $module {
            use super::*;

            pub(super) async fn list_visible(pool: &$pool, language: Language) -> Result<Vec<MenuPage>> {
                let rows = sqlx::query(
                    "SELECT p.id, p.parent_id, p.page_type_id, p.sort_order, p.is_main_item, c.title, c.url \
                     FROM pages p INNER JOIN page_content c \
                     ON c.page_id = p.id AND c.language_id = ? AND c.status != 2 \
                     WHERE p.status != 2 AND p.is_public = 1 AND p.show_in_menu = 1 \
                     ORDER BY p.sort_order ASC, p.id ASC",
                )
                .bind(language.id())
                .fetch_all(pool)
                .await
                .context("Failed to list menu pages")?;
                rows.iter().map(row_to_page).collect()
            }

            fn row_to_page(row: &$row) -> Result<MenuPage> {
                Ok(MenuPage {
                    id: row.try_get("id")?,
                    parent_id: row.try_get("parent_id")?,
                    page_type_id: row.try_get("page_type_id")?,
                    sort_order: row.try_get("sort_order")?,
                    is_main_item: row.try_get("is_main_item")?,
                    title: row.try_get("title")?,
                    url: row.try_get("url")?,
                })
            }
        }
    };
}

menu_queries!(sqlite, sqlx::SqlitePool, sqlx::sqlite::SqliteRow);
menu_queries!(mysql, sqlx::MySqlPool, sqlx::mysql::MySqlRow);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use proptest::prelude::*;

    fn page(id: i64, parent_id: Option<i64>, sort_order: i32, is_main_item: bool) -> MenuPage {
        MenuPage {
            id,
            parent_id,
            page_type_id: 1,
            sort_order,
            is_main_item,
            title: format!("Page {}", id),
            url: format!("page-{}", id),
        }
    }

    fn ids(items: &[MenuItem]) -> Vec<i64> {
        items.iter().map(|i| i.id).collect()
    }

    #[test]
    fn test_tree_roots_and_children() {
        let tree = build_menu_tree(vec![
            page(1, None, 2, true),
            page(2, Some(0), 1, true),
            page(3, Some(1), 1, false),
            page(4, Some(1), 0, false),
            page(5, Some(4), 0, false),
        ]);

        assert_eq!(ids(&tree), vec![2, 1]);
        assert!(tree[0].children.is_empty());
        assert_eq!(ids(&tree[1].children), vec![4, 3]);
        assert_eq!(ids(&tree[1].children[0].children), vec![5]);
        assert_eq!(tree[1].children[0].parent_id, Some(1));
        assert_eq!(tree[0].parent_id, None);
    }

    #[test]
    fn test_tree_drops_orphans_and_non_main_roots() {
        let tree = build_menu_tree(vec![
            page(1, None, 0, true),
            page(2, None, 0, false),
            page(3, Some(99), 0, false),
            page(4, Some(2), 0, false),
        ]);

        assert_eq!(ids(&tree), vec![1]);
        assert!(tree[0].children.is_empty());
    }

    #[test]
    fn test_tree_ties_break_on_id() {
        let tree = build_menu_tree(vec![
            page(7, None, 1, true),
            page(3, None, 1, true),
            page(5, None, 0, true),
        ]);
        assert_eq!(ids(&tree), vec![5, 3, 7]);
    }

    #[test]
    fn test_tree_ignores_cycles() {
        let tree = build_menu_tree(vec![page(1, Some(2), 0, true), page(2, Some(1), 0, true)]);
        assert!(tree.is_empty());
    }

    #[tokio::test]
    async fn test_list_visible_filters_rows() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        pool.execute(
            "INSERT INTO pages (id, parent_id, page_type_id, sort_order, is_public, show_in_menu, is_main_item, status) VALUES \
             (1, NULL, 1, 1, 1, 1, 1, 1), \
             (2, 1, 2, 1, 1, 1, 0, 1), \
             (3, NULL, 1, 2, 0, 1, 1, 1), \
             (4, NULL, 1, 3, 1, 0, 1, 1), \
             (5, NULL, 1, 4, 1, 1, 1, 2), \
             (6, NULL, 1, 5, 1, 1, 1, 1)",
        )
        .await
        .unwrap();
        pool.execute(
            "INSERT INTO page_content (page_id, language_id, title, url, status) VALUES \
             (1, 2, 'Accueil', 'accueil', 1), (1, 1, 'Home', 'home', 1), \
             (2, 2, 'Horaire', 'horaire', 1), \
             (3, 2, 'Privé', 'prive', 1), (4, 2, 'Caché', 'cache', 1), \
             (5, 2, 'Supprimé', 'supprime', 1), (6, 2, 'Ancien', 'ancien', 2)",
        )
        .await
        .unwrap();

        let repo = SqlxMenuRepository::new(pool);
        let fr = repo.list_visible(Language::Fr).await.unwrap();
        assert_eq!(fr.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(fr[0].title, "Accueil");
        assert_eq!(fr[1].parent(), Some(1));

        let en_tree = repo.visible_tree(Language::En).await.unwrap();
        assert_eq!(ids(&en_tree), vec![1]);
        assert!(en_tree[0].children.is_empty());

        let fr_tree = repo.visible_tree(Language::Fr).await.unwrap();
        assert_eq!(ids(&fr_tree[0].children), vec![2]);
    }

    fn count(items: &[MenuItem]) -> usize {
        items.iter().map(|i| 1 + count(&i.children)).sum()
    }

    fn collect_ids(items: &[MenuItem], out: &mut Vec<i64>) {
        for item in items {
            out.push(item.id);
            collect_ids(&item.children, out);
        }
    }

    fn arb_pages() -> impl Strategy<Value = Vec<MenuPage>> {
        prop::collection::vec(
            (1i64..30, prop::option::of(0i64..30), 0i32..5, any::<bool>()),
            0..30,
        )
        .prop_map(|rows| {
            rows.into_iter()
                .map(|(id, parent, sort, main)| page(id, parent, sort, main))
                .collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        #[test]
        fn prop_each_page_appears_at_most_once(pages in arb_pages()) {
            let tree = build_menu_tree(pages.clone());
            let mut seen = Vec::new();
            collect_ids(&tree, &mut seen);
            let unique: HashSet<i64> = seen.iter().copied().collect();
            prop_assert_eq!(unique.len(), seen.len());

            let distinct: HashSet<i64> = pages.iter().map(|p| p.id).collect();
            prop_assert!(count(&tree) <= distinct.len());
        }

        #[test]
        fn prop_siblings_are_sorted(pages in arb_pages()) {
            fn check(items: &[MenuItem]) -> bool {
                items.windows(2).all(|w| (w[0].sort_order, w[0].id) <= (w[1].sort_order, w[1].id))
                    && items.iter().all(|i| check(&i.children))
            }
            prop_assert!(check(&build_menu_tree(pages)));
        }

        #[test]
        fn prop_children_point_at_their_parent(pages in arb_pages()) {
            fn check(items: &[MenuItem]) -> bool {
                items.iter().all(|i| i.children.iter().all(|c| c.parent_id == Some(i.id)) && check(&i.children))
            }
            let tree = build_menu_tree(pages);
            prop_assert!(tree.iter().all(|root| root.parent_id.is_none()));
            prop_assert!(check(&tree));
        }
    }
}
