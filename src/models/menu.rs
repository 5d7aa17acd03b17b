//! Navigation menu built from the legacy page table

use serde::{Deserialize, Serialize};

/// A visible page row joined with its content in one language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuPage {
    pub id: i64,
    /// `None` or `Some(0)` both mean "top level"
    pub parent_id: Option<i64>,
    pub page_type_id: i32,
    pub sort_order: i32,
    pub is_main_item: bool,
    pub title: String,
    pub url: String,
}

impl MenuPage {
    /// Parent id with the legacy `0` sentinel normalised away
    pub fn parent(&self) -> Option<i64> {
        self.parent_id.filter(|id| *id != 0)
    }
}

/// Menu entry with its children, as sent to the front-end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub title: String,
    pub url: String,
    pub page_type_id: i32,
    pub sort_order: i32,
    pub children: Vec<MenuItem>,
}

impl MenuItem {
    pub fn with_children(page: MenuPage, children: Vec<MenuItem>) -> Self {
        Self {
            id: page.id,
            parent_id: page.parent(),
            title: page.title,
            url: page.url,
            page_type_id: page.page_type_id,
            sort_order: page.sort_order,
            children,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_item_serializes_camel_case() {
        let page = MenuPage {
            id: 4,
            parent_id: Some(0),
            page_type_id: 2,
            sort_order: 1,
            is_main_item: true,
            title: "Accueil".to_string(),
            url: "accueil".to_string(),
        };
        let json = serde_json::to_value(MenuItem::with_children(page, Vec::new())).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 4,
                "parentId": null,
                "title": "Accueil",
                "url": "accueil",
                "pageTypeId": 2,
                "sortOrder": 1,
                "children": []
            })
        );
    }
}
