//! Navigation menu service

use std::sync::Arc;

use super::ServiceError;
use crate::db::repositories::MenuRepository;
use crate::models::{Language, MenuItem};

pub struct MenuService {
    repo: Arc<dyn MenuRepository>,
}

impl MenuService {
    pub fn new(repo: Arc<dyn MenuRepository>) -> Self {
        Self { repo }
    }

    /// Menu tree for `language`, rebuilt on every call
    pub async fn menu_tree(&self, language: Language) -> Result<Vec<MenuItem>, ServiceError> {
        Ok(self.repo.visible_tree(language).await?)
    }
}
