//! Menu API endpoint
//!
//! - GET /api/menu?lang= - navigation tree for a language

use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::extract::ApiQuery;
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{success, ApiResponse};
use crate::models::{Language, MenuItem};

/// `?lang=` query, French when missing or unknown
#[derive(Debug, Default, Deserialize)]
pub struct LangQuery {
    pub lang: Option<String>,
}

impl LangQuery {
    pub fn language(&self) -> Language {
        Language::from_code_or_default(self.lang.as_deref())
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(menu_tree))
}

/// GET /api/menu
async fn menu_tree(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LangQuery>,
) -> Result<Json<ApiResponse<Vec<MenuItem>>>, ApiError> {
    let tree = state.menu_service.menu_tree(query.language()).await?;
    Ok(success(tree))
}
