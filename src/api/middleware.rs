//! API middleware
//!
//! Contains:
//! - Shared application state
//! - The JSON error envelope and its mapping from service errors
//! - The locale prefix redirect applied to front-end paths

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{Config, SiteConfig};
use crate::db::repositories::{
    SqlxGalleryImageRepository, SqlxGalleryRepository, SqlxMenuRepository, SqlxNewsRepository,
    SqlxSliderRepository,
};
use crate::db::DynDatabasePool;
use crate::models::Language;
use crate::services::{
    GalleryImageService, GalleryService, MediaStorage, MenuService, NewsService, ServiceError,
    SliderService,
};

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub news_service: Arc<NewsService>,
    pub gallery_service: Arc<GalleryService>,
    pub gallery_image_service: Arc<GalleryImageService>,
    pub slider_service: Arc<SliderService>,
    pub menu_service: Arc<MenuService>,
    pub site: Arc<SiteConfig>,
}

impl AppState {
    /// Wire repositories and services on top of an open pool
    pub fn new(pool: DynDatabasePool, config: &Config) -> Self {
        let storage = Arc::new(MediaStorage::new(&config.storage));
        let galleries = SqlxGalleryRepository::boxed(pool.clone());

        Self {
            news_service: Arc::new(NewsService::new(
                SqlxNewsRepository::boxed(pool.clone()),
                storage.clone(),
            )),
            gallery_service: Arc::new(GalleryService::new(galleries.clone())),
            gallery_image_service: Arc::new(GalleryImageService::new(
                galleries,
                SqlxGalleryImageRepository::boxed(pool.clone()),
                storage.clone(),
            )),
            slider_service: Arc::new(SliderService::new(
                SqlxSliderRepository::boxed(pool.clone()),
                storage,
            )),
            menu_service: Arc::new(MenuService::new(SqlxMenuRepository::boxed(pool.clone()))),
            site: Arc::new(config.site.clone()),
            pool,
        }
    }
}

/// Error envelope returned by every failing endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub success: bool,
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
            code: code.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new("PAYLOAD_TOO_LARGE", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    pub fn status(&self) -> StatusCode {
        match self.code.as_str() {
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "PAYLOAD_TOO_LARGE" => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(msg) => Self::not_found(msg),
            ServiceError::ValidationError(msg) => Self::validation_error(msg),
            ServiceError::PayloadTooLarge(msg) => Self::payload_too_large(msg),
            ServiceError::InternalError(e) => {
                tracing::error!("Request failed: {:#}", e);
                Self::internal_error(e.to_string())
            }
        }
    }
}

/// Where a front-end path should be redirected, if anywhere.
///
/// API calls, build assets, well-known paths and anything with a file
/// extension pass through. Paths without a language prefix go to the
/// French site, and the legacy landing aliases go to the language root.
pub fn locale_redirect_target(path: &str) -> Option<String> {
    if path.starts_with("/api")
        || path.starts_with("/_app")
        || path.starts_with("/.well-known")
        || path.contains('.')
    {
        return None;
    }

    if !path.starts_with("/fr") && !path.starts_with("/en") {
        return Some(if path == "/" {
            "/fr".to_string()
        } else {
            format!("/fr{}", path)
        });
    }

    let mut segments = path.trim_start_matches('/').splitn(2, '/');
    let lang = segments.next().unwrap_or_default();
    let rest = segments.next().unwrap_or_default().trim_end_matches('/');
    let lang = match lang {
        "fr" => Language::Fr,
        "en" => Language::En,
        _ => return None,
    };
    match rest {
        "accueil" | "default" => Some(format!("/{}", lang.code())),
        _ => None,
    }
}

/// Locale redirect middleware for front-end paths
pub async fn locale_redirect(request: Request, next: Next) -> Response {
    match locale_redirect_target(request.uri().path()) {
        Some(location) => (StatusCode::FOUND, [(header::LOCATION, location)]).into_response(),
        None => next.run(request).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(ApiError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::validation_error("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::payload_too_large("x").status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(ApiError::internal_error("x").status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_envelope_shape() {
        let json = serde_json::to_value(ApiError::not_found("News not found")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"success": false, "error": "News not found", "code": "NOT_FOUND"})
        );
    }

    #[test]
    fn test_service_error_mapping() {
        let err = ApiError::from(ServiceError::validation("Club ID is required"));
        assert_eq!(err.code, "VALIDATION_ERROR");
        assert_eq!(err.error, "Club ID is required");

        let err = ApiError::from(ServiceError::InternalError(anyhow::anyhow!("boom")));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_locale_redirects() {
        assert_eq!(locale_redirect_target("/").as_deref(), Some("/fr"));
        assert_eq!(locale_redirect_target("/news").as_deref(), Some("/fr/news"));
        assert_eq!(locale_redirect_target("/en/accueil").as_deref(), Some("/en"));
        assert_eq!(locale_redirect_target("/fr/default/").as_deref(), Some("/fr"));
        assert_eq!(locale_redirect_target("/fr/news"), None);
        assert_eq!(locale_redirect_target("/en"), None);
    }

    #[test]
    fn test_locale_redirect_skips_assets_and_api() {
        assert_eq!(locale_redirect_target("/api/news"), None);
        assert_eq!(locale_redirect_target("/_app/start.js"), None);
        assert_eq!(locale_redirect_target("/.well-known/security"), None);
        assert_eq!(locale_redirect_target("/favicon.png"), None);
        assert_eq!(locale_redirect_target("/images/clubs/swimdorval/news/a.jpg"), None);
    }
}
