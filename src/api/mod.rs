//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP endpoints of the club site backend:
//! - Health, database diagnostics and site info
//! - News (admin, public and rich text editor uploads)
//! - Galleries and gallery images
//! - Homepage slider
//! - Navigation menu
//! - Static serving of uploaded media

pub mod extract;
pub mod form;
pub mod gallery;
pub mod health;
pub mod menu;
pub mod middleware;
pub mod news;
pub mod responses;
pub mod slider;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::Config;

pub use middleware::{locale_redirect_target, ApiError, AppState};

/// Build the `/api` router
pub fn build_api_router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/news", news::router())
        .nest("/gallery", gallery::router())
        .nest("/slider", slider::router())
        .nest("/menu", menu::router())
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, config: &Config) -> Router {
    let media_root = &config.storage.root;

    Router::new()
        .nest("/api", build_api_router())
        .nest_service("/images", ServeDir::new(media_root.join("images")))
        .nest_service("/files", ServeDir::new(media_root.join("files")))
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(config.storage.body_limit()))
        .layer(axum_middleware::from_fn(middleware::locale_redirect))
        .layer(cors_layer(&config.server.cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

fn cors_layer(origin: &str) -> CorsLayer {
    let allow_origin = match origin.trim() {
        "*" | "" => AllowOrigin::from(Any),
        origin => match origin.parse::<HeaderValue>() {
            Ok(value) => AllowOrigin::exact(value),
            Err(_) => {
                tracing::warn!("Invalid CORS origin {:?}, allowing any origin", origin);
                AllowOrigin::from(Any)
            }
        },
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
