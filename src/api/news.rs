//! News API endpoints
//!
//! Handles HTTP requests for news management:
//! - GET /api/news - admin list, both languages flattened
//! - GET /api/news/public?lang= - published items in one language
//! - GET /api/news/slug/{slug}?lang= - one published item
//! - GET /api/news/{id} - admin item
//! - POST /api/news - create (multipart)
//! - PUT /api/news/{id} - update (multipart)
//! - DELETE /api/news/{id} - soft delete
//! - PUT /api/news/{id}/order - reorder
//!
//! The rich text editor also uploads and browses images and documents
//! through `/upload-image`, `/images`, `/upload-file` and `/files`.

use axum::{
    extract::{Multipart, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::form::MultipartForm;
use crate::api::menu::LangQuery;
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{
    done, success, ApiResponse, CreatedId, FileListResponse, ImageListResponse, UploadResponse,
};
use crate::models::{
    CreateNewsInput, Language, LocalizedNews, NewsAdminView, OrderUpdate, UpdateNewsInput,
};
use crate::services::NewsUploads;

/// `?club_id=` query of the editor listings
#[derive(Debug, Deserialize)]
pub struct ClubQuery {
    pub club_id: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_news).post(create_news))
        .route("/public", get(list_public_news))
        .route("/slug/{slug}", get(get_news_by_slug))
        .route("/upload-image", post(upload_editor_image))
        .route("/images", get(list_editor_images))
        .route("/upload-file", post(upload_editor_file))
        .route("/files", get(list_editor_files))
        .route("/{id}", get(get_news).put(update_news).delete(delete_news))
        .route("/{id}/order", put(update_order))
}

/// GET /api/news
async fn list_news(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<NewsAdminView>>>, ApiError> {
    Ok(success(state.news_service.list_admin().await?))
}

/// GET /api/news/public
async fn list_public_news(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LangQuery>,
) -> Result<Json<ApiResponse<Vec<LocalizedNews>>>, ApiError> {
    Ok(success(state.news_service.list_public(query.language()).await?))
}

/// GET /api/news/slug/{slug}
async fn get_news_by_slug(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
    ApiQuery(query): ApiQuery<LangQuery>,
) -> Result<Json<ApiResponse<LocalizedNews>>, ApiError> {
    let item = state
        .news_service
        .get_public_by_slug(&slug, query.language())
        .await?;
    Ok(success(item))
}

/// GET /api/news/{id}
async fn get_news(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<NewsAdminView>>, ApiError> {
    Ok(success(state.news_service.get_admin(id).await?))
}

/// POST /api/news
async fn create_news(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<CreatedId>>, ApiError> {
    let mut form = MultipartForm::read(multipart).await?;
    let input = CreateNewsInput {
        club_id: form.owned("club_id"),
        author: form.owned("author"),
        news_date: form.date("news_date")?,
        show_in_homepage: form.flag("show_in_homepage").unwrap_or(false),
        post_to_public: form.flag("post_to_public").unwrap_or(false),
        post_to_member: form.flag("post_to_member").unwrap_or(false),
        en: form.content_fields(Language::En),
        fr: form.content_fields(Language::Fr),
        added_by: form.parse("added_by")?,
    };
    let uploads = take_uploads(&mut form);

    let id = state.news_service.create(input, uploads).await?;
    Ok(success(CreatedId { id }))
}

/// PUT /api/news/{id}
async fn update_news(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let mut form = MultipartForm::read(multipart).await?;
    let input = UpdateNewsInput {
        club_id: form.owned("club_id"),
        author: form.owned("author"),
        news_date: form.date("news_date")?,
        show_in_homepage: form.flag("show_in_homepage"),
        order: form.parse("order")?,
        post_to_public: form.flag("post_to_public"),
        post_to_member: form.flag("post_to_member"),
        en: form.content_fields(Language::En),
        fr: form.content_fields(Language::Fr),
        updated_by: form.parse("updated_by")?,
    };
    let uploads = take_uploads(&mut form);

    state.news_service.update(id, input, uploads).await?;
    Ok(done())
}

/// DELETE /api/news/{id}
async fn delete_news(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.news_service.delete(id).await?;
    Ok(done())
}

/// PUT /api/news/{id}/order
async fn update_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<OrderUpdate>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.news_service.set_order(id, body.order).await?;
    Ok(done())
}

/// POST /api/news/upload-image
async fn upload_editor_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut form = MultipartForm::read(multipart).await?;
    let file = form.take_file("image");
    let stored = state
        .news_service
        .upload_editor_image(form.text("club_id"), file)
        .await?;
    Ok(Json(stored.into()))
}

/// GET /api/news/images
async fn list_editor_images(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ClubQuery>,
) -> Result<Json<ImageListResponse>, ApiError> {
    let images = state
        .news_service
        .list_editor_images(query.club_id.as_deref())
        .await?;
    Ok(Json(ImageListResponse { success: true, images }))
}

/// POST /api/news/upload-file
async fn upload_editor_file(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut form = MultipartForm::read(multipart).await?;
    let file = form.take_file("file");
    let stored = state
        .news_service
        .upload_editor_file(form.text("club_id"), file)
        .await?;
    Ok(Json(stored.into()))
}

/// GET /api/news/files
async fn list_editor_files(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ClubQuery>,
) -> Result<Json<FileListResponse>, ApiError> {
    let files = state
        .news_service
        .list_editor_files(query.club_id.as_deref())
        .await?;
    Ok(Json(FileListResponse { success: true, files }))
}

fn take_uploads(form: &mut MultipartForm) -> NewsUploads {
    NewsUploads {
        image_en: form.take_file("image_en"),
        image_fr: form.take_file("image_fr"),
        thumbnail_en: form.take_file("thumbnail_en"),
        thumbnail_fr: form.take_file("thumbnail_fr"),
    }
}
