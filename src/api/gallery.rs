//! Gallery API endpoints
//!
//! Galleries take JSON bodies. Images are uploaded as multipart with an
//! `image` part and a `club_id` field.

use axum::{
    extract::{Multipart, State},
    routing::{delete, get, put},
    Json, Router,
};

use crate::api::extract::{ApiJson, ApiPath};
use crate::api::form::MultipartForm;
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{done, success, ApiResponse};
use crate::models::{DeleteGalleryImageInput, Gallery, GalleryImage, GalleryInput, OrderUpdate};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_galleries).post(create_gallery))
        .route(
            "/{id}",
            get(get_gallery).put(update_gallery).delete(delete_gallery),
        )
        .route("/{id}/order", put(update_gallery_order))
        .route("/{id}/images", get(list_images).post(upload_image))
        .route("/{id}/images/{image_id}", delete(delete_image))
        .route("/{id}/images/{image_id}/order", put(update_image_order))
}

/// GET /api/gallery
async fn list_galleries(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Gallery>>>, ApiError> {
    Ok(success(state.gallery_service.list().await?))
}

/// GET /api/gallery/{id}
async fn get_gallery(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<Gallery>>, ApiError> {
    Ok(success(state.gallery_service.get(id).await?))
}

/// POST /api/gallery
async fn create_gallery(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<GalleryInput>,
) -> Result<Json<ApiResponse<Gallery>>, ApiError> {
    Ok(success(state.gallery_service.create(input).await?))
}

/// PUT /api/gallery/{id}
async fn update_gallery(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<GalleryInput>,
) -> Result<Json<ApiResponse<Gallery>>, ApiError> {
    Ok(success(state.gallery_service.update(id, input).await?))
}

/// DELETE /api/gallery/{id}
async fn delete_gallery(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.gallery_service.delete(id).await?;
    Ok(done())
}

/// PUT /api/gallery/{id}/order
async fn update_gallery_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<OrderUpdate>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.gallery_service.set_order(id, body.order).await?;
    Ok(done())
}

/// GET /api/gallery/{id}/images
async fn list_images(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<Vec<GalleryImage>>>, ApiError> {
    Ok(success(state.gallery_image_service.list(id).await?))
}

/// POST /api/gallery/{id}/images
async fn upload_image(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<GalleryImage>>, ApiError> {
    let mut form = MultipartForm::read(multipart).await?;
    let file = form.take_file("image");
    let added_by = form.parse("added_by")?;
    let image = state
        .gallery_image_service
        .upload(id, form.text("club_id"), file, added_by)
        .await?;
    Ok(success(image))
}

/// DELETE /api/gallery/{id}/images/{image_id}
async fn delete_image(
    State(state): State<AppState>,
    ApiPath((id, image_id)): ApiPath<(i64, i64)>,
    ApiJson(body): ApiJson<DeleteGalleryImageInput>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state
        .gallery_image_service
        .delete(id, image_id, body.club_id.as_deref())
        .await?;
    Ok(done())
}

/// PUT /api/gallery/{id}/images/{image_id}/order
async fn update_image_order(
    State(state): State<AppState>,
    ApiPath((id, image_id)): ApiPath<(i64, i64)>,
    ApiJson(body): ApiJson<OrderUpdate>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state
        .gallery_image_service
        .set_order(id, image_id, body.order)
        .await?;
    Ok(done())
}
