//! Homepage slider API endpoints
//!
//! Create and update are multipart with `image_en`/`image_fr` parts and
//! `link_en`, `link_fr`, `status` and `club_id` fields.

use axum::{
    extract::{Multipart, State},
    routing::{get, put},
    Json, Router,
};

use crate::api::extract::{ApiJson, ApiPath};
use crate::api::form::MultipartForm;
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{done, success, ApiResponse};
use crate::models::{OrderUpdate, Slider, SliderInput};
use crate::services::SliderUploads;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_slides).post(create_slide))
        .route("/public", get(list_active_slides))
        .route("/{id}", get(get_slide).put(update_slide).delete(delete_slide))
        .route("/{id}/order", put(update_order))
}

/// GET /api/slider
async fn list_slides(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Slider>>>, ApiError> {
    Ok(success(state.slider_service.list().await?))
}

/// GET /api/slider/public
async fn list_active_slides(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Slider>>>, ApiError> {
    Ok(success(state.slider_service.list_active().await?))
}

/// GET /api/slider/{id}
async fn get_slide(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> Result<Json<ApiResponse<Slider>>, ApiError> {
    Ok(success(state.slider_service.get(id).await?))
}

/// POST /api/slider
async fn create_slide(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<Slider>>, ApiError> {
    let mut form = MultipartForm::read(multipart).await?;
    let (input, uploads) = slider_form(&mut form)?;
    Ok(success(state.slider_service.create(input, uploads).await?))
}

/// PUT /api/slider/{id}
async fn update_slide(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<Slider>>, ApiError> {
    let mut form = MultipartForm::read(multipart).await?;
    let (input, uploads) = slider_form(&mut form)?;
    Ok(success(state.slider_service.update(id, input, uploads).await?))
}

/// DELETE /api/slider/{id}
async fn delete_slide(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.slider_service.delete(id).await?;
    Ok(done())
}

/// PUT /api/slider/{id}/order
async fn update_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<OrderUpdate>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.slider_service.set_order(id, body.order).await?;
    Ok(done())
}

fn slider_form(form: &mut MultipartForm) -> Result<(SliderInput, SliderUploads), ApiError> {
    let input = SliderInput {
        club_id: form.owned("club_id"),
        link_en: form.owned("link_en"),
        link_fr: form.owned("link_fr"),
        status: form.owned("status"),
        added_by: form.parse("added_by")?,
        updated_by: form.parse("updated_by")?,
    };
    let uploads = SliderUploads {
        image_en: form.take_file("image_en"),
        image_fr: form.take_file("image_fr"),
    };
    Ok((input, uploads))
}
