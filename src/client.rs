//! Typed HTTP client for the club site API
//!
//! One async method per backend route. Every response is unwrapped from the
//! `{"success": ..., "data": ...}` envelope; failures come back as
//! [`ClientError::Api`] carrying the HTTP status and the server's message.

use chrono::NaiveDate;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::api::responses::CreatedId;
use crate::models::{
    Gallery, GalleryImage, GalleryInput, Language, LocalizedNews, MenuItem, NewsAdminView,
    NewsContentFields, OrderUpdate, Slider,
};
use crate::services::UploadedFile;

/// Base URL used when none is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:3001";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Multipart body of news create and update requests
#[derive(Debug, Clone, Default)]
pub struct NewsForm {
    pub club_id: String,
    pub author: Option<String>,
    pub news_date: Option<NaiveDate>,
    pub show_in_homepage: Option<bool>,
    pub post_to_public: Option<bool>,
    pub post_to_member: Option<bool>,
    /// Only honoured on update; new items go last
    pub order: Option<i32>,
    pub en: NewsContentFields,
    pub fr: NewsContentFields,
    pub image_en: Option<UploadedFile>,
    pub image_fr: Option<UploadedFile>,
    pub thumbnail_en: Option<UploadedFile>,
    pub thumbnail_fr: Option<UploadedFile>,
    pub added_by: Option<i64>,
    pub updated_by: Option<i64>,
}

impl NewsForm {
    fn into_form(self) -> Result<Form, ClientError> {
        let mut form = Form::new().text("club_id", self.club_id);
        form = text(form, "author", self.author);
        form = text(form, "news_date", self.news_date.map(|d| d.format("%Y-%m-%d").to_string()));
        form = text(form, "show_in_homepage", self.show_in_homepage.map(flag));
        form = text(form, "post_to_public", self.post_to_public.map(flag));
        form = text(form, "post_to_member", self.post_to_member.map(flag));
        form = text(form, "order", self.order.map(|o| o.to_string()));
        form = text(form, "added_by", self.added_by.map(|id| id.to_string()));
        form = text(form, "updated_by", self.updated_by.map(|id| id.to_string()));

        for (code, fields) in [(Language::En.code(), self.en), (Language::Fr.code(), self.fr)] {
            form = text(form, &format!("title_{}", code), fields.title);
            form = text(form, &format!("summary_{}", code), fields.summary);
            form = text(form, &format!("article_{}", code), fields.article);
            form = text(form, &format!("slug_{}", code), fields.slug);
        }

        form = file(form, "image_en", self.image_en)?;
        form = file(form, "image_fr", self.image_fr)?;
        form = file(form, "thumbnail_en", self.thumbnail_en)?;
        file(form, "thumbnail_fr", self.thumbnail_fr)
    }
}

/// Multipart body of slider create and update requests
#[derive(Debug, Clone, Default)]
pub struct SliderForm {
    pub club_id: String,
    pub link_en: Option<String>,
    pub link_fr: Option<String>,
    /// 0 or 1, only honoured on update
    pub status: Option<i32>,
    pub image_en: Option<UploadedFile>,
    pub image_fr: Option<UploadedFile>,
    pub added_by: Option<i64>,
    pub updated_by: Option<i64>,
}

impl SliderForm {
    fn into_form(self) -> Result<Form, ClientError> {
        let mut form = Form::new().text("club_id", self.club_id);
        form = text(form, "link_en", self.link_en);
        form = text(form, "link_fr", self.link_fr);
        form = text(form, "status", self.status.map(|s| s.to_string()));
        form = text(form, "added_by", self.added_by.map(|id| id.to_string()));
        form = text(form, "updated_by", self.updated_by.map(|id| id.to_string()));
        form = file(form, "image_en", self.image_en)?;
        file(form, "image_fr", self.image_fr)
    }
}

fn flag(value: bool) -> String {
    String::from(if value { "1" } else { "0" })
}

fn text(form: Form, name: &str, value: Option<String>) -> Form {
    match value {
        Some(value) => form.text(name.to_string(), value),
        None => form,
    }
}

fn file(form: Form, name: &str, upload: Option<UploadedFile>) -> Result<Form, ClientError> {
    let Some(upload) = upload else {
        return Ok(form);
    };
    let mut part = Part::bytes(upload.data).file_name(upload.file_name);
    if let Some(content_type) = upload.content_type {
        part = part.mime_str(&content_type)?;
    }
    Ok(form.part(name.to_string(), part))
}

/// Strip whitespace, surrounding quotes, trailing `;` and trailing `/`
/// from a configured base URL.
pub fn normalize_base_url(raw: &str) -> String {
    raw.trim()
        .trim_start_matches(['\'', '"'])
        .trim_end_matches(['\'', '"', ';'])
        .trim_end_matches('/')
        .to_string()
}

/// Async client for the club site API
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            http: reqwest::Client::new(),
        }
    }

    /// Client for `CLUBSITE_API_BASE_URL`, or the local default
    pub fn from_env() -> Self {
        let base_url = std::env::var("CLUBSITE_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(&base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // News

    pub async fn news(&self) -> Result<Vec<NewsAdminView>, ClientError> {
        self.data(self.request(Method::GET, "/api/news")).await
    }

    pub async fn news_by_id(&self, id: i64) -> Result<NewsAdminView, ClientError> {
        self.data(self.request(Method::GET, &format!("/api/news/{}", id))).await
    }

    pub async fn public_news(&self, language: Language) -> Result<Vec<LocalizedNews>, ClientError> {
        let request = self
            .request(Method::GET, "/api/news/public")
            .query(&[("lang", language.code())]);
        self.data(request).await
    }

    pub async fn news_by_slug(&self, slug: &str, language: Language) -> Result<LocalizedNews, ClientError> {
        let path = format!("/api/news/slug/{}", urlencoding::encode(slug));
        let request = self.request(Method::GET, &path).query(&[("lang", language.code())]);
        self.data(request).await
    }

    /// Create a news item, returning its id
    pub async fn create_news(&self, form: NewsForm) -> Result<i64, ClientError> {
        let request = self
            .request(Method::POST, "/api/news")
            .multipart(form.into_form()?);
        let created: CreatedId = self.data(request).await?;
        Ok(created.id)
    }

    pub async fn update_news(&self, id: i64, form: NewsForm) -> Result<(), ClientError> {
        let request = self
            .request(Method::PUT, &format!("/api/news/{}", id))
            .multipart(form.into_form()?);
        self.ok(request).await
    }

    pub async fn delete_news(&self, id: i64) -> Result<(), ClientError> {
        self.ok(self.request(Method::DELETE, &format!("/api/news/{}", id))).await
    }

    pub async fn update_news_order(&self, id: i64, order: i32) -> Result<(), ClientError> {
        self.put_order(&format!("/api/news/{}/order", id), order).await
    }

    // Galleries

    pub async fn galleries(&self) -> Result<Vec<Gallery>, ClientError> {
        self.data(self.request(Method::GET, "/api/gallery")).await
    }

    pub async fn gallery(&self, id: i64) -> Result<Gallery, ClientError> {
        self.data(self.request(Method::GET, &format!("/api/gallery/{}", id))).await
    }

    pub async fn create_gallery(&self, input: &GalleryInput) -> Result<Gallery, ClientError> {
        self.data(self.request(Method::POST, "/api/gallery").json(input)).await
    }

    pub async fn update_gallery(&self, id: i64, input: &GalleryInput) -> Result<Gallery, ClientError> {
        self.data(self.request(Method::PUT, &format!("/api/gallery/{}", id)).json(input))
            .await
    }

    pub async fn delete_gallery(&self, id: i64) -> Result<(), ClientError> {
        self.ok(self.request(Method::DELETE, &format!("/api/gallery/{}", id))).await
    }

    pub async fn update_gallery_order(&self, id: i64, order: i32) -> Result<(), ClientError> {
        self.put_order(&format!("/api/gallery/{}/order", id), order).await
    }

    // Gallery images

    pub async fn gallery_images(&self, gallery_id: i64) -> Result<Vec<GalleryImage>, ClientError> {
        self.data(self.request(Method::GET, &format!("/api/gallery/{}/images", gallery_id)))
            .await
    }

    pub async fn upload_gallery_image(
        &self,
        gallery_id: i64,
        club_id: &str,
        image: UploadedFile,
    ) -> Result<GalleryImage, ClientError> {
        let form = file(Form::new().text("club_id", club_id.to_string()), "image", Some(image))?;
        let request = self
            .request(Method::POST, &format!("/api/gallery/{}/images", gallery_id))
            .multipart(form);
        self.data(request).await
    }

    pub async fn delete_gallery_image(&self, gallery_id: i64, image_id: i64, club_id: &str) -> Result<(), ClientError> {
        let request = self
            .request(Method::DELETE, &format!("/api/gallery/{}/images/{}", gallery_id, image_id))
            .json(&serde_json::json!({ "club_id": club_id }));
        self.ok(request).await
    }

    pub async fn update_gallery_image_order(&self, gallery_id: i64, image_id: i64, order: i32) -> Result<(), ClientError> {
        self.put_order(&format!("/api/gallery/{}/images/{}/order", gallery_id, image_id), order)
            .await
    }

    // Slider

    pub async fn sliders(&self) -> Result<Vec<Slider>, ClientError> {
        self.data(self.request(Method::GET, "/api/slider")).await
    }

    /// Active slides, as shown on the homepage
    pub async fn active_sliders(&self) -> Result<Vec<Slider>, ClientError> {
        self.data(self.request(Method::GET, "/api/slider/public")).await
    }

    pub async fn slider(&self, id: i64) -> Result<Slider, ClientError> {
        self.data(self.request(Method::GET, &format!("/api/slider/{}", id))).await
    }

    pub async fn create_slider(&self, form: SliderForm) -> Result<Slider, ClientError> {
        let request = self
            .request(Method::POST, "/api/slider")
            .multipart(form.into_form()?);
        self.data(request).await
    }

    pub async fn update_slider(&self, id: i64, form: SliderForm) -> Result<Slider, ClientError> {
        let request = self
            .request(Method::PUT, &format!("/api/slider/{}", id))
            .multipart(form.into_form()?);
        self.data(request).await
    }

    pub async fn delete_slider(&self, id: i64) -> Result<(), ClientError> {
        self.ok(self.request(Method::DELETE, &format!("/api/slider/{}", id))).await
    }

    pub async fn update_slider_order(&self, id: i64, order: i32) -> Result<(), ClientError> {
        self.put_order(&format!("/api/slider/{}/order", id), order).await
    }

    // Menu

    pub async fn menu(&self, language: Language) -> Result<Vec<MenuItem>, ClientError> {
        let request = self
            .request(Method::GET, "/api/menu")
            .query(&[("lang", language.code())]);
        self.data(request).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    async fn put_order(&self, path: &str, order: i32) -> Result<(), ClientError> {
        self.ok(self.request(Method::PUT, path).json(&OrderUpdate { order }))
            .await
    }

    async fn data<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let mut envelope = self.send(request).await?;
        let data = envelope
            .get_mut("data")
            .map(Value::take)
            .unwrap_or(Value::Null);
        Ok(serde_json::from_value(data)?)
    }

    async fn ok(&self, request: RequestBuilder) -> Result<(), ClientError> {
        self.send(request).await.map(|_| ())
    }

    /// Send a request and return the envelope of a successful response
    async fn send(&self, request: RequestBuilder) -> Result<Value, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        let envelope: Option<Value> = serde_json::from_str(&body).ok();

        let succeeded = envelope
            .as_ref()
            .and_then(|e| e.get("success"))
            .and_then(Value::as_bool)
            .unwrap_or(false);

        match envelope {
            Some(envelope) if status.is_success() && succeeded => Ok(envelope),
            envelope => {
                let message = envelope
                    .as_ref()
                    .and_then(|e| e.get("error"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
                tracing::debug!("API request failed with {}: {}", status, message);
                Err(ClientError::Api {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}
