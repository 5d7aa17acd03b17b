//! Multipart form collection
//!
//! Create and update endpoints for news and slides receive
//! `multipart/form-data`. The whole form is read up front into text fields
//! and file parts so handlers can pick values by name.

use axum::extract::Multipart;
use axum::http::StatusCode;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::str::FromStr;

use crate::api::middleware::ApiError;
use crate::models::{parse_flag, Language, NewsContentFields};
use crate::services::UploadedFile;

/// A fully read multipart form
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl MultipartForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field.content_type().map(str::to_string);
                    let data = field.bytes().await.map_err(multipart_error)?;
                    // Browsers send an empty part for an untouched file input
                    if data.is_empty() {
                        continue;
                    }
                    form.files
                        .insert(name, UploadedFile::new(file_name, content_type, data.to_vec()));
                }
                None => {
                    let value = field.text().await.map_err(multipart_error)?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    /// Raw text value, if the field was sent
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn owned(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }

    /// `1`, `true` or `on` when sent; `None` when absent
    pub fn flag(&self, name: &str) -> Option<bool> {
        self.text(name).map(parse_flag)
    }

    /// Parse a non-blank value, rejecting malformed input
    pub fn parse<T: FromStr>(&self, name: &str) -> Result<Option<T>, ApiError> {
        match self.text(name).map(str::trim).filter(|v| !v.is_empty()) {
            None => Ok(None),
            Some(value) => value
                .parse()
                .map(Some)
                .map_err(|_| ApiError::validation_error(format!("Invalid value for {}", name))),
        }
    }

    /// `YYYY-MM-DD`, with any time part ignored
    pub fn date(&self, name: &str) -> Result<Option<NaiveDate>, ApiError> {
        match self.text(name).map(str::trim).filter(|v| !v.is_empty()) {
            None => Ok(None),
            Some(value) => {
                let day = value.get(..10).unwrap_or(value);
                NaiveDate::parse_from_str(day, "%Y-%m-%d")
                    .map(Some)
                    .map_err(|_| ApiError::validation_error(format!("Invalid date for {}", name)))
            }
        }
    }

    /// The `title_{l}`, `summary_{l}`, `article_{l}` and `slug_{l}` fields
    pub fn content_fields(&self, language: Language) -> NewsContentFields {
        let code = language.code();
        NewsContentFields {
            title: self.owned(&format!("title_{}", code)),
            summary: self.owned(&format!("summary_{}", code)),
            article: self.owned(&format!("article_{}", code)),
            slug: self.owned(&format!("slug_{}", code)),
        }
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large(err.body_text())
    } else {
        ApiError::validation_error(format!("Invalid multipart form: {}", err.body_text()))
    }
}
