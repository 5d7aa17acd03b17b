//! Homepage slider service

use chrono::Utc;
use std::sync::Arc;

use super::storage::{Area, MediaStorage, UploadedFile};
use super::{non_blank, require_club_id, ServiceError};
use crate::db::repositories::SliderRepository;
use crate::models::{Language, RecordStatus, Slider, SliderInput};

/// Image uploads of a slider form
#[derive(Debug, Clone, Default)]
pub struct SliderUploads {
    pub image_en: Option<UploadedFile>,
    pub image_fr: Option<UploadedFile>,
}

impl SliderUploads {
    pub fn image(&self, language: Language) -> Option<&UploadedFile> {
        match language {
            Language::En => self.image_en.as_ref(),
            Language::Fr => self.image_fr.as_ref(),
        }
    }
}

pub struct SliderService {
    repo: Arc<dyn SliderRepository>,
    storage: Arc<MediaStorage>,
}

impl SliderService {
    pub fn new(repo: Arc<dyn SliderRepository>, storage: Arc<MediaStorage>) -> Self {
        Self { repo, storage }
    }

    pub async fn list(&self) -> Result<Vec<Slider>, ServiceError> {
        Ok(self.repo.list().await?)
    }

    /// Slides shown on the homepage
    pub async fn list_active(&self) -> Result<Vec<Slider>, ServiceError> {
        Ok(self.repo.list_active().await?)
    }

    pub async fn get(&self, id: i64) -> Result<Slider, ServiceError> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Slider not found"))
    }

    pub async fn create(&self, input: SliderInput, uploads: SliderUploads) -> Result<Slider, ServiceError> {
        let club = require_club_id(input.club_id.as_deref())?;
        if uploads.image_en.is_none() && uploads.image_fr.is_none() {
            return Err(ServiceError::validation("At least one image (English or French) is required"));
        }
        for file in [&uploads.image_en, &uploads.image_fr].into_iter().flatten() {
            self.storage.validate_image(file)?;
        }

        let mut slider = Slider {
            id: 0,
            image_en: None,
            image_fr: None,
            link_en: non_blank(input.link_en.as_deref()),
            link_fr: non_blank(input.link_fr.as_deref()),
            order: 0,
            status: RecordStatus::Active,
            date_created: Utc::now(),
            added_by: input.added_by,
            date_updated: None,
            updated_by: None,
        };
        let saved = self.save_images(club, &uploads, &mut slider).await?;

        let created = match self.repo.max_order().await {
            Ok(max) => {
                slider.order = max + 1;
                self.repo.create(&slider).await
            }
            Err(e) => Err(e),
        };
        match created {
            Ok(slider) => {
                tracing::info!("Created slide {}", slider.id);
                Ok(slider)
            }
            Err(e) => {
                self.remove_all(club, saved).await;
                Err(e.into())
            }
        }
    }

    pub async fn update(&self, id: i64, input: SliderInput, uploads: SliderUploads) -> Result<Slider, ServiceError> {
        let mut slider = self.get(id).await?;
        let club = require_club_id(input.club_id.as_deref())?;
        let status = parse_status(input.status.as_deref())?;
        for file in [&uploads.image_en, &uploads.image_fr].into_iter().flatten() {
            self.storage.validate_image(file)?;
        }

        for language in Language::ALL {
            if let Some(link) = input.link(language) {
                slider.set_link(language, non_blank(Some(link)));
            }
        }
        if let Some(status) = status {
            slider.status = status;
        }
        slider.updated_by = input.updated_by;
        slider.date_updated = Some(Utc::now());

        let previous = slider.clone();
        let saved = self.save_images(club, &uploads, &mut slider).await?;

        if let Err(e) = self.repo.update(&slider).await {
            self.remove_all(club, saved).await;
            return Err(e.into());
        }

        for language in Language::ALL {
            if uploads.image(language).is_none() {
                continue;
            }
            if let Some(old) = previous.image(language) {
                self.storage.remove(club, Area::Slider, old).await;
            }
        }

        tracing::info!("Updated slide {}", id);
        Ok(slider)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if !self.repo.soft_delete(id).await? {
            return Err(ServiceError::not_found("Slider not found"));
        }
        tracing::info!("Deleted slide {}", id);
        Ok(())
    }

    pub async fn set_order(&self, id: i64, order: i32) -> Result<(), ServiceError> {
        if !self.repo.set_order(id, order).await? {
            return Err(ServiceError::not_found("Slider not found"));
        }
        Ok(())
    }

    /// Write the uploaded images and point `slider` at them. Returns the
    /// names written so they can be cleaned up if the row is not saved.
    async fn save_images(
        &self,
        club: &str,
        uploads: &SliderUploads,
        slider: &mut Slider,
    ) -> Result<Vec<String>, ServiceError> {
        let mut saved = Vec::new();
        for language in Language::ALL {
            let Some(file) = uploads.image(language) else {
                continue;
            };
            let prefix = format!("slider_{}", language.code());
            match self.storage.save_image(club, Area::Slider, &prefix, file).await {
                Ok(name) => {
                    slider.set_image(language, Some(name.clone()));
                    saved.push(name);
                }
                Err(e) => {
                    self.remove_all(club, saved).await;
                    return Err(e.into());
                }
            }
        }
        Ok(saved)
    }

    async fn remove_all(&self, club: &str, names: Vec<String>) {
        for name in names {
            self.storage.remove(club, Area::Slider, &name).await;
        }
    }
}

/// Status accepted from a slider form: `0` or `1`
fn parse_status(value: Option<&str>) -> Result<Option<RecordStatus>, ServiceError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some("0") => Ok(Some(RecordStatus::Inactive)),
        Some("1") => Ok(Some(RecordStatus::Active)),
        Some(other) => Err(ServiceError::validation(format!(
            "Invalid status: {}. Use 0 (inactive) or 1 (active)",
            other
        ))),
    }
}
