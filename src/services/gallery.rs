//! Gallery service

use chrono::Utc;
use std::sync::Arc;

use super::{non_blank, ServiceError};
use crate::db::repositories::GalleryRepository;
use crate::models::{Gallery, GalleryInput, RecordStatus};

pub struct GalleryService {
    repo: Arc<dyn GalleryRepository>,
}

impl GalleryService {
    pub fn new(repo: Arc<dyn GalleryRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<Gallery>, ServiceError> {
        Ok(self.repo.list().await?)
    }

    pub async fn get(&self, id: i64) -> Result<Gallery, ServiceError> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Gallery not found"))
    }

    pub async fn create(&self, input: GalleryInput) -> Result<Gallery, ServiceError> {
        let (name_en, name_fr) = validate_names(&input)?;
        let order = match input.order {
            Some(order) => order,
            None => self.repo.max_order().await? + 1,
        };

        let gallery = self
            .repo
            .create(&Gallery {
                id: 0,
                gallery_name_en: name_en,
                gallery_name_fr: name_fr,
                description_en: non_blank(input.description_en.as_deref()),
                description_fr: non_blank(input.description_fr.as_deref()),
                order,
                member_only: input.member_only.unwrap_or(false),
                date_created: Utc::now(),
                added_by: input.added_by,
                date_updated: None,
                updated_by: None,
                status: RecordStatus::Active,
            })
            .await?;

        tracing::info!("Created gallery {}", gallery.id);
        Ok(gallery)
    }

    pub async fn update(&self, id: i64, input: GalleryInput) -> Result<Gallery, ServiceError> {
        let mut gallery = self.get(id).await?;
        let (name_en, name_fr) = validate_names(&input)?;

        gallery.gallery_name_en = name_en;
        gallery.gallery_name_fr = name_fr;
        gallery.description_en = non_blank(input.description_en.as_deref());
        gallery.description_fr = non_blank(input.description_fr.as_deref());
        if let Some(order) = input.order {
            gallery.order = order;
        }
        if let Some(member_only) = input.member_only {
            gallery.member_only = member_only;
        }
        gallery.updated_by = input.updated_by;
        gallery.date_updated = Some(Utc::now());

        self.repo.update(&gallery).await?;
        Ok(gallery)
    }

    /// Soft-delete a gallery together with its images. Files stay on disk.
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if !self.repo.soft_delete(id).await? {
            return Err(ServiceError::not_found("Gallery not found"));
        }
        tracing::info!("Deleted gallery {}", id);
        Ok(())
    }

    pub async fn set_order(&self, id: i64, order: i32) -> Result<(), ServiceError> {
        if !self.repo.set_order(id, order).await? {
            return Err(ServiceError::not_found("Gallery not found"));
        }
        Ok(())
    }
}

fn validate_names(input: &GalleryInput) -> Result<(String, String), ServiceError> {
    let name_en = non_blank(Some(&input.gallery_name_en));
    let name_fr = non_blank(Some(&input.gallery_name_fr));
    match (name_en, name_fr) {
        (Some(en), Some(fr)) => Ok((en, fr)),
        _ => Err(ServiceError::validation(
            "Gallery name is required in both English and French",
        )),
    }
}
