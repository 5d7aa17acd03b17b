//! Gallery image service
//!
//! Uploaded images are stored under the gallery's directory together with
//! a generated thumbnail.

use chrono::Utc;
use std::sync::Arc;

use super::storage::{Area, MediaStorage, UploadedFile};
use super::{require_club_id, ServiceError};
use crate::db::repositories::{GalleryImageRepository, GalleryRepository};
use crate::models::{GalleryImage, RecordStatus};

pub struct GalleryImageService {
    galleries: Arc<dyn GalleryRepository>,
    images: Arc<dyn GalleryImageRepository>,
    storage: Arc<MediaStorage>,
}

impl GalleryImageService {
    pub fn new(
        galleries: Arc<dyn GalleryRepository>,
        images: Arc<dyn GalleryImageRepository>,
        storage: Arc<MediaStorage>,
    ) -> Self {
        Self {
            galleries,
            images,
            storage,
        }
    }

    pub async fn list(&self, gallery_id: i64) -> Result<Vec<GalleryImage>, ServiceError> {
        self.ensure_gallery(gallery_id).await?;
        Ok(self.images.list(gallery_id).await?)
    }

    pub async fn upload(
        &self,
        gallery_id: i64,
        club_id: Option<&str>,
        file: Option<UploadedFile>,
        added_by: Option<i64>,
    ) -> Result<GalleryImage, ServiceError> {
        let club = require_club_id(club_id)?;
        let file = file.ok_or_else(|| ServiceError::validation("No image file provided"))?;
        self.ensure_gallery(gallery_id).await?;

        let image_filename = self
            .storage
            .save_image(club, Area::GalleryImages(gallery_id), "gallery", &file)
            .await?;
        let thumbnail_filename = match self
            .storage
            .save_thumbnail(club, Area::GalleryThumbnails(gallery_id), "thumb", &file)
            .await
        {
            Ok(name) => name,
            Err(e) => {
                self.storage
                    .remove(club, Area::GalleryImages(gallery_id), &image_filename)
                    .await;
                return Err(e.into());
            }
        };

        let record = GalleryImage {
            id: 0,
            gallery_id,
            image_filename,
            thumbnail_filename,
            order: 0,
            date_created: Utc::now(),
            added_by,
            status: RecordStatus::Active,
        };
        let saved = match self.images.max_order(gallery_id).await {
            Ok(max) => {
                self.images
                    .create(&GalleryImage {
                        order: max + 1,
                        ..record.clone()
                    })
                    .await
            }
            Err(e) => Err(e),
        };

        match saved {
            Ok(image) => {
                tracing::info!("Added image {} to gallery {}", image.id, gallery_id);
                Ok(image)
            }
            Err(e) => {
                self.remove_files(club, &record).await;
                Err(e.into())
            }
        }
    }

    /// Soft-delete an image and remove its files from disk
    pub async fn delete(&self, gallery_id: i64, image_id: i64, club_id: Option<&str>) -> Result<(), ServiceError> {
        let club = require_club_id(club_id)?;
        let image = self
            .images
            .get(gallery_id, image_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Image not found"))?;

        if !self.images.soft_delete(gallery_id, image_id).await? {
            return Err(ServiceError::not_found("Image not found"));
        }

        self.remove_files(club, &image).await;

        tracing::info!("Deleted image {} from gallery {}", image_id, gallery_id);
        Ok(())
    }

    pub async fn set_order(&self, gallery_id: i64, image_id: i64, order: i32) -> Result<(), ServiceError> {
        if !self.images.set_order(gallery_id, image_id, order).await? {
            return Err(ServiceError::not_found("Image not found"));
        }
        Ok(())
    }

    async fn remove_files(&self, club: &str, image: &GalleryImage) {
        self.storage
            .remove(club, Area::GalleryImages(image.gallery_id), &image.image_filename)
            .await;
        self.storage
            .remove(club, Area::GalleryThumbnails(image.gallery_id), &image.thumbnail_filename)
            .await;
    }

    async fn ensure_gallery(&self, gallery_id: i64) -> Result<(), ServiceError> {
        match self.galleries.get(gallery_id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::not_found("Gallery not found")),
        }
    }
}
