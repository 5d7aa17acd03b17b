//! Services layer - Business logic
//!
//! Services validate input, coordinate repositories with media storage and
//! translate failures into [`ServiceError`] for the HTTP layer.

pub mod gallery;
pub mod gallery_image;
pub mod menu;
pub mod news;
pub mod slider;
pub mod storage;

pub use gallery::GalleryService;
pub use gallery_image::GalleryImageService;
pub use menu::MenuService;
pub use news::{generate_slug, NewsService, NewsUploads};
pub use slider::{SliderService, SliderUploads};
pub use storage::{Area, FileEntry, MediaStorage, StorageError, StoredFile, UploadedFile};

use thiserror::Error;

/// Error type shared by every service
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    ValidationError(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidClub(_)
            | StorageError::NotAnImage(_)
            | StorageError::FileTypeNotAllowed(_)
            | StorageError::Image(_) => Self::ValidationError(err.to_string()),
            StorageError::TooLarge { .. } => Self::PayloadTooLarge(err.to_string()),
            StorageError::Io(_) | StorageError::Task(_) => Self::InternalError(anyhow::Error::new(err)),
        }
    }
}

/// The `club_id` of a request: present, non-blank and a safe path segment
pub fn require_club_id(club_id: Option<&str>) -> Result<&str, ServiceError> {
    let club = club_id
        .map(str::trim)
        .filter(|club| !club.is_empty())
        .ok_or_else(|| ServiceError::validation("Club ID is required"))?;
    storage::validate_club_id(club)?;
    Ok(club)
}

/// Trim a free-text field, mapping blank values to `None`
pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_club_id() {
        assert_eq!(require_club_id(Some(" swimdorval ")).unwrap(), "swimdorval");
        assert!(matches!(require_club_id(None), Err(ServiceError::ValidationError(_))));
        assert!(matches!(require_club_id(Some("  ")), Err(ServiceError::ValidationError(_))));
        assert!(matches!(require_club_id(Some("../x")), Err(ServiceError::ValidationError(_))));
    }

    #[test]
    fn test_storage_errors_map_to_service_errors() {
        let too_large: ServiceError = StorageError::TooLarge { limit: 10 }.into();
        assert!(matches!(too_large, ServiceError::PayloadTooLarge(_)));

        let io: ServiceError = StorageError::Io(std::io::Error::other("disk full")).into();
        assert!(matches!(io, ServiceError::InternalError(_)));
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  hi ")), Some("hi".to_string()));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }
}
