//! Media storage on the local filesystem
//!
//! Everything lives under `storage.root`, split per club:
//!
//! ```text
//! images/clubs/{club}/news/               news images
//! images/clubs/{club}/news/thumbnail/     news thumbnails
//! images/clubs/{club}/gallery/{id}/       gallery images (+ thumbnail/)
//! images/clubs/{club}/slider/             slider images
//! files/clubs/{club}/news/                editor documents
//! ```
//!
//! The same relative paths are served statically, so a stored file's public
//! URL is its relative path with a leading `/`.

use chrono::Utc;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::config::StorageConfig;

/// Extensions accepted for image uploads
pub const IMAGE_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "gif", "webp"];

/// Extensions accepted for editor document uploads
pub const DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt", "csv", "zip", "rar", "7z", "svg",
];

/// Extensions listed by the editor image browser
const LISTED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg"];

const MAX_CLUB_ID_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid club id: {0}")]
    InvalidClub(String),

    #[error("Only image files are allowed (jpeg, jpg, png, gif, webp): {0}")]
    NotAnImage(String),

    #[error("File type not allowed: {0}")]
    FileTypeNotAllowed(String),

    #[error("File too large. Maximum size: {limit} bytes ({} MB)", .limit / 1024 / 1024)]
    TooLarge { limit: u64 },

    #[error("Could not process image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A file received in a multipart form
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            data,
        }
    }

    /// Lowercased extension without the dot
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Where a file goes inside a club's storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    NewsImages,
    NewsThumbnails,
    GalleryImages(i64),
    GalleryThumbnails(i64),
    Slider,
    NewsFiles,
}

impl Area {
    fn relative(&self, club: &str) -> String {
        match self {
            Area::NewsImages => format!("images/clubs/{}/news", club),
            Area::NewsThumbnails => format!("images/clubs/{}/news/thumbnail", club),
            Area::GalleryImages(id) => format!("images/clubs/{}/gallery/{}", club, id),
            Area::GalleryThumbnails(id) => format!("images/clubs/{}/gallery/{}/thumbnail", club, id),
            Area::Slider => format!("images/clubs/{}/slider", club),
            Area::NewsFiles => format!("files/clubs/{}/news", club),
        }
    }
}

/// Name and public URL of a stored file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub url: String,
    pub filename: String,
}

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub filename: String,
    pub url: String,
    pub size: u64,
}

/// Club media storage rooted at `storage.root`
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
    max_image_size: u64,
    max_file_size: u64,
    thumbnail_size: u32,
}

impl MediaStorage {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: config.root.clone(),
            max_image_size: config.max_image_size,
            max_file_size: config.max_file_size,
            thumbnail_size: config.thumbnail_size,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of `area` for `club`, after checking the club id
    pub fn dir(&self, club: &str, area: Area) -> Result<PathBuf, StorageError> {
        validate_club_id(club)?;
        Ok(self.root.join(area.relative(club)))
    }

    pub fn url(&self, club: &str, area: Area, filename: &str) -> String {
        format!("/{}/{}", area.relative(club), filename)
    }

    /// Check an image upload and return its lowercased extension
    pub fn validate_image(&self, file: &UploadedFile) -> Result<String, StorageError> {
        let ext = file
            .extension()
            .filter(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
            .ok_or_else(|| StorageError::NotAnImage(file.file_name.clone()))?;

        let mime = file.content_type.as_deref().unwrap_or("").to_ascii_lowercase();
        if !IMAGE_EXTENSIONS.iter().any(|allowed| mime.contains(allowed)) {
            return Err(StorageError::NotAnImage(file.file_name.clone()));
        }

        if file.size() > self.max_image_size {
            return Err(StorageError::TooLarge {
                limit: self.max_image_size,
            });
        }
        Ok(ext)
    }

    /// Check an editor document upload and return its lowercased extension
    pub fn validate_document(&self, file: &UploadedFile) -> Result<String, StorageError> {
        let ext = file
            .extension()
            .filter(|ext| DOCUMENT_EXTENSIONS.contains(&ext.as_str()))
            .ok_or_else(|| StorageError::FileTypeNotAllowed(file.file_name.clone()))?;

        if file.size() > self.max_file_size {
            return Err(StorageError::TooLarge {
                limit: self.max_file_size,
            });
        }
        Ok(ext)
    }

    /// Store an image as `{prefix}_{millis}.{ext}` and return the file name
    pub async fn save_image(
        &self,
        club: &str,
        area: Area,
        prefix: &str,
        file: &UploadedFile,
    ) -> Result<String, StorageError> {
        let ext = self.validate_image(file)?;
        let dir = self.dir(club, area)?;
        tokio::fs::create_dir_all(&dir).await?;

        let filename = write_timestamped(&dir, prefix, &ext, &file.data).await?;
        tracing::debug!("Saved image {}/{}", dir.display(), filename);
        Ok(filename)
    }

    /// Store a thumbnail rendered from `file`
    ///
    /// The image is scaled down to fit the configured square and keeps the
    /// source format. Smaller images are re-encoded at their own size.
    pub async fn save_thumbnail(
        &self,
        club: &str,
        area: Area,
        prefix: &str,
        file: &UploadedFile,
    ) -> Result<String, StorageError> {
        let ext = self.validate_image(file)?;
        let dir = self.dir(club, area)?;

        let data = file.data.clone();
        let size = self.thumbnail_size;
        let format_ext = ext.clone();
        let rendered = tokio::task::spawn_blocking(move || render_thumbnail(&data, &format_ext, size)).await??;

        tokio::fs::create_dir_all(&dir).await?;
        let filename = write_timestamped(&dir, prefix, &ext, &rendered).await?;
        tracing::debug!("Saved thumbnail {}/{}", dir.display(), filename);
        Ok(filename)
    }

    /// Store an editor document under its sanitized name, adding `_v2`,
    /// `_v3`... when the name is taken
    pub async fn save_document(&self, club: &str, file: &UploadedFile) -> Result<String, StorageError> {
        let ext = self.validate_document(file)?;
        let dir = self.dir(club, Area::NewsFiles)?;
        tokio::fs::create_dir_all(&dir).await?;

        let stem = sanitize_stem(&file.file_name);
        let mut version = 1u32;
        loop {
            let filename = if version == 1 {
                format!("{}.{}", stem, ext)
            } else {
                format!("{}_v{}.{}", stem, version, ext)
            };
            match create_new(&dir.join(&filename), &file.data).await {
                Ok(()) => {
                    tracing::debug!("Saved document {}/{}", dir.display(), filename);
                    return Ok(filename);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => version += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Delete a stored file. Missing files are ignored and other failures
    /// are only logged.
    pub async fn remove(&self, club: &str, area: Area, filename: &str) {
        if !is_plain_file_name(filename) {
            tracing::warn!("Refusing to remove suspicious file name: {}", filename);
            return;
        }
        let dir = match self.dir(club, area) {
            Ok(dir) => dir,
            Err(e) => {
                tracing::warn!("Cannot remove {}: {}", filename, e);
                return;
            }
        };
        let path = dir.join(filename);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::debug!("Removed {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
        }
    }

    /// Images in `area`, sorted by file name
    pub async fn list_images(&self, club: &str, area: Area) -> Result<Vec<FileEntry>, StorageError> {
        self.list(club, area, |name| {
            Path::new(name)
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| LISTED_IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .await
    }

    /// Every file in `area`, sorted by file name
    pub async fn list_files(&self, club: &str, area: Area) -> Result<Vec<FileEntry>, StorageError> {
        self.list(club, area, |_| true).await
    }

    async fn list<F>(&self, club: &str, area: Area, keep: F) -> Result<Vec<FileEntry>, StorageError>
    where
        F: Fn(&str) -> bool,
    {
        let dir = self.dir(club, area)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut listing = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let Ok(filename) = entry.file_name().into_string() else {
                continue;
            };
            if !keep(&filename) {
                continue;
            }
            listing.push(FileEntry {
                url: self.url(club, area, &filename),
                size: metadata.len(),
                filename,
            });
        }

        listing.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(listing)
    }
}

/// A club id must be usable as a single path segment
pub fn validate_club_id(club: &str) -> Result<(), StorageError> {
    let valid = !club.is_empty()
        && club.len() <= MAX_CLUB_ID_LEN
        && club.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidClub(club.to_string()))
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name) && name != ".."
}

/// Keep the original file stem but only with characters safe in a URL path
fn sanitize_stem(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    let cleaned: String = stem
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_matches('_');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

async fn write_timestamped(dir: &Path, prefix: &str, ext: &str, data: &[u8]) -> Result<String, StorageError> {
    let mut stamp = Utc::now().timestamp_millis();
    loop {
        let filename = format!("{}_{}.{}", prefix, stamp, ext);
        match create_new(&dir.join(&filename), data).await {
            Ok(()) => return Ok(filename),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => stamp += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

async fn create_new(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(data).await?;
    file.flush().await
}

fn render_thumbnail(data: &[u8], ext: &str, size: u32) -> Result<Vec<u8>, StorageError> {
    let format = ImageFormat::from_extension(ext).ok_or_else(|| StorageError::NotAnImage(ext.to_string()))?;
    let image = image::load_from_memory(data)?;

    let image = if image.width() > size || image.height() > size {
        image.thumbnail(size, size)
    } else {
        image
    };
    // JPEG has no alpha channel
    let image = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()),
        _ => image,
    };

    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, format)?;
    Ok(out.into_inner())
}
