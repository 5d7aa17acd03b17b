//! Shared API response types
//!
//! Successful responses use the `{"success": true, "data": ...}` envelope.
//! The editor upload and listing endpoints put their payload at the top
//! level instead, which is what the rich text editor expects.

use axum::Json;
use serde::{Deserialize, Serialize};

use crate::services::{FileEntry, StoredFile};

/// Success envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Wrap `data` in the success envelope
pub fn success<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data: Some(data),
    })
}

/// `{"success": true}` with no payload
pub fn done() -> Json<ApiResponse<()>> {
    Json(ApiResponse {
        success: true,
        data: None,
    })
}

/// Id of a newly created record
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedId {
    pub id: i64,
}

/// Response of the editor image and file uploads
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
    pub filename: String,
}

impl From<StoredFile> for UploadResponse {
    fn from(file: StoredFile) -> Self {
        Self {
            success: true,
            url: file.url,
            filename: file.filename,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageListResponse {
    pub success: bool,
    pub images: Vec<FileEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FileListResponse {
    pub success: bool,
    pub files: Vec<FileEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelopes() {
        let json = serde_json::to_value(success(CreatedId { id: 4 }).0).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": {"id": 4}}));

        let json = serde_json::to_value(done().0).unwrap();
        assert_eq!(json, serde_json::json!({"success": true}));
    }
}
