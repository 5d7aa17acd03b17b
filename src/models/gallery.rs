//! Gallery and gallery image models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{flag, option_flag, RecordStatus};

/// Photo gallery with a bilingual name and description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gallery {
    pub id: i64,
    pub gallery_name_en: String,
    pub gallery_name_fr: String,
    pub description_en: Option<String>,
    pub description_fr: Option<String>,
    pub order: i32,
    #[serde(with = "flag")]
    pub member_only: bool,
    pub date_created: DateTime<Utc>,
    pub added_by: Option<i64>,
    pub date_updated: Option<DateTime<Utc>>,
    pub updated_by: Option<i64>,
    pub status: RecordStatus,
}

/// Body of gallery create and update requests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GalleryInput {
    #[serde(default)]
    pub gallery_name_en: String,
    #[serde(default)]
    pub gallery_name_fr: String,
    #[serde(default)]
    pub description_en: Option<String>,
    #[serde(default)]
    pub description_fr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
    #[serde(default, with = "option_flag", skip_serializing_if = "Option::is_none")]
    pub member_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_by: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<i64>,
}

/// An image belonging to a gallery, stored on disk with its thumbnail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryImage {
    pub id: i64,
    pub gallery_id: i64,
    pub image_filename: String,
    pub thumbnail_filename: String,
    pub order: i32,
    pub date_created: DateTime<Utc>,
    pub added_by: Option<i64>,
    pub status: RecordStatus,
}

/// Body of the gallery image delete request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteGalleryImageInput {
    #[serde(default)]
    pub club_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gallery_input_accepts_numeric_member_only() {
        let input: GalleryInput = serde_json::from_str(
            r#"{"gallery_name_en": "Meets", "gallery_name_fr": "Compétitions", "member_only": 1}"#,
        )
        .unwrap();
        assert_eq!(input.member_only, Some(true));
        assert_eq!(input.order, None);
        assert_eq!(input.description_en, None);
    }

    #[test]
    fn test_delete_image_body_may_omit_club_id() {
        let body: DeleteGalleryImageInput = serde_json::from_str("{}").unwrap();
        assert_eq!(body.club_id, None);

        let body: DeleteGalleryImageInput =
            serde_json::from_str(r#"{"club_id": "swimdorval"}"#).unwrap();
        assert_eq!(body.club_id.as_deref(), Some("swimdorval"));
    }

    #[test]
    fn test_gallery_serializes_member_only_as_number() {
        let gallery = Gallery {
            id: 1,
            gallery_name_en: "Meets".to_string(),
            gallery_name_fr: "Compétitions".to_string(),
            description_en: None,
            description_fr: None,
            order: 1,
            member_only: true,
            date_created: Utc::now(),
            added_by: None,
            date_updated: None,
            updated_by: None,
            status: RecordStatus::Active,
        };
        let json = serde_json::to_value(&gallery).unwrap();
        assert_eq!(json["member_only"], 1);
        assert_eq!(json["status"], 1);
    }
}
