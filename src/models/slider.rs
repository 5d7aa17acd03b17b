//! Homepage slider model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{Language, RecordStatus};

/// A homepage slide with one image and link per language
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slider {
    pub id: i64,
    pub image_en: Option<String>,
    pub image_fr: Option<String>,
    pub link_en: Option<String>,
    pub link_fr: Option<String>,
    pub order: i32,
    pub status: RecordStatus,
    pub date_created: DateTime<Utc>,
    pub added_by: Option<i64>,
    pub date_updated: Option<DateTime<Utc>>,
    pub updated_by: Option<i64>,
}

impl Slider {
    pub fn image(&self, language: Language) -> Option<&str> {
        match language {
            Language::En => self.image_en.as_deref(),
            Language::Fr => self.image_fr.as_deref(),
        }
    }

    pub fn set_image(&mut self, language: Language, filename: Option<String>) {
        match language {
            Language::En => self.image_en = filename,
            Language::Fr => self.image_fr = filename,
        }
    }

    pub fn set_link(&mut self, language: Language, link: Option<String>) {
        match language {
            Language::En => self.link_en = link,
            Language::Fr => self.link_fr = link,
        }
    }
}

/// Text fields of a slider create/update form
#[derive(Debug, Clone, Default)]
pub struct SliderInput {
    pub club_id: Option<String>,
    pub link_en: Option<String>,
    pub link_fr: Option<String>,
    /// Raw `status` form value; only 0 and 1 are accepted
    pub status: Option<String>,
    pub added_by: Option<i64>,
    pub updated_by: Option<i64>,
}

impl SliderInput {
    pub fn link(&self, language: Language) -> Option<&String> {
        match language {
            Language::En => self.link_en.as_ref(),
            Language::Fr => self.link_fr.as_ref(),
        }
    }
}
