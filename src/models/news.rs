//! News model: a language-neutral parent row plus up to one content row per
//! language.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::common::{flag, Language, RecordStatus};

/// Language-neutral news row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct News {
    pub id: i64,
    pub author: String,
    pub news_date: NaiveDate,
    #[serde(with = "flag")]
    pub show_in_homepage: bool,
    pub order: i32,
    #[serde(with = "flag")]
    pub post_to_public: bool,
    #[serde(with = "flag")]
    pub post_to_member: bool,
    pub date_added: DateTime<Utc>,
    pub status: RecordStatus,
}

/// Per-language news content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsContent {
    pub id: i64,
    pub news_id: i64,
    pub language: Language,
    pub title: String,
    pub summary: Option<String>,
    pub article: Option<String>,
    pub image_filename: Option<String>,
    pub image_thumbnail: Option<String>,
    pub slug_url: Option<String>,
    pub date_added: DateTime<Utc>,
    pub added_by: Option<i64>,
    pub date_updated: Option<DateTime<Utc>>,
    pub updated_by: Option<i64>,
    pub status: RecordStatus,
}

/// A news row joined with its content rows
#[derive(Debug, Clone, PartialEq)]
pub struct NewsWithContent {
    pub news: News,
    pub en: Option<NewsContent>,
    pub fr: Option<NewsContent>,
}

impl NewsWithContent {
    pub fn content(&self, language: Language) -> Option<&NewsContent> {
        match language {
            Language::En => self.en.as_ref(),
            Language::Fr => self.fr.as_ref(),
        }
    }

    /// Attach contents, keeping the first row seen for each language
    pub fn assemble(news: News, contents: impl IntoIterator<Item = NewsContent>) -> Self {
        let mut item = Self { news, en: None, fr: None };
        for content in contents {
            let slot = match content.language {
                Language::En => &mut item.en,
                Language::Fr => &mut item.fr,
            };
            if slot.is_none() {
                *slot = Some(content);
            }
        }
        item
    }
}

/// Admin view of a news item: both languages flattened into one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsAdminView {
    pub id: i64,
    pub author: String,
    pub news_date: NaiveDate,
    #[serde(with = "flag")]
    pub show_in_homepage: bool,
    pub order: i32,
    #[serde(with = "flag")]
    pub post_to_public: bool,
    #[serde(with = "flag")]
    pub post_to_member: bool,
    pub date_added: DateTime<Utc>,
    pub status: RecordStatus,

    pub content_en_id: Option<i64>,
    pub language_en_id: Option<i32>,
    pub title_en: Option<String>,
    pub summary_en: Option<String>,
    pub article_en: Option<String>,
    pub image_en: Option<String>,
    pub thumbnail_en: Option<String>,
    pub slug_en: Option<String>,

    pub content_fr_id: Option<i64>,
    pub language_fr_id: Option<i32>,
    pub title_fr: Option<String>,
    pub summary_fr: Option<String>,
    pub article_fr: Option<String>,
    pub image_fr: Option<String>,
    pub thumbnail_fr: Option<String>,
    pub slug_fr: Option<String>,
}

impl From<NewsWithContent> for NewsAdminView {
    fn from(item: NewsWithContent) -> Self {
        let NewsWithContent { news, en, fr } = item;

        Self {
            id: news.id,
            author: news.author,
            news_date: news.news_date,
            show_in_homepage: news.show_in_homepage,
            order: news.order,
            post_to_public: news.post_to_public,
            post_to_member: news.post_to_member,
            date_added: news.date_added,
            status: news.status,

            content_en_id: en.as_ref().map(|c| c.id),
            language_en_id: en.as_ref().map(|c| c.language.id()),
            title_en: en.as_ref().map(|c| c.title.clone()),
            summary_en: en.as_ref().and_then(|c| c.summary.clone()),
            article_en: en.as_ref().and_then(|c| c.article.clone()),
            image_en: en.as_ref().and_then(|c| c.image_filename.clone()),
            thumbnail_en: en.as_ref().and_then(|c| c.image_thumbnail.clone()),
            slug_en: en.and_then(|c| c.slug_url),

            content_fr_id: fr.as_ref().map(|c| c.id),
            language_fr_id: fr.as_ref().map(|c| c.language.id()),
            title_fr: fr.as_ref().map(|c| c.title.clone()),
            summary_fr: fr.as_ref().and_then(|c| c.summary.clone()),
            article_fr: fr.as_ref().and_then(|c| c.article.clone()),
            image_fr: fr.as_ref().and_then(|c| c.image_filename.clone()),
            thumbnail_fr: fr.as_ref().and_then(|c| c.image_thumbnail.clone()),
            slug_fr: fr.and_then(|c| c.slug_url),
        }
    }
}

impl NewsContent {
    /// Unsaved content row (id 0) for the given language
    pub fn empty(language: Language) -> Self {
        Self {
            id: 0,
            news_id: 0,
            language,
            title: String::new(),
            summary: None,
            article: None,
            image_filename: None,
            image_thumbnail: None,
            slug_url: None,
            date_added: DateTime::<Utc>::default(),
            added_by: None,
            date_updated: None,
            updated_by: None,
            status: RecordStatus::Active,
        }
    }
}

/// Public, single-language view of a news item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalizedNews {
    pub id: i64,
    pub author: String,
    pub news_date: NaiveDate,
    #[serde(with = "flag")]
    pub show_in_homepage: bool,
    pub order: i32,
    #[serde(with = "flag")]
    pub post_to_public: bool,
    #[serde(with = "flag")]
    pub post_to_member: bool,
    pub date_added: DateTime<Utc>,
    pub status: RecordStatus,
    pub content_id: i64,
    pub language_id: i32,
    pub title: String,
    pub summary: Option<String>,
    pub article: Option<String>,
    pub image: Option<String>,
    pub thumbnail: Option<String>,
    pub slug: Option<String>,
}

/// Text fields of one language block in a create/update form.
///
/// `None` means the field was not sent at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewsContentFields {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub article: Option<String>,
    pub slug: Option<String>,
}

impl NewsContentFields {
    /// Whether any field other than the title was sent
    pub fn has_non_title_fields(&self) -> bool {
        self.summary.is_some() || self.article.is_some() || self.slug.is_some()
    }

    /// The title, if it was sent and is not blank
    pub fn non_blank_title(&self) -> Option<&str> {
        self.title.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

/// Input for creating a news item
#[derive(Debug, Clone, Default)]
pub struct CreateNewsInput {
    pub club_id: Option<String>,
    pub author: Option<String>,
    pub news_date: Option<NaiveDate>,
    pub show_in_homepage: bool,
    pub post_to_public: bool,
    pub post_to_member: bool,
    pub en: NewsContentFields,
    pub fr: NewsContentFields,
    pub added_by: Option<i64>,
}

/// Input for updating a news item. Every `None` leaves the stored value alone.
#[derive(Debug, Clone, Default)]
pub struct UpdateNewsInput {
    pub club_id: Option<String>,
    pub author: Option<String>,
    pub news_date: Option<NaiveDate>,
    pub show_in_homepage: Option<bool>,
    pub order: Option<i32>,
    pub post_to_public: Option<bool>,
    pub post_to_member: Option<bool>,
    pub en: NewsContentFields,
    pub fr: NewsContentFields,
    pub updated_by: Option<i64>,
}

impl CreateNewsInput {
    pub fn fields(&self, language: Language) -> &NewsContentFields {
        match language {
            Language::En => &self.en,
            Language::Fr => &self.fr,
        }
    }
}

impl UpdateNewsInput {
    pub fn fields(&self, language: Language) -> &NewsContentFields {
        match language {
            Language::En => &self.en,
            Language::Fr => &self.fr,
        }
    }
}
