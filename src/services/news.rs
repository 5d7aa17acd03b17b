//! News service
//!
//! Business logic for bilingual news items:
//! - slug generation and uniqueness per language
//! - create/update of the parent row and its language rows
//! - image and thumbnail handling for each language
//! - rich text editor uploads (inline images and documents)

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

use super::storage::{Area, FileEntry, MediaStorage, StoredFile, UploadedFile};
use super::{require_club_id, ServiceError};
use crate::db::repositories::NewsRepository;
use crate::models::{
    CreateNewsInput, Language, LocalizedNews, News, NewsAdminView, NewsContent, NewsContentFields,
    NewsWithContent, RecordStatus, UpdateNewsInput,
};

/// Image uploads of a news form, per language
#[derive(Debug, Clone, Default)]
pub struct NewsUploads {
    pub image_en: Option<UploadedFile>,
    pub image_fr: Option<UploadedFile>,
    pub thumbnail_en: Option<UploadedFile>,
    pub thumbnail_fr: Option<UploadedFile>,
}

impl NewsUploads {
    pub fn image(&self, language: Language) -> Option<&UploadedFile> {
        match language {
            Language::En => self.image_en.as_ref(),
            Language::Fr => self.image_fr.as_ref(),
        }
    }

    pub fn thumbnail(&self, language: Language) -> Option<&UploadedFile> {
        match language {
            Language::En => self.thumbnail_en.as_ref(),
            Language::Fr => self.thumbnail_fr.as_ref(),
        }
    }

    pub fn has_any(&self, language: Language) -> bool {
        self.image(language).is_some() || self.thumbnail(language).is_some()
    }
}

/// Files written for one language block
#[derive(Debug, Clone, Default)]
struct SavedImages {
    image: Option<String>,
    thumbnail: Option<String>,
}

pub struct NewsService {
    repo: Arc<dyn NewsRepository>,
    storage: Arc<MediaStorage>,
}

impl NewsService {
    pub fn new(repo: Arc<dyn NewsRepository>, storage: Arc<MediaStorage>) -> Self {
        Self { repo, storage }
    }

    /// Admin list: every live news item with both languages
    pub async fn list_admin(&self) -> Result<Vec<NewsAdminView>, ServiceError> {
        let news = self.repo.list().await?;
        let mut contents: HashMap<i64, Vec<NewsContent>> = HashMap::new();
        for content in self.repo.list_all_contents().await? {
            contents.entry(content.news_id).or_default().push(content);
        }

        Ok(news
            .into_iter()
            .map(|item| {
                let rows = contents.remove(&item.id).unwrap_or_default();
                NewsAdminView::from(NewsWithContent::assemble(item, rows))
            })
            .collect())
    }

    pub async fn get_admin(&self, id: i64) -> Result<NewsAdminView, ServiceError> {
        Ok(NewsAdminView::from(self.load(id).await?))
    }

    pub async fn list_public(&self, language: Language) -> Result<Vec<LocalizedNews>, ServiceError> {
        Ok(self.repo.list_public(language).await?)
    }

    pub async fn get_public_by_slug(&self, slug: &str, language: Language) -> Result<LocalizedNews, ServiceError> {
        self.repo
            .get_public_by_slug(slug, language)
            .await?
            .ok_or_else(|| ServiceError::not_found("News not found"))
    }

    /// Create a news item and a content row for each titled language.
    ///
    /// Returns the new news id.
    pub async fn create(&self, input: CreateNewsInput, uploads: NewsUploads) -> Result<i64, ServiceError> {
        let club = require_club_id(input.club_id.as_deref())?;
        let author = input
            .author
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .ok_or_else(|| ServiceError::validation("Author is required"))?
            .to_string();

        let titled: Vec<Language> = Language::ALL
            .into_iter()
            .filter(|language| input.fields(*language).non_blank_title().is_some())
            .collect();
        for language in &titled {
            self.validate_uploads(*language, &uploads)?;
        }

        // Every image is decoded and written before the first row goes in
        let blocks = self.save_blocks(club, &titled, &uploads).await?;

        let now = Utc::now();
        let parent = News {
            id: 0,
            author,
            news_date: input.news_date.unwrap_or_else(|| now.date_naive()),
            show_in_homepage: input.show_in_homepage,
            order: 0,
            post_to_public: input.post_to_public,
            post_to_member: input.post_to_member,
            date_added: now,
            status: RecordStatus::Active,
        };
        let news = match self.insert_parent(parent).await {
            Ok(news) => news,
            Err(e) => {
                self.discard_blocks(club, blocks).await;
                return Err(e);
            }
        };

        let mut written = Vec::with_capacity(blocks.len());
        let mut remaining = blocks.into_iter();
        while let Some((language, images)) = remaining.next() {
            let fields = input.fields(language);
            let title = fields.non_blank_title().unwrap_or_default();
            let result = self
                .insert_content(club, news.id, language, title, fields, images.clone(), input.added_by)
                .await;
            if let Err(e) = result {
                // The images of the failed block are already gone
                self.discard_blocks(club, written.into_iter().chain(remaining)).await;
                if let Err(cleanup) = self.repo.soft_delete(news.id).await {
                    tracing::warn!("Failed to roll back news {}: {:#}", news.id, cleanup);
                }
                return Err(e);
            }
            written.push((language, images));
        }

        tracing::info!("Created news {} for club {}", news.id, club);
        Ok(news.id)
    }

    /// Update a news item and the language blocks present in the form
    pub async fn update(&self, id: i64, input: UpdateNewsInput, uploads: NewsUploads) -> Result<(), ServiceError> {
        let mut news = self
            .repo
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("News not found"))?;
        let club = require_club_id(input.club_id.as_deref())?;
        let contents = self.repo.list_contents(id).await?;

        if let Some(author) = input.author.as_deref() {
            let author = author.trim();
            if author.is_empty() {
                return Err(ServiceError::validation("Author is required"));
            }
            news.author = author.to_string();
        }
        if let Some(news_date) = input.news_date {
            news.news_date = news_date;
        }
        if let Some(value) = input.show_in_homepage {
            news.show_in_homepage = value;
        }
        if let Some(order) = input.order {
            news.order = order;
        }
        if let Some(value) = input.post_to_public {
            news.post_to_public = value;
        }
        if let Some(value) = input.post_to_member {
            news.post_to_member = value;
        }

        let existing = NewsWithContent::assemble(news, contents);
        let mut pending = Vec::new();
        for language in Language::ALL {
            let fields = input.fields(language);
            let applies = match existing.content(language) {
                Some(_) => fields.title.is_some() || fields.has_non_title_fields() || uploads.has_any(language),
                None => fields.non_blank_title().is_some(),
            };
            if applies {
                self.validate_uploads(language, &uploads)?;
                pending.push(language);
            }
        }

        let blocks = self.save_blocks(club, &pending, &uploads).await?;

        if let Err(e) = self.repo.update(&existing.news).await {
            self.discard_blocks(club, blocks).await;
            return Err(e.into());
        }

        let mut remaining = blocks.into_iter();
        while let Some((language, images)) = remaining.next() {
            let fields = input.fields(language);
            let result = match existing.content(language) {
                Some(content) => self
                    .update_content(club, content.clone(), fields, images, input.updated_by)
                    .await,
                None => {
                    let title = fields.non_blank_title().unwrap_or_default();
                    self.insert_content(club, id, language, title, fields, images, input.updated_by)
                        .await
                        .map(|_| ())
                }
            };
            if let Err(e) = result {
                self.discard_blocks(club, remaining).await;
                return Err(e);
            }
        }

        tracing::info!("Updated news {}", id);
        Ok(())
    }

    /// Soft-delete a news item and its content rows
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if !self.repo.soft_delete(id).await? {
            return Err(ServiceError::not_found("News not found"));
        }
        tracing::info!("Deleted news {}", id);
        Ok(())
    }

    pub async fn set_order(&self, id: i64, order: i32) -> Result<(), ServiceError> {
        if !self.repo.set_order(id, order).await? {
            return Err(ServiceError::not_found("News not found"));
        }
        Ok(())
    }

    /// Return `base` if no other news item uses it in `language`, otherwise
    /// the first free `base-2`, `base-3`...
    pub async fn ensure_unique_slug(
        &self,
        base: &str,
        language: Language,
        exclude_news_id: Option<i64>,
    ) -> Result<String, ServiceError> {
        if !self.repo.slug_exists(base, language, exclude_news_id).await? {
            return Ok(base.to_string());
        }
        let mut suffix = 2u32;
        loop {
            let candidate = format!("{}-{}", base, suffix);
            if !self.repo.slug_exists(&candidate, language, exclude_news_id).await? {
                return Ok(candidate);
            }
            suffix += 1;
        }
    }

    pub async fn upload_editor_image(
        &self,
        club_id: Option<&str>,
        file: Option<UploadedFile>,
    ) -> Result<StoredFile, ServiceError> {
        let club = require_club_id(club_id)?;
        let file = file.ok_or_else(|| ServiceError::validation("No image file provided"))?;
        let filename = self.storage.save_image(club, Area::NewsImages, "article", &file).await?;
        Ok(StoredFile {
            url: self.storage.url(club, Area::NewsImages, &filename),
            filename,
        })
    }

    pub async fn list_editor_images(&self, club_id: Option<&str>) -> Result<Vec<FileEntry>, ServiceError> {
        let club = require_club_id(club_id)?;
        Ok(self.storage.list_images(club, Area::NewsImages).await?)
    }

    pub async fn upload_editor_file(
        &self,
        club_id: Option<&str>,
        file: Option<UploadedFile>,
    ) -> Result<StoredFile, ServiceError> {
        let club = require_club_id(club_id)?;
        let file = file.ok_or_else(|| ServiceError::validation("No file provided"))?;
        let filename = self.storage.save_document(club, &file).await?;
        Ok(StoredFile {
            url: self.storage.url(club, Area::NewsFiles, &filename),
            filename,
        })
    }

    pub async fn list_editor_files(&self, club_id: Option<&str>) -> Result<Vec<FileEntry>, ServiceError> {
        let club = require_club_id(club_id)?;
        Ok(self.storage.list_files(club, Area::NewsFiles).await?)
    }

    fn validate_uploads(&self, language: Language, uploads: &NewsUploads) -> Result<(), ServiceError> {
        for file in [uploads.image(language), uploads.thumbnail(language)].into_iter().flatten() {
            self.storage.validate_image(file)?;
        }
        Ok(())
    }

    async fn load(&self, id: i64) -> Result<NewsWithContent, ServiceError> {
        let news = self
            .repo
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("News not found"))?;
        let contents = self.repo.list_contents(id).await?;
        Ok(NewsWithContent::assemble(news, contents))
    }

    async fn insert_parent(&self, mut news: News) -> Result<News, ServiceError> {
        news.order = self.repo.max_order().await? + 1;
        Ok(self.repo.create(&news).await?)
    }

    /// Insert a language row. Its saved images are removed when this fails.
    #[allow(clippy::too_many_arguments)]
    async fn insert_content(
        &self,
        club: &str,
        news_id: i64,
        language: Language,
        title: &str,
        fields: &NewsContentFields,
        images: SavedImages,
        added_by: Option<i64>,
    ) -> Result<NewsContent, ServiceError> {
        let slug = match self.slug_for(fields.slug.as_deref(), title, language, None).await {
            Ok(slug) => slug,
            Err(e) => {
                self.discard(club, images).await;
                return Err(e);
            }
        };

        let content = NewsContent {
            news_id,
            title: title.to_string(),
            summary: fields.summary.as_deref().and_then(empty_to_none),
            article: fields.article.as_deref().and_then(empty_to_none),
            image_filename: images.image.clone(),
            image_thumbnail: images.thumbnail.clone(),
            slug_url: slug,
            date_added: Utc::now(),
            added_by,
            ..NewsContent::empty(language)
        };

        match self.repo.create_content(&content).await {
            Ok(created) => Ok(created),
            Err(e) => {
                self.discard(club, images).await;
                Err(e.into())
            }
        }
    }

    /// Apply a language block to an existing row. New images replace the
    /// stored ones, which are deleted once the row is written.
    async fn update_content(
        &self,
        club: &str,
        mut content: NewsContent,
        fields: &NewsContentFields,
        images: SavedImages,
        updated_by: Option<i64>,
    ) -> Result<(), ServiceError> {
        let language = content.language;

        if let Some(title) = fields.non_blank_title() {
            content.title = title.to_string();
        }
        if let Some(summary) = fields.summary.as_deref() {
            content.summary = empty_to_none(summary);
        }
        if let Some(article) = fields.article.as_deref() {
            content.article = empty_to_none(article);
        }
        if fields.slug.is_some() || fields.non_blank_title().is_some() {
            let slug = match self
                .slug_for(fields.slug.as_deref(), &content.title, language, Some(content.news_id))
                .await
            {
                Ok(slug) => slug,
                Err(e) => {
                    self.discard(club, images).await;
                    return Err(e);
                }
            };
            // A title with nothing sluggable keeps the current slug
            if slug.is_some() || fields.slug.is_some() {
                content.slug_url = slug;
            }
        }

        let old_image = match &images.image {
            Some(image) => content.image_filename.replace(image.clone()),
            None => None,
        };
        let old_thumbnail = match &images.thumbnail {
            Some(thumbnail) => content.image_thumbnail.replace(thumbnail.clone()),
            None => None,
        };

        content.updated_by = updated_by;
        content.date_updated = Some(Utc::now());

        if let Err(e) = self.repo.update_content(&content).await {
            self.discard(club, images).await;
            return Err(e.into());
        }

        if let Some(old) = old_image {
            self.storage.remove(club, Area::NewsImages, &old).await;
        }
        if let Some(old) = old_thumbnail {
            self.storage.remove(club, Area::NewsThumbnails, &old).await;
        }
        Ok(())
    }

    /// Normalized slug from the provided value or the title, made unique
    async fn slug_for(
        &self,
        provided: Option<&str>,
        title: &str,
        language: Language,
        exclude_news_id: Option<i64>,
    ) -> Result<Option<String>, ServiceError> {
        let base = provided
            .map(generate_slug)
            .filter(|slug| !slug.is_empty())
            .unwrap_or_else(|| generate_slug(title));
        if base.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.ensure_unique_slug(&base, language, exclude_news_id).await?))
    }

    /// Save the image of a language block and its thumbnail. Without an
    /// explicit thumbnail one is rendered from the image.
    async fn save_images(&self, club: &str, language: Language, uploads: &NewsUploads) -> Result<SavedImages, ServiceError> {
        let code = language.code();
        let mut saved = SavedImages::default();

        if let Some(image) = uploads.image(language) {
            saved.image = Some(
                self.storage
                    .save_image(club, Area::NewsImages, &format!("news_{}", code), image)
                    .await?,
            );
        }

        let thumbnail_source = uploads.thumbnail(language).or(uploads.image(language));
        if let Some(source) = thumbnail_source {
            match self
                .storage
                .save_thumbnail(club, Area::NewsThumbnails, &format!("thumb_{}", code), source)
                .await
            {
                Ok(name) => saved.thumbnail = Some(name),
                Err(e) => {
                    self.discard(club, saved).await;
                    return Err(e.into());
                }
            }
        }
        Ok(saved)
    }

    /// Save the images of each language block, all or nothing
    async fn save_blocks(
        &self,
        club: &str,
        languages: &[Language],
        uploads: &NewsUploads,
    ) -> Result<Vec<(Language, SavedImages)>, ServiceError> {
        let mut blocks = Vec::with_capacity(languages.len());
        for language in languages {
            match self.save_images(club, *language, uploads).await {
                Ok(saved) => blocks.push((*language, saved)),
                Err(e) => {
                    self.discard_blocks(club, blocks).await;
                    return Err(e);
                }
            }
        }
        Ok(blocks)
    }

    async fn discard_blocks(&self, club: &str, blocks: impl IntoIterator<Item = (Language, SavedImages)>) {
        for (_, saved) in blocks {
            self.discard(club, saved).await;
        }
    }

    async fn discard(&self, club: &str, saved: SavedImages) {
        if let Some(image) = saved.image {
            self.storage.remove(club, Area::NewsImages, &image).await;
        }
        if let Some(thumbnail) = saved.thumbnail {
            self.storage.remove(club, Area::NewsThumbnails, &thumbnail).await;
        }
    }
}

fn empty_to_none(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Turn a title into a URL slug.
///
/// Accented Latin letters are folded to ASCII, other characters outside
/// `[a-z0-9_-]` and whitespace are dropped, and separator runs become a
/// single `-`. Returns an empty string when nothing usable is left.
pub fn generate_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_separator = false;

    for c in title.to_lowercase().chars() {
        if let Some(folded) = fold_accent(c) {
            push_slug_str(&mut slug, &mut pending_separator, folded);
        } else if c.is_ascii_alphanumeric() {
            push_slug_str(&mut slug, &mut pending_separator, c.encode_utf8(&mut [0; 4]));
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_separator = true;
        }
    }
    slug
}

fn push_slug_str(slug: &mut String, pending_separator: &mut bool, value: &str) {
    if *pending_separator && !slug.is_empty() {
        slug.push('-');
    }
    *pending_separator = false;
    slug.push_str(value);
}

fn fold_accent(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
        'ç' => "c",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'ñ' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => "o",
        'ù' | 'ú' | 'û' | 'ü' => "u",
        'ý' | 'ÿ' => "y",
        'œ' => "oe",
        'æ' => "ae",
        'ß' => "ss",
        _ => return None,
    };
    Some(folded)
}
