use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::excerpt::{generate_excerpt, DEFAULT_EXCERPT_LENGTH};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Article {
    /// Build a fresh article from a draft. Both timestamps are `now`.
    pub fn new(draft: ArticleDraft) -> Self {
        let now = Utc::now();
        let excerpt = generate_excerpt(&draft.content, DEFAULT_EXCERPT_LENGTH);
        Self {
            id: Self::generate_id(),
            title: draft.title,
            content: draft.content,
            excerpt: Some(excerpt),
            category: draft.category,
            tags: draft.tags,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Merge a partial update. `id` and `created_at` never change.
    pub fn apply(&mut self, update: ArticleUpdate) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(content) = update.content {
            self.excerpt = Some(generate_excerpt(&content, DEFAULT_EXCERPT_LENGTH));
            self.content = content;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(tags) = update.tags {
            self.tags = tags;
        }
        self.touch();
    }

    /// Refresh `updated_at`, keeping it at or after `created_at`.
    pub fn touch(&mut self) {
        let now = Utc::now();
        self.updated_at = now.max(self.created_at);
    }

    pub fn metadata(&self) -> ArticleMetadata {
        ArticleMetadata {
            id: self.id.clone(),
            title: self.title.clone(),
            excerpt: Some(
                self.excerpt
                    .clone()
                    .unwrap_or_else(|| generate_excerpt(&self.content, DEFAULT_EXCERPT_LENGTH)),
            ),
            category: self.category.clone(),
            tags: self.tags.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// List-view projection of an [`Article`] without its content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleMetadata {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ArticleMetadata {
    pub fn display_category(&self) -> &str {
        if self.category.is_empty() {
            UNCATEGORIZED
        } else {
            &self.category
        }
    }
}

pub const UNCATEGORIZED: &str = "Uncategorized";

/// Most recently modified first; ties broken by id so the order is total.
pub fn sort_by_recency(list: &mut [ArticleMetadata]) {
    list.sort_by(|a, b| {
        b.updated_at
            .cmp(&a.updated_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Input for creating an article.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleDraft {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ArticleDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl ArticleUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.category.is_none() && self.tags.is_none()
    }
}

/// An article's raw Markdown, ready to be written out under `filename`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedArticle {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Lowercase ASCII slug: non-alphanumeric runs become a single `-`, no
/// leading or trailing separator.
pub fn slugify_filename(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_sep = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('-');
            }
            pending_sep = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    slug
}

pub fn export_filename(title: &str) -> String {
    let slug = slugify_filename(title);
    if slug.is_empty() {
        "article.md".to_string()
    } else {
        format!("{slug}.md")
    }
}

/// Title for an imported file: the file name with its extension stripped.
pub fn title_from_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match base.rfind('.') {
        Some(idx) if idx > 0 => base[..idx].to_string(),
        _ => base.to_string(),
    }
}
