pub mod remote;
pub mod sqlite;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use tokio::sync::{watch, Mutex};

use crate::app::{FolioError, Result};
use crate::domain::{
    export_filename, sort_by_recency, title_from_filename, Article, ArticleDraft, ArticleFilter,
    ArticleMetadata, ArticleUpdate, ExportedArticle,
};

pub use remote::RemoteBackend;
pub use sqlite::SqliteBackend;

/// Persistence behind an [`ArticleStore`].
///
/// Backends only persist; validation and the metadata projection live in the
/// store. Each call is a single unit: it either fully applies or leaves the
/// backing data untouched. There is no version check on write, so concurrent
/// writers to the same id end up with the last write winning.
#[async_trait]
pub trait ArticleBackend: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &'static str;

    /// All articles' metadata, most recently updated first.
    async fn list(&self) -> Result<Vec<ArticleMetadata>>;

    async fn get(&self, id: &str) -> Result<Option<Article>>;

    async fn create(&self, draft: &ArticleDraft) -> Result<Article>;

    /// `None` when no article has this id.
    async fn update(&self, id: &str, update: &ArticleUpdate) -> Result<Option<Article>>;

    /// `false` when no article has this id.
    async fn delete(&self, id: &str) -> Result<bool>;
}

/// The article collection as seen by the rest of the application.
///
/// Keeps a metadata projection for list views that subscribers can watch.
/// The projection is updated after `load`, `list`, `create`, `update` and
/// `delete`, always before the call returns. These calls hold `ops` from the
/// backend call through the projection update, so a list snapshot can never
/// be published over a write that finished after it was taken.
pub struct ArticleStore {
    backend: Arc<dyn ArticleBackend>,
    projection: watch::Sender<Vec<ArticleMetadata>>,
    ops: Mutex<()>,
}

impl ArticleStore {
    pub fn new(backend: Arc<dyn ArticleBackend>) -> Self {
        let (projection, _) = watch::channel(Vec::new());
        Self {
            backend,
            projection,
            ops: Mutex::new(()),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<ArticleMetadata>> {
        self.projection.subscribe()
    }

    /// Current projection without touching the backend.
    pub fn snapshot(&self) -> Vec<ArticleMetadata> {
        self.projection.borrow().clone()
    }

    /// Projection narrowed by `filter`, in list order.
    pub fn filtered(&self, filter: &ArticleFilter) -> Vec<ArticleMetadata> {
        filter.apply(&self.projection.borrow())
    }

    /// Replace the projection with the backend's current state.
    pub async fn load(&self) -> Result<()> {
        self.list().await.map(|_| ())
    }

    /// Metadata of every article, most recently updated first.
    ///
    /// A transport failure to a remote backend yields an empty list (and an
    /// empty projection) rather than an error; the failure is logged.
    pub async fn list(&self) -> Result<Vec<ArticleMetadata>> {
        let _guard = self.ops.lock().await;
        let mut list = match self.backend.list().await {
            Ok(list) => list,
            Err(e) if e.is_transport() => {
                tracing::warn!("Listing articles from {} failed: {}", self.backend.name(), e);
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        sort_by_recency(&mut list);
        self.projection.send_replace(list.clone());
        Ok(list)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Article>> {
        self.backend.get(id).await
    }

    pub async fn create(&self, draft: ArticleDraft) -> Result<Article> {
        validate_required("title", &draft.title)?;
        validate_required("content", &draft.content)?;

        let _guard = self.ops.lock().await;
        let article = self.backend.create(&draft).await?;
        tracing::info!("Created article {} ({})", article.id, article.title);
        self.upsert_projection(article.metadata());
        Ok(article)
    }

    pub async fn update(&self, id: &str, update: ArticleUpdate) -> Result<Article> {
        if let Some(ref title) = update.title {
            validate_required("title", title)?;
        }
        if let Some(ref content) = update.content {
            validate_required("content", content)?;
        }

        let _guard = self.ops.lock().await;
        let article = self
            .backend
            .update(id, &update)
            .await?
            .ok_or_else(|| FolioError::NotFound(id.to_string()))?;
        tracing::info!("Updated article {}", article.id);
        self.upsert_projection(article.metadata());
        Ok(article)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let _guard = self.ops.lock().await;
        if !self.backend.delete(id).await? {
            return Err(FolioError::NotFound(id.to_string()));
        }
        tracing::info!("Deleted article {}", id);
        self.projection.send_modify(|list| list.retain(|a| a.id != id));
        Ok(())
    }

    /// Raw Markdown of an article with a filesystem-safe file name.
    pub async fn export(&self, id: &str) -> Result<ExportedArticle> {
        let article = self
            .get(id)
            .await?
            .ok_or_else(|| FolioError::NotFound(id.to_string()))?;
        Ok(ExportedArticle {
            filename: export_filename(&article.title),
            bytes: article.content.into_bytes(),
        })
    }

    /// Create an article from external Markdown. A blank title becomes
    /// "Untitled".
    pub async fn import(&self, content: &str, suggested_title: &str) -> Result<Article> {
        let title = match suggested_title.trim() {
            "" => "Untitled".to_string(),
            t => t.to_string(),
        };
        self.create(ArticleDraft::new(title, content)).await
    }

    /// [`import`](Self::import) a Markdown file, titled after its file name.
    pub async fn import_file(&self, path: &Path) -> Result<Article> {
        let content = tokio::fs::read_to_string(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.import(&content, &title_from_filename(&name)).await
    }

    fn upsert_projection(&self, metadata: ArticleMetadata) {
        self.projection.send_modify(|list| {
            match list.iter_mut().find(|a| a.id == metadata.id) {
                Some(existing) => *existing = metadata,
                None => list.push(metadata),
            }
            sort_by_recency(list);
        });
    }
}

fn validate_required(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(FolioError::Validation(format!("{field} is required")));
    }
    Ok(())
}

/// Parse a stored or transmitted timestamp: RFC 3339, or SQLite's
/// `YYYY-MM-DD HH:MM:SS` in UTC.
pub(crate) fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// Creation time of article `id` from `raw`. An unreadable value reads as
/// the Unix epoch, so it comes back the same on every read.
pub(crate) fn created_at_or_epoch(id: &str, raw: Option<&str>) -> DateTime<Utc> {
    match raw.and_then(parse_timestamp) {
        Some(ts) => ts,
        None => {
            tracing::warn!("Article {} has an unreadable creation time: {:?}", id, raw);
            DateTime::<Utc>::UNIX_EPOCH
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2024-03-01T10:00:00.000Z").is_some());
        assert!(parse_timestamp("2024-03-01T10:00:00.123456789+00:00").is_some());
        assert!(parse_timestamp("2024-03-01 10:00:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_unreadable_creation_time_is_stable() {
        let first = created_at_or_epoch("a", Some("garbage"));
        let second = created_at_or_epoch("a", None);
        assert_eq!(first, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(first, second);
        assert_eq!(
            created_at_or_epoch("a", Some("2024-03-01 10:00:00")),
            parse_timestamp("2024-03-01T10:00:00Z").unwrap()
        );
    }

    #[test]
    fn test_validate_required() {
        assert!(validate_required("title", "x").is_ok());
        assert!(matches!(
            validate_required("title", "  "),
            Err(FolioError::Validation(_))
        ));
    }
}
