use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};

use crate::app::{FolioError, Result};
use crate::domain::{Article, ArticleDraft, ArticleMetadata, ArticleUpdate};
use crate::excerpt::{generate_excerpt, DEFAULT_EXCERPT_LENGTH};
use crate::store::{created_at_or_epoch, parse_timestamp, ArticleBackend};

const ARTICLE_COLUMNS: &str =
    "id, title, content, excerpt, category, tags, created_at, updated_at";

/// Embedded article storage in a single SQLite database.
///
/// The connection mutex is the serialization point: calls queue on it and
/// each one runs to completion before the next starts.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Open (or create) the database at `path` and bring its schema up to
    /// date. Any failure is reported as storage being unavailable.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                FolioError::StorageUnavailable(format!("{}: {}", parent.display(), e))
            })?;
        }

        let conn = Connection::open(path)
            .map_err(|e| FolioError::StorageUnavailable(format!("{}: {}", path.display(), e)))?;
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get::<_, String>(0))
            .map_err(|e| FolioError::StorageUnavailable(e.to_string()))?;

        let backend = Self {
            conn: Mutex::new(conn),
        };
        backend.run_migrations()?;
        tracing::debug!("Opened article database at {}", path.display());
        Ok(backend)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| FolioError::StorageUnavailable(e.to_string()))?;
        let backend = Self {
            conn: Mutex::new(conn),
        };
        backend.run_migrations()?;
        Ok(backend)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.conn()?;
        migrations
            .to_latest(&mut conn)
            .map_err(|e| FolioError::StorageUnavailable(format!("migration failed: {e}")))?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| FolioError::StorageUnavailable(format!("connection poisoned: {e}")))
    }

    fn format_timestamp(ts: &DateTime<Utc>) -> String {
        // Fixed width so that text order in SQL matches time order.
        ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
    }

    fn encode_tags(tags: &[String]) -> Result<String> {
        Ok(serde_json::to_string(tags)?)
    }

    fn decode_tags(raw: Option<String>) -> Vec<String> {
        raw.and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    fn row_to_article(row: &Row<'_>) -> rusqlite::Result<Article> {
        let id: String = row.get(0)?;
        let created_at = created_at_or_epoch(&id, row.get::<_, Option<String>>(6)?.as_deref());
        let updated_at = row
            .get::<_, Option<String>>(7)?
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(created_at);

        Ok(Article {
            id,
            title: row.get(1)?,
            content: row.get(2)?,
            excerpt: row.get(3)?,
            category: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            tags: Self::decode_tags(row.get(5)?),
            created_at,
            updated_at,
        })
    }

    fn select_article(conn: &Connection, id: &str) -> Result<Option<Article>> {
        let article = conn
            .query_row(
                &format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ?1"),
                params![id],
                Self::row_to_article,
            )
            .optional()?;
        Ok(article)
    }
}

#[async_trait]
impl ArticleBackend for SqliteBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn list(&self) -> Result<Vec<ArticleMetadata>> {
        let conn = self.conn()?;

        // Content is only read when there is no stored excerpt to fall back on.
        let mut stmt = conn.prepare(
            "SELECT id, title, excerpt, category, tags, created_at, updated_at,
                    CASE WHEN excerpt IS NULL THEN content END
             FROM articles
             ORDER BY updated_at DESC, id ASC",
        )?;

        let list = stmt
            .query_map([], |row| {
                let id: String = row.get(0)?;
                let created_at =
                    created_at_or_epoch(&id, row.get::<_, Option<String>>(5)?.as_deref());
                let excerpt: Option<String> = row.get(2)?;
                let fallback: Option<String> = row.get(7)?;
                Ok(ArticleMetadata {
                    id,
                    title: row.get(1)?,
                    excerpt: excerpt.or_else(|| {
                        fallback.map(|content| generate_excerpt(&content, DEFAULT_EXCERPT_LENGTH))
                    }),
                    category: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                    tags: Self::decode_tags(row.get(4)?),
                    created_at,
                    updated_at: row
                        .get::<_, Option<String>>(6)?
                        .as_deref()
                        .and_then(parse_timestamp)
                        .unwrap_or(created_at),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        tracing::debug!("Listed {} articles", list.len());
        Ok(list)
    }

    async fn get(&self, id: &str) -> Result<Option<Article>> {
        let conn = self.conn()?;
        Self::select_article(&conn, id)
    }

    async fn create(&self, draft: &ArticleDraft) -> Result<Article> {
        let article = Article::new(draft.clone());
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO articles (id, title, content, excerpt, category, tags, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                article.id,
                article.title,
                article.content,
                article.excerpt,
                article.category,
                Self::encode_tags(&article.tags)?,
                Self::format_timestamp(&article.created_at),
                Self::format_timestamp(&article.updated_at),
            ],
        )?;

        Ok(article)
    }

    async fn update(&self, id: &str, update: &ArticleUpdate) -> Result<Option<Article>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let Some(mut article) = Self::select_article(&tx, id)? else {
            return Ok(None);
        };
        article.apply(update.clone());

        tx.execute(
            "UPDATE articles
             SET title = ?1, content = ?2, excerpt = ?3, category = ?4, tags = ?5, updated_at = ?6
             WHERE id = ?7",
            params![
                article.title,
                article.content,
                article.excerpt,
                article.category,
                Self::encode_tags(&article.tags)?,
                Self::format_timestamp(&article.updated_at),
                id,
            ],
        )?;
        tx.commit()?;

        Ok(Some(article))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM articles WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_get() {
        let backend = SqliteBackend::in_memory().unwrap();
        let draft = ArticleDraft::new("Hello", "**World**")
            .with_category("Misc")
            .with_tags(["a", "b", "a"]);
        let created = backend.create(&draft).await.unwrap();

        let fetched = backend.get(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.tags, vec!["a", "b", "a"]);
        assert_eq!(fetched.excerpt.as_deref(), Some("World"));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let backend = SqliteBackend::in_memory().unwrap();
        assert!(backend.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_returns_none() {
        let backend = SqliteBackend::in_memory().unwrap();
        let update = ArticleUpdate {
            title: Some("x".into()),
            ..Default::default()
        };
        assert!(backend.update("nope", &update).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_persists_fields() {
        let backend = SqliteBackend::in_memory().unwrap();
        let created = backend
            .create(&ArticleDraft::new("Title", "old body"))
            .await
            .unwrap();

        let update = ArticleUpdate {
            content: Some("new `body`".into()),
            tags: Some(vec!["t".into()]),
            ..Default::default()
        };
        backend.update(&created.id, &update).await.unwrap().unwrap();

        let fetched = backend.get(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Title");
        assert_eq!(fetched.content, "new `body`");
        assert_eq!(fetched.excerpt.as_deref(), Some("new body"));
        assert_eq!(fetched.tags, vec!["t"]);
        assert_eq!(fetched.created_at, created.created_at);
        assert!(fetched.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_delete_reports_missing() {
        let backend = SqliteBackend::in_memory().unwrap();
        let created = backend.create(&ArticleDraft::new("t", "c")).await.unwrap();
        assert!(backend.delete(&created.id).await.unwrap());
        assert!(!backend.delete(&created.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_falls_back_to_generated_excerpt() {
        let backend = SqliteBackend::in_memory().unwrap();
        let created = backend
            .create(&ArticleDraft::new("t", "# Head\n*body*"))
            .await
            .unwrap();
        {
            let conn = backend.conn().unwrap();
            conn.execute(
                "UPDATE articles SET excerpt = NULL WHERE id = ?1",
                params![created.id],
            )
            .unwrap();
        }

        let list = backend.list().await.unwrap();
        assert_eq!(list[0].excerpt.as_deref(), Some("Head body"));
    }

    #[tokio::test]
    async fn test_corrupt_tags_read_as_empty() {
        let backend = SqliteBackend::in_memory().unwrap();
        let created = backend.create(&ArticleDraft::new("t", "c")).await.unwrap();
        {
            let conn = backend.conn().unwrap();
            conn.execute(
                "UPDATE articles SET tags = 'not json' WHERE id = ?1",
                params![created.id],
            )
            .unwrap();
        }
        let fetched = backend.get(&created.id).await.unwrap().unwrap();
        assert!(fetched.tags.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_created_at_reads_back_unchanged() {
        let backend = SqliteBackend::in_memory().unwrap();
        let created = backend.create(&ArticleDraft::new("t", "c")).await.unwrap();
        {
            let conn = backend.conn().unwrap();
            conn.execute(
                "UPDATE articles SET created_at = 'not a date' WHERE id = ?1",
                params![created.id],
            )
            .unwrap();
        }

        let first = backend.get(&created.id).await.unwrap().unwrap();
        let second = backend.get(&created.id).await.unwrap().unwrap();
        assert_eq!(first.created_at, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(first.updated_at, created.updated_at);

        let list = backend.list().await.unwrap();
        assert_eq!(list[0].created_at, first.created_at);
    }

    #[test]
    fn test_timestamps_sort_as_text() {
        let earlier: DateTime<Utc> = "2024-01-01T00:00:00.5Z".parse().unwrap();
        let later: DateTime<Utc> = "2024-01-01T00:00:00.25Z".parse().unwrap();
        let later = later + chrono::Duration::seconds(1);
        assert!(SqliteBackend::format_timestamp(&earlier) < SqliteBackend::format_timestamp(&later));
    }
}
