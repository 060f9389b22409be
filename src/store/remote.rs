use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::app::{FolioError, Result};
use crate::domain::{Article, ArticleDraft, ArticleMetadata, ArticleUpdate};
use crate::store::{created_at_or_epoch, parse_timestamp, ArticleBackend};

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Client for the articles REST service.
///
/// Resources live under `{base}/articles`. The service requires title and
/// content on every write, so partial updates are merged against the current
/// article before being sent.
pub struct RemoteBackend {
    client: Client,
    base: Url,
}

impl RemoteBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(FolioError::Config(format!(
                "remote URL cannot be used as a base: {base_url}"
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, base })
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| FolioError::Config(format!("invalid remote URL: {}", self.base)))?
            .pop_if_empty()
            .push("articles")
            .extend(segments);
        Ok(url)
    }

    fn collection_url(&self) -> Result<Url> {
        self.url(&[])
    }

    fn article_url(&self, id: &str) -> Result<Url> {
        self.url(&[id])
    }

    async fn read_json<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T> {
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Turn a non-success response into an error, using the service's
    /// `{"error": "..."}` body when there is one.
    async fn error_for(response: Response) -> FolioError {
        let status = response.status();
        let message = match response.bytes().await {
            Ok(body) => serde_json::from_slice::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned()),
            Err(e) => e.to_string(),
        };

        if status == StatusCode::BAD_REQUEST {
            FolioError::Validation(message)
        } else {
            FolioError::Remote {
                status: status.as_u16(),
                message,
            }
        }
    }

    async fn send_json(
        &self,
        request: reqwest::RequestBuilder,
        body: &WriteBody<'_>,
    ) -> Result<Response> {
        let payload = serde_json::to_vec(body)?;
        let response = request
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .body(payload)
            .send()
            .await?;
        Ok(response)
    }
}

#[async_trait]
impl ArticleBackend for RemoteBackend {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn list(&self) -> Result<Vec<ArticleMetadata>> {
        let url = self.collection_url()?;
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        let wire: Vec<WireMetadata> = Self::read_json(response).await?;
        Ok(wire.into_iter().map(WireMetadata::into_metadata).collect())
    }

    async fn get(&self, id: &str) -> Result<Option<Article>> {
        let url = self.article_url(id)?;
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let wire: WireArticle = Self::read_json(response).await?;
                Ok(Some(wire.into_article(None)))
            }
            _ => Err(Self::error_for(response).await),
        }
    }

    async fn create(&self, draft: &ArticleDraft) -> Result<Article> {
        let url = self.collection_url()?;
        tracing::debug!("POST {}", url);
        let body = WriteBody {
            title: &draft.title,
            content: &draft.content,
            category: &draft.category,
            tags: &draft.tags,
        };
        let response = self.send_json(self.client.post(url), &body).await?;
        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        let wire: WireArticle = Self::read_json(response).await?;
        Ok(wire.into_article(None))
    }

    async fn update(&self, id: &str, update: &ArticleUpdate) -> Result<Option<Article>> {
        let Some(mut merged) = self.get(id).await? else {
            return Ok(None);
        };
        let created_at = merged.created_at;
        merged.apply(update.clone());

        let url = self.article_url(id)?;
        tracing::debug!("PUT {}", url);
        let body = WriteBody {
            title: &merged.title,
            content: &merged.content,
            category: &merged.category,
            tags: &merged.tags,
        };
        let response = self.send_json(self.client.put(url), &body).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let wire: WireArticle = Self::read_json(response).await?;
                Ok(Some(wire.into_article(Some(created_at))))
            }
            _ => Err(Self::error_for(response).await),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let url = self.article_url(id)?;
        tracing::debug!("DELETE {}", url);
        let response = self.client.delete(url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            _ => Err(Self::error_for(response).await),
        }
    }
}

#[derive(Debug, Serialize)]
struct WriteBody<'a> {
    title: &'a str,
    content: &'a str,
    category: &'a str,
    tags: &'a [String],
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMetadata {
    id: String,
    title: String,
    #[serde(default)]
    excerpt: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

impl WireMetadata {
    fn into_metadata(self) -> ArticleMetadata {
        let created_at = created_at_or_epoch(&self.id, self.created_at.as_deref());
        let updated_at = self
            .updated_at
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(created_at);
        ArticleMetadata {
            id: self.id,
            title: self.title,
            excerpt: self.excerpt,
            category: self.category.unwrap_or_default(),
            tags: self.tags.unwrap_or_default(),
            created_at,
            updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireArticle {
    id: String,
    title: String,
    content: String,
    #[serde(default)]
    excerpt: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

impl WireArticle {
    /// `known_created_at` fills in for responses that omit `createdAt`.
    fn into_article(self, known_created_at: Option<DateTime<Utc>>) -> Article {
        let updated_at = self.updated_at.as_deref().and_then(parse_timestamp);
        let created_at = match self.created_at.as_deref().and_then(parse_timestamp) {
            Some(ts) => ts,
            None => known_created_at
                .unwrap_or_else(|| created_at_or_epoch(&self.id, self.created_at.as_deref())),
        };
        Article {
            id: self.id,
            title: self.title,
            content: self.content,
            excerpt: self.excerpt,
            category: self.category.unwrap_or_default(),
            tags: self.tags.unwrap_or_default(),
            created_at,
            updated_at: updated_at.unwrap_or(created_at).max(created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base: &str) -> RemoteBackend {
        RemoteBackend::new(base, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_urls_keep_base_path() {
        let b = backend("http://localhost:3000/api");
        assert_eq!(
            b.collection_url().unwrap().as_str(),
            "http://localhost:3000/api/articles"
        );

        let b = backend("http://localhost:3000/api/");
        assert_eq!(
            b.article_url("abc").unwrap().as_str(),
            "http://localhost:3000/api/articles/abc"
        );
    }

    #[test]
    fn test_article_id_is_escaped() {
        let b = backend("http://localhost:3000");
        assert_eq!(
            b.article_url("a/b c").unwrap().as_str(),
            "http://localhost:3000/articles/a%2Fb%20c"
        );
    }

    #[test]
    fn test_rejects_non_base_url() {
        assert!(RemoteBackend::new("mailto:me@example.com", Duration::from_secs(1)).is_err());
        assert!(matches!(
            RemoteBackend::new("not a url", Duration::from_secs(1)),
            Err(FolioError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_list_payload_with_server_extras() {
        let json = r#"[{
            "id": "1", "title": "T", "excerpt": "E", "category": null,
            "tags": ["x", "y"], "created_at": "2024-01-01T00:00:00.000Z",
            "updated_at": "2024-01-02T00:00:00.000Z",
            "createdAt": "2024-01-01T00:00:00.000Z", "updatedAt": "2024-01-02T00:00:00.000Z"
        }]"#;
        let wire: Vec<WireMetadata> = serde_json::from_str(json).unwrap();
        let meta = wire.into_iter().next().unwrap().into_metadata();
        assert_eq!(meta.category, "");
        assert_eq!(meta.tags, vec!["x", "y"]);
        assert!(meta.updated_at > meta.created_at);
    }

    #[test]
    fn test_put_response_without_created_at() {
        let json = r#"{"id": "1", "title": "T", "content": "C", "excerpt": "C",
            "category": "", "tags": [], "updatedAt": "2024-05-01T00:00:00.000Z"}"#;
        let wire: WireArticle = serde_json::from_str(json).unwrap();
        let known = parse_timestamp("2024-01-01T00:00:00Z");
        let article = wire.into_article(known);
        assert_eq!(Some(article.created_at), known);
        assert!(article.updated_at > article.created_at);
    }

    #[test]
    fn test_missing_created_at_is_stable() {
        let json = r#"{"id": "1", "title": "T", "content": "C"}"#;
        let first: WireArticle = serde_json::from_str(json).unwrap();
        let second: WireArticle = serde_json::from_str(json).unwrap();
        let first = first.into_article(None);
        assert_eq!(first.created_at, second.into_article(None).created_at);
        assert_eq!(first.created_at, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(first.updated_at, first.created_at);

        let wire: Vec<WireMetadata> =
            serde_json::from_str(r#"[{"id": "2", "title": "T", "createdAt": "bad"}]"#).unwrap();
        let meta = wire.into_iter().next().unwrap().into_metadata();
        assert_eq!(meta.created_at, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn test_write_body_shape() {
        let tags = vec!["a".to_string()];
        let body = WriteBody {
            title: "T",
            content: "C",
            category: "",
            tags: &tags,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"title": "T", "content": "C", "category": "", "tags": ["a"]})
        );
    }
}
