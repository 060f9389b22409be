use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::app::error::{FolioError, Result};
use crate::config::{BackendKind, Config};
use crate::render::{HtmlRenderer, MarkdownRenderer};
use crate::store::{ArticleBackend, ArticleStore, RemoteBackend, SqliteBackend};

pub struct AppContext {
    pub config: Config,
    pub store: ArticleStore,
    pub renderer: Arc<dyn MarkdownRenderer>,
}

impl AppContext {
    /// Build the context for the backend `config` selects and load the
    /// article list.
    pub async fn new(config: Config) -> Result<Self> {
        let backend = Self::backend_for(&config)?;
        Self::with_backend(config, backend).await
    }

    pub async fn in_memory() -> Result<Self> {
        let backend: Arc<dyn ArticleBackend> = Arc::new(SqliteBackend::in_memory()?);
        Self::with_backend(Config::default(), backend).await
    }

    pub async fn with_backend(config: Config, backend: Arc<dyn ArticleBackend>) -> Result<Self> {
        let store = ArticleStore::new(backend);
        // Commands that only read or write one article still work when the
        // listing fails; an unusable store does not.
        match store.load().await {
            Ok(()) => {}
            Err(e @ (FolioError::StorageUnavailable(_) | FolioError::Database(_))) => return Err(e),
            Err(e) => tracing::warn!("Loading the article list failed: {}", e),
        }
        tracing::debug!("Using {} article backend", store.backend_name());

        Ok(Self {
            config,
            store,
            renderer: Arc::new(HtmlRenderer::new()),
        })
    }

    fn backend_for(config: &Config) -> Result<Arc<dyn ArticleBackend>> {
        let storage = &config.storage;
        match storage.backend {
            BackendKind::Local => {
                let db_path = match storage.db_path {
                    Some(ref p) => p.clone(),
                    None => Self::default_db_path()?,
                };
                Ok(Arc::new(SqliteBackend::open(db_path)?))
            }
            BackendKind::Remote => {
                let url = storage.remote_url.as_deref().ok_or_else(|| {
                    FolioError::Config("remote backend selected but remote_url is not set".into())
                })?;
                let timeout = Duration::from_secs(storage.timeout_secs.max(1));
                Ok(Arc::new(RemoteBackend::new(url, timeout)?))
            }
        }
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| FolioError::Config("Could not find data directory".into()))?;
        Ok(data_dir.join("folio").join("articles.db"))
    }
}
