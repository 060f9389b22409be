use thiserror::Error;

#[derive(Error, Debug)]
pub enum FolioError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Article not found: {0}")]
    NotFound(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote service returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FolioError {
    /// True for failures of the network transport itself (connect, timeout,
    /// body read), as opposed to a well-formed error answer from the server.
    pub fn is_transport(&self) -> bool {
        matches!(self, FolioError::Http(_))
    }
}

pub type Result<T> = std::result::Result<T, FolioError>;
