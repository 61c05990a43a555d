//! Error types for the card pipelines.

use thiserror::Error;

/// Failure talking to the remote card store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Backend error: {status} - {message}")]
    Backend { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("File system error: {0}")]
    FileSystem(String),
}

/// Errors that abort a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Remote store unreachable: {0}")]
    Unreachable(StoreError),

    #[error("Failed to create required deck {name:?}: {source}")]
    RequiredDeck { name: String, source: StoreError },

    #[error("Failed to index remote decks: {0}")]
    Index(#[from] StoreError),
}

/// Speech synthesis errors.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Rate limited by speech service")]
    RateLimited,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Speech service error: {status} - {message}")]
    Backend { status: u16, message: String },

    #[error("Invalid audio payload: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AudioError {
    /// Only rate limiting is worth waiting out.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}

/// Anki package writing errors.
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Missing or invalid configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {name}: {message}")]
    Invalid { name: &'static str, message: String },
}
