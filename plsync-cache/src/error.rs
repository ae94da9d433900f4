//! Error types for the DDL time cache.

use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors that can occur while reading or writing the cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// SQLite error.
    #[error("cache database error: {0}")]
    Sqlite(#[from] tokio_rusqlite::Error),

    /// The cache directory could not be created.
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for CacheError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Sqlite(tokio_rusqlite::Error::Rusqlite(err))
    }
}

impl CacheError {
    /// Check if the underlying store could not be reached.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Sqlite(tokio_rusqlite::Error::ConnectionClosed))
    }
}
