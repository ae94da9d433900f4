//! Error types for engine operations.

use plsync_cache::CacheError;
use plsync_core::{ConfigError, DbError};
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur during engine operations.
///
/// Export and compile convert most database faults into diagnostics or an
/// `exported = false` flag; only precondition failures surface here.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Connection configuration could not be resolved.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The database raised a fault.
    #[error("database error: {0}")]
    Database(#[from] DbError),

    /// The DDL time cache failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Connection pool error.
    #[error("pool error: {0}")]
    Pool(String),

    /// Waiting for a pooled connection timed out.
    #[error("timed out waiting for a pooled connection")]
    Timeout,

    /// The artifact path does not map to a usable object identity.
    #[error("cannot derive an object identity from \"{0}\"")]
    InvalidIdentity(String),

    /// No resolution context matched the name.
    #[error("could not resolve name \"{0}\" in any context")]
    NameNotResolved(String),

    /// Engine settings could not be loaded.
    #[error("settings error: {0}")]
    Settings(String),
}

impl EngineError {
    /// Create a pool error.
    pub fn pool(message: impl Into<String>) -> Self {
        Self::Pool(message.into())
    }

    /// Create a settings error.
    pub fn settings(message: impl Into<String>) -> Self {
        Self::Settings(message.into())
    }

    /// Raw fault text, as reported by the database for database faults.
    pub fn fault_message(&self) -> String {
        match self {
            Self::Database(e) => e.message.clone(),
            other => other.to_string(),
        }
    }

    /// Offset into the submitted source, when the database reported one.
    pub fn fault_offset(&self) -> Option<usize> {
        match self {
            Self::Database(e) => e.offset,
            _ => None,
        }
    }

    /// Check if this is a connection error.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Pool(_) | Self::Timeout)
    }

    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Check if a name could not be resolved.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NameNotResolved(_))
    }
}

impl From<bb8::RunError<DbError>> for EngineError {
    fn from(err: bb8::RunError<DbError>) -> Self {
        match err {
            bb8::RunError::User(e) => EngineError::Pool(format!("failed to open session: {}", e)),
            bb8::RunError::TimedOut => EngineError::Timeout,
        }
    }
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        EngineError::Settings(err.to_string())
    }
}
