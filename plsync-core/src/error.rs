//! Error types shared by the plsync crates.

use thiserror::Error;

/// Result type for configuration resolution.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for database session calls.
pub type DbResult<T> = Result<T, DbError>;

/// Database error number raised when a name cannot be resolved in the
/// requested resolution context (ORA-04047).
pub const NAME_NOT_RESOLVABLE_IN_CONTEXT: i32 = 4047;

/// Errors raised while selecting a connection configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No environment name was given.
    #[error("no environment given")]
    MissingEnvironment,

    /// The environment has no entry in the configuration set.
    #[error("dbconfig: environment \"{0}\" is not configured")]
    UnknownEnvironment(String),

    /// The environment entry has no `users` list.
    #[error("dbconfig: invalid structure for \"{0}\" env, missing users list")]
    InvalidStructure(String),

    /// The environment has an empty `users` list.
    #[error("dbconfig: no user for \"{0}\" env")]
    NoUsers(String),

    /// Several users remain and no single default breaks the tie.
    #[error("dbconfig: no default connection configuration for \"{0}\" env")]
    NoDefault(String),

    /// The configuration document could not be parsed.
    #[error("dbconfig: parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration document could not be read.
    #[error("dbconfig: I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Check if this error comes from an ambiguous or missing user selection.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::NoDefault(_))
    }
}

/// A fault raised by the database or its driver.
///
/// Mirrors what a driver reports: the vendor error number, the character
/// offset into the submitted text where parsing stopped, and the raw message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct DbError {
    /// Vendor error number, e.g. `6550` for ORA-06550.
    pub code: Option<i32>,
    /// Character offset into the submitted source, when the database gives one.
    pub offset: Option<usize>,
    /// Raw error text as returned by the driver.
    pub message: String,
}

impl DbError {
    /// Create an error with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            offset: None,
            message: message.into(),
        }
    }

    /// Set the vendor error number.
    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }

    /// Set the offset into the submitted source.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// The error number formatted as `ORA-NNNNN`.
    pub fn ora_code(&self) -> Option<String> {
        self.code.map(|code| format!("ORA-{:05}", code))
    }

    /// Check if this is the "name not resolvable in this context" condition.
    pub fn is_name_not_resolvable(&self) -> bool {
        self.code == Some(NAME_NOT_RESOLVABLE_IN_CONTEXT)
    }
}
