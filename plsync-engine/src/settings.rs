//! Engine settings handling.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{EngineError, EngineResult};
use crate::pool::PoolConfig;

/// Default settings file name (lives in project root)
pub const SETTINGS_FILE_NAME: &str = "plsync.toml";

/// Default DDL time cache path (relative to project root)
pub const CACHE_PATH: &str = ".plsync/ddl_times.db";

/// Default DDL generator function
pub const DDL_GENERATOR: &str = "dbms_metadata.get_ddl";

/// Warning scope meaning "no warnings"
pub const NO_WARNING_SCOPE: &str = "NONE";

/// plsync engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// DDL time cache file
    pub cache_path: PathBuf,

    /// Function producing object definitions on export
    pub ddl_generator: String,

    /// Compiler warning scope (`NONE`, `ALL`, `SEVERE`, `PERFORMANCE`, `INFORMATIONAL`)
    pub warning_scope: String,

    /// Pool sizing
    pub pool: PoolSettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            cache_path: PathBuf::from(CACHE_PATH),
            ddl_generator: DDL_GENERATOR.to_string(),
            warning_scope: NO_WARNING_SCOPE.to_string(),
            pool: PoolSettings::default(),
        }
    }
}

impl EngineSettings {
    /// Load settings from a file
    pub fn load(path: &Path) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::settings(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Settings of the project at `root`.
    ///
    /// Reads `root/plsync.toml` when present, otherwise uses defaults. A
    /// relative cache path is anchored at `root`.
    pub fn for_project(root: &Path) -> EngineResult<Self> {
        let path = root.join(SETTINGS_FILE_NAME);
        let mut settings = if path.exists() {
            Self::load(&path)?
        } else {
            Self::default()
        };

        if settings.cache_path.is_relative() {
            settings.cache_path = root.join(&settings.cache_path);
        }
        Ok(settings)
    }

    /// Parse settings from TOML text
    pub fn from_toml_str(content: &str) -> EngineResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Pool configuration derived from the `[pool]` table
    pub fn pool_config(&self) -> PoolConfig {
        self.pool.to_pool_config()
    }
}

/// Pool sizing settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    /// Maximum sessions per (environment, user) pool
    pub max_connections: u32,

    /// Idle sessions to keep open
    pub min_idle: Option<u32>,

    /// Seconds to wait for a session
    pub connection_timeout_secs: u64,

    /// Seconds before an idle session is closed (0 disables)
    pub idle_timeout_secs: u64,

    /// Seconds before a session is recycled (0 disables)
    pub max_lifetime_secs: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_idle: None,
            connection_timeout_secs: 30,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

impl PoolSettings {
    fn to_pool_config(&self) -> PoolConfig {
        let optional = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));
        PoolConfig {
            max_connections: self.max_connections.max(1),
            min_idle: self.min_idle,
            connection_timeout: Duration::from_secs(self.connection_timeout_secs.max(1)),
            idle_timeout: optional(self.idle_timeout_secs),
            max_lifetime: optional(self.max_lifetime_secs),
        }
    }
}
