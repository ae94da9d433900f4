//! The DDL time store and its SQLite implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use plsync_core::{DdlTime, ObjectIdentity};
use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;
use tracing::{debug, info};

use crate::error::CacheResult;

const INIT_SQL: &str = "
    PRAGMA journal_mode = WAL;
    CREATE TABLE IF NOT EXISTS ddl_times (
        key TEXT PRIMARY KEY NOT NULL,
        owner TEXT NOT NULL,
        object_type TEXT NOT NULL,
        object_name TEXT NOT NULL,
        last_ddl_time TEXT NULL,
        synced_at TEXT NOT NULL
    );
";

const SELECT_SQL: &str = "SELECT last_ddl_time FROM ddl_times WHERE key = ?1";

const UPSERT_SQL: &str = "
    INSERT INTO ddl_times (key, owner, object_type, object_name, last_ddl_time, synced_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    ON CONFLICT(key) DO UPDATE SET
        last_ddl_time = excluded.last_ddl_time,
        synced_at = excluded.synced_at
";

/// Persisted map from object identity to its last observed DDL time.
#[async_trait]
pub trait DdlTimeStore: Send + Sync {
    /// The canonical DDL time recorded for `identity`, if any.
    async fn get(&self, identity: &ObjectIdentity) -> CacheResult<Option<String>>;

    /// Record `time` for `identity`, replacing any previous record.
    ///
    /// An absent time is stored as NULL and reads back as `None`.
    async fn put(&self, identity: &ObjectIdentity, time: Option<DdlTime>) -> CacheResult<()>;
}

/// A cached record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdlTimeRecord {
    /// Cache key, `OWNER.TYPE.NAME`.
    pub key: String,
    /// Canonical last DDL time.
    pub last_ddl_time: Option<String>,
    /// RFC 3339 time of the last write.
    pub synced_at: String,
}

/// SQLite-backed [`DdlTimeStore`].
///
/// All statements run on the connection's worker thread, so upserts of the
/// same key never interleave.
#[derive(Clone)]
pub struct SqliteDdlCache {
    conn: Connection,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for SqliteDdlCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDdlCache").field("path", &self.path).finish()
    }
}

impl SqliteDdlCache {
    /// Open or create a cache file, creating parent directories as needed.
    pub async fn open(path: impl AsRef<Path>) -> CacheResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let conn = Connection::open(&path).await?;
        Self::init(&conn).await?;
        info!(path = %path.display(), "DDL time cache opened");

        Ok(Self { conn, path: Some(path) })
    }

    /// Open a cache that lives only as long as this value.
    pub async fn open_in_memory() -> CacheResult<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(&conn).await?;
        Ok(Self { conn, path: None })
    }

    async fn init(conn: &Connection) -> CacheResult<()> {
        conn.call(|conn| {
            conn.execute_batch(INIT_SQL)?;
            Ok(())
        })
        .await?;
        Ok(())
    }

    /// Path of the backing file, `None` for in-memory caches.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of cached records.
    pub async fn len(&self) -> CacheResult<usize> {
        let count = self
            .conn
            .call(|conn| {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM ddl_times", [], |row| row.get(0))?;
                Ok(count)
            })
            .await?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Check if the cache holds no records.
    pub async fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len().await? == 0)
    }

    /// All records, ordered by key.
    pub async fn records(&self) -> CacheResult<Vec<DdlTimeRecord>> {
        let records = self
            .conn
            .call(|conn| {
                let mut stmt =
                    conn.prepare("SELECT key, last_ddl_time, synced_at FROM ddl_times ORDER BY key")?;
                let rows = stmt.query_map([], |row| {
                    Ok(DdlTimeRecord {
                        key: row.get(0)?,
                        last_ddl_time: row.get(1)?,
                        synced_at: row.get(2)?,
                    })
                })?;
                let records: Result<Vec<_>, _> = rows.collect();
                Ok(records?)
            })
            .await?;
        Ok(records)
    }
}

#[async_trait]
impl DdlTimeStore for SqliteDdlCache {
    async fn get(&self, identity: &ObjectIdentity) -> CacheResult<Option<String>> {
        let key = identity.cache_key();
        let value = self
            .conn
            .call(move |conn| {
                let value: Option<Option<String>> = conn
                    .query_row(SELECT_SQL, [&key], |row| row.get(0))
                    .optional()?;
                Ok(value.flatten())
            })
            .await?;
        Ok(value)
    }

    async fn put(&self, identity: &ObjectIdentity, time: Option<DdlTime>) -> CacheResult<()> {
        let key = identity.cache_key();
        let owner = identity.owner_str().to_string();
        let object_type = identity.type_name().to_string();
        let object_name = identity.object_name.clone();
        let last_ddl_time = time.map(|t| t.canonical());
        let synced_at = Utc::now().to_rfc3339();

        debug!(key = %key, last_ddl_time = ?last_ddl_time, "Recording DDL time");

        self.conn
            .call(move |conn| {
                conn.execute(
                    UPSERT_SQL,
                    rusqlite::params![key, owner, object_type, object_name, last_ddl_time, synced_at],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}
