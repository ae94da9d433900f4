//! Remote change detection and the export path.

use plsync_cache::DdlTimeStore;
use plsync_core::identifiers;
use plsync_core::source::normalize_exported;
use plsync_core::{DbResult, DbSession, DdlTime, ObjectFilter, ObjectIdentity};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::EngineResult;

/// Current DDL time of `identity`, from the first catalog row.
pub async fn last_ddl_time<S>(session: &mut S, identity: &ObjectIdentity) -> DbResult<Option<DdlTime>>
where
    S: DbSession + ?Sized,
{
    let rows = session.objects_info(&ObjectFilter::for_identity(identity)).await?;
    Ok(rows.into_iter().next().and_then(|row| row.last_ddl_time))
}

/// Check if the object changed remotely since it was last synced.
///
/// True only when both the remote and the cached time are known and their
/// canonical forms differ. Unknown is treated as unchanged.
pub async fn has_remote_changed_since<S>(
    session: &mut S,
    store: &dyn DdlTimeStore,
    identity: &ObjectIdentity,
) -> EngineResult<bool>
where
    S: DbSession + ?Sized,
{
    let remote = last_ddl_time(session, identity).await?;
    let cached = store.get(identity).await?;

    let changed = match (&remote, &cached) {
        (Some(remote), Some(cached)) => remote.canonical() != *cached,
        _ => false,
    };
    debug!(
        object = %identity,
        remote = ?remote.map(|t| t.canonical()),
        cached = ?cached,
        changed,
        "Compared DDL times"
    );
    Ok(changed)
}

/// Record the object's current remote DDL time in the cache.
///
/// An object without a DDL time is recorded as NULL.
pub async fn sync_ddl_time<S>(
    session: &mut S,
    store: &dyn DdlTimeStore,
    identity: &ObjectIdentity,
) -> EngineResult<Option<DdlTime>>
where
    S: DbSession + ?Sized,
{
    let remote = last_ddl_time(session, identity).await?;
    store.put(identity, remote).await?;
    Ok(remote)
}

/// Result of an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    /// The remote definition when exported, otherwise the local code.
    pub code: String,
    /// Whether `code` came from the database.
    pub exported: bool,
}

impl ExportReport {
    fn kept(local_code: &str) -> Self {
        Self {
            code: local_code.to_string(),
            exported: false,
        }
    }
}

/// Pulls object definitions from the database.
pub struct Exporter<'a> {
    store: &'a dyn DdlTimeStore,
    generator: &'a str,
}

impl<'a> Exporter<'a> {
    /// Create an exporter using `generator` to produce definitions.
    pub fn new(store: &'a dyn DdlTimeStore, generator: &'a str) -> Self {
        Self { store, generator }
    }

    /// Export `identity`.
    ///
    /// A lenient export only fetches when the object changed remotely. Faults
    /// never escape: they are logged and the local code is kept.
    pub async fn export<S>(
        &self,
        session: &mut S,
        identity: &ObjectIdentity,
        local_code: &str,
        lenient: bool,
    ) -> ExportReport
    where
        S: DbSession + ?Sized,
    {
        match self.fetch(session, identity, lenient).await {
            Ok(Some(code)) => {
                debug!(object = %identity, "Exported object definition");
                ExportReport { code, exported: true }
            }
            Ok(None) => ExportReport::kept(local_code),
            Err(e) => {
                warn!(object = %identity, error = %e, "Export failed, keeping local code");
                ExportReport::kept(local_code)
            }
        }
    }

    async fn fetch<S>(&self, session: &mut S, identity: &ObjectIdentity, lenient: bool) -> EngineResult<Option<String>>
    where
        S: DbSession + ?Sized,
    {
        let generator = identifiers::function_name(self.generator)?;

        if lenient && !has_remote_changed_since(session, self.store, identity).await? {
            debug!(object = %identity, "Remote unchanged, skipping export");
            return Ok(None);
        }

        debug!(object = %identity, generator, type_code = identity.type_code(), "Fetching object definition");
        let Some(ddl) = session.object_ddl(generator, identity).await? else {
            warn!(object = %identity, generator, "DDL generator returned no definition");
            return Ok(None);
        };

        let code = normalize_exported(&ddl);
        sync_ddl_time(session, self.store, identity).await?;
        Ok(Some(code))
    }
}
