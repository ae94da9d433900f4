//! The engine facade used by front ends.
//!
//! [`SyncEngine`] ties configuration, pools and the DDL time cache together.
//! Every call derives the object identity from the artifact path, resolves
//! the connection for it, leases a session and releases it before
//! returning, whatever the outcome.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use plsync_cache::{DdlTimeStore, SqliteDdlCache};
use plsync_core::identifiers;
use plsync_core::{
    ConnectionConfig, Connector, DbConfig, DbSession, DiagnosticList, ExecuteOutcome, ObjectFilter,
    ObjectIdentity, ObjectInfo, ObjectType,
};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::compiler::{CompileOptions, CompileReport, Compiler};
use crate::error::{EngineError, EngineResult};
use crate::pool::ConnectionPoolManager;
use crate::resolver::NameResolver;
use crate::settings::EngineSettings;
use crate::sync::Exporter;

/// Result of exporting one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportOutcome {
    /// Identity with the effective owner.
    pub identity: ObjectIdentity,
    /// Remote definition when exported, otherwise the local code.
    pub code: String,
    /// Whether `code` came from the database.
    pub exported: bool,
}

/// Result of compiling one artifact or selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileOutcome {
    /// Identity with the effective owner.
    pub identity: ObjectIdentity,
    /// Artifact path.
    pub file: PathBuf,
    /// Environment compiled against.
    pub env: String,
    /// Diagnostics of the attempt.
    pub diagnostics: DiagnosticList,
    /// Raw execution result.
    pub execution: Option<ExecuteOutcome>,
    /// Server output lines.
    pub output_lines: Vec<String>,
}

/// A resolved name with its catalog rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedObject {
    /// Owning schema.
    pub owner: String,
    /// Object name.
    pub object_name: String,
    /// Resolution context that matched.
    pub context: u8,
    /// Identity of the first catalog row, absent when there is none.
    pub identity: Option<ObjectIdentity>,
    /// Catalog rows of every object with that owner and name.
    pub objects: Vec<ObjectInfo>,
}

/// A call to a server-side generator function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorRequest {
    /// Generator function, e.g. `hr.api_gen.table_api`.
    pub function: String,
    /// Artifact the generator works on.
    pub file: PathBuf,
    /// Environment.
    pub env: String,
    /// Sub-object selected in the artifact, if any.
    pub selected: Option<String>,
}

/// Result of a generator call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratorOutcome {
    /// Identity with the effective owner.
    pub identity: ObjectIdentity,
    /// Artifact path.
    pub file: PathBuf,
    /// Environment.
    pub env: String,
    /// Generated text.
    pub output: Option<String>,
}

/// Synchronization and compilation engine.
pub struct SyncEngine<C: Connector> {
    config: DbConfig,
    pools: ConnectionPoolManager<C>,
    store: Arc<dyn DdlTimeStore>,
    settings: EngineSettings,
}

impl<C: Connector> SyncEngine<C> {
    /// Create an engine over an existing DDL time store.
    pub fn new(config: DbConfig, connector: C, store: Arc<dyn DdlTimeStore>, settings: EngineSettings) -> Self {
        let pools = ConnectionPoolManager::with_pool_config(connector, settings.pool_config());
        Self {
            config,
            pools,
            store,
            settings,
        }
    }

    /// Create an engine with the SQLite cache at `settings.cache_path`.
    pub async fn open(config: DbConfig, connector: C, settings: EngineSettings) -> EngineResult<Self> {
        let cache = SqliteDdlCache::open(&settings.cache_path).await?;
        Ok(Self::new(config, connector, Arc::new(cache), settings))
    }

    /// Connection configuration set.
    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Engine settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Session pools.
    pub fn pools(&self) -> &ConnectionPoolManager<C> {
        &self.pools
    }

    /// DDL time store.
    pub fn store(&self) -> &dyn DdlTimeStore {
        self.store.as_ref()
    }

    /// Guarded compile options with the configured warning scope.
    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions::new().warning_scope(self.settings.warning_scope.as_str())
    }

    /// Configured users of an environment.
    pub fn users(&self, env: &str) -> Vec<String> {
        self.config.users(env)
    }

    /// `user/password@connect` for an environment and optional user.
    pub fn connection_string(&self, env: &str, user: Option<&str>) -> EngineResult<String> {
        Ok(self.config.resolve(env, user)?.connection_string())
    }

    fn target(&self, file: &Path, env: &str, require_valid: bool) -> EngineResult<(ObjectIdentity, ConnectionConfig)> {
        let path = file.to_string_lossy();
        let identity = ObjectIdentity::from_path(&path);
        if require_valid && !identity.is_valid() {
            return Err(EngineError::InvalidIdentity(path.into_owned()));
        }

        let conn = self.config.resolve(env, identity.owner.as_deref())?;
        let identity = identity.with_owner(&conn.effective_owner());
        Ok((identity, conn))
    }

    /// Export the object behind `file`.
    ///
    /// Returns the remote definition when it was fetched, otherwise `code`.
    #[instrument(skip(self, code, file), fields(file = %file.display()))]
    pub async fn export_file(&self, code: &str, file: &Path, env: &str, lenient: bool) -> EngineResult<ExportOutcome> {
        let (identity, conn) = self.target(file, env, true)?;
        let mut lease = self.pools.lease(&conn).await?;

        let report = Exporter::new(self.store.as_ref(), &self.settings.ddl_generator)
            .export(&mut *lease, &identity, code, lenient)
            .await;
        self.pools.release(lease);

        Ok(ExportOutcome {
            identity,
            code: report.code,
            exported: report.exported,
        })
    }

    /// Compile `code` as the definition of the object behind `file`.
    #[instrument(skip(self, code, file, options), fields(file = %file.display(), force = options.force))]
    pub async fn compile_file(
        &self,
        code: &str,
        file: &Path,
        env: &str,
        options: &CompileOptions,
    ) -> EngineResult<CompileOutcome> {
        let (identity, conn) = self.target(file, env, true)?;
        let mut lease = self.pools.lease(&conn).await?;

        let report = Compiler::new(self.store.as_ref())
            .compile(&mut *lease, &identity, code, options)
            .await;
        self.pools.release(lease);

        Ok(outcome(identity, file, env, report))
    }

    /// Compile a fragment of `file` starting at `line_offset`.
    #[instrument(skip(self, code, file), fields(file = %file.display()))]
    pub async fn compile_selection(
        &self,
        code: &str,
        file: &Path,
        env: &str,
        line_offset: u32,
    ) -> EngineResult<CompileOutcome> {
        let (identity, conn) = self.target(file, env, false)?;
        let mut lease = self.pools.lease(&conn).await?;

        let report = Compiler::new(self.store.as_ref())
            .compile_selection(&mut *lease, code, line_offset)
            .await;
        self.pools.release(lease);

        Ok(outcome(identity, file, env, report))
    }

    /// Resolve an unqualified name and fetch the catalog rows it names.
    ///
    /// The rows are read on a session of the resolved owner.
    #[instrument(skip(self))]
    pub async fn resolve_object(&self, env: &str, name: &str) -> EngineResult<ResolvedObject> {
        let conn = self.config.resolve(env, None)?;
        let resolved = {
            let mut lease = self.pools.lease(&conn).await?;
            NameResolver::new().resolve(&mut *lease, name).await?
        };

        let owner_conn = self.config.resolve(env, Some(&resolved.owner))?;
        let mut lease = self.pools.lease(&owner_conn).await?;
        let objects = lease
            .objects_info(&ObjectFilter::owner(resolved.owner.as_str()).with_name(resolved.object_name.as_str()))
            .await?;
        debug!(owner = %resolved.owner, objects = objects.len(), "Fetched resolved objects");

        Ok(ResolvedObject {
            owner: resolved.owner,
            object_name: resolved.object_name,
            context: resolved.context,
            identity: objects.first().map(ObjectInfo::identity),
            objects,
        })
    }

    /// Catalog rows of `owner` for each of `types`, in the order given.
    #[instrument(skip(self, types))]
    pub async fn objects_by_type(&self, env: &str, owner: &str, types: &[ObjectType]) -> EngineResult<Vec<ObjectInfo>> {
        let conn = self.config.resolve(env, Some(owner))?;
        let mut lease = self.pools.lease(&conn).await?;

        let mut objects = Vec::new();
        for object_type in types {
            let filter = ObjectFilter::owner(owner).with_type(*object_type);
            objects.extend(lease.objects_info(&filter).await?);
        }
        Ok(objects)
    }

    /// Run a server-side generator for the object behind `request.file`.
    #[instrument(skip(self, request), fields(function = %request.function))]
    pub async fn run_generator(&self, request: &GeneratorRequest) -> EngineResult<GeneratorOutcome> {
        let function = identifiers::function_name(&request.function)?;
        let (identity, conn) = self.target(&request.file, &request.env, true)?;
        let mut lease = self.pools.lease(&conn).await?;

        let output = lease
            .call_generator(function, &identity, request.selected.as_deref())
            .await?;

        Ok(GeneratorOutcome {
            identity,
            file: request.file.clone(),
            env: request.env.clone(),
            output,
        })
    }

    /// Drop every session pool.
    pub async fn close(&self) {
        self.pools.close().await;
    }
}

fn outcome(identity: ObjectIdentity, file: &Path, env: &str, report: CompileReport) -> CompileOutcome {
    CompileOutcome {
        identity,
        file: file.to_path_buf(),
        env: env.to_string(),
        diagnostics: report.diagnostics,
        execution: report.execution,
        output_lines: report.output_lines,
    }
}
