//! The compile path.
//!
//! A compile submits local source, then reads back the error catalog and the
//! server output buffer. Unless forced, it first refuses to overwrite an
//! object that changed remotely since the last sync. Database faults raised
//! while submitting become `System` diagnostics located in the source.

use plsync_cache::DdlTimeStore;
use plsync_core::identifiers;
use plsync_core::source::prepare_for_compile;
use plsync_core::{
    Attribute, DbResult, DbSession, Diagnostic, DiagnosticList, ExecuteOutcome, ObjectIdentity,
    line_and_position, parse_system_fault,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};
use crate::settings::NO_WARNING_SCOPE;
use crate::sync::{has_remote_changed_since, sync_ddl_time};

/// Options of a single compile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Skip the stale-object guard and leave the cache untouched.
    pub force: bool,
    /// Warning scope to enable, `None` for no scope.
    pub warning_scope: Option<String>,
}

impl CompileOptions {
    /// Guarded compile without warnings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the force flag.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Set the warning scope. `NONE` (any case) disables warnings.
    pub fn warning_scope(mut self, scope: impl Into<String>) -> Self {
        let scope = scope.into();
        self.warning_scope = if scope.trim().is_empty() || scope.eq_ignore_ascii_case(NO_WARNING_SCOPE) {
            None
        } else {
            Some(scope)
        };
        self
    }
}

/// Result of a compile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompileReport {
    /// Catalog, guard or system diagnostics.
    pub diagnostics: DiagnosticList,
    /// Raw execution result, absent when nothing was executed successfully.
    pub execution: Option<ExecuteOutcome>,
    /// Server output lines.
    pub output_lines: Vec<String>,
}

/// Submits source for compilation.
pub struct Compiler<'a> {
    store: &'a dyn DdlTimeStore,
}

impl<'a> Compiler<'a> {
    /// Create a compiler recording DDL times in `store`.
    pub fn new(store: &'a dyn DdlTimeStore) -> Self {
        Self { store }
    }

    /// Compile `code` as the definition of `identity`.
    pub async fn compile<S>(
        &self,
        session: &mut S,
        identity: &ObjectIdentity,
        code: &str,
        options: &CompileOptions,
    ) -> CompileReport
    where
        S: DbSession + ?Sized,
    {
        let code = prepare_for_compile(code);
        let mut report = CompileReport::default();

        if let Err(e) = self.run(session, identity, &code, options, &mut report).await {
            warn!(object = %identity, error = %e, "Compile raised a fault");
            report.diagnostics = fault_diagnostics(&e, &code, 1);
        }
        report
    }

    async fn run<S>(
        &self,
        session: &mut S,
        identity: &ObjectIdentity,
        code: &str,
        options: &CompileOptions,
        report: &mut CompileReport,
    ) -> EngineResult<()>
    where
        S: DbSession + ?Sized,
    {
        if let Some(scope) = options.warning_scope.as_deref() {
            identifiers::warning_scope(scope)?;
        }

        if !options.force && has_remote_changed_since(session, self.store, identity).await? {
            debug!(object = %identity, "Remote object changed, refusing to compile");
            report.diagnostics.push(Diagnostic::object_changed());
            return Ok(());
        }

        report.execution = Some(submit(session, code, options.warning_scope.as_deref()).await?);

        if !options.force {
            sync_ddl_time(session, self.store, identity).await?;
        }

        report.diagnostics = session
            .catalog_errors(identity)
            .await?
            .into_iter()
            .map(|row| Diagnostic::compiler(row.line, row.position, Attribute::parse(&row.attribute), row.text.replace('\n', "")))
            .collect();
        report.output_lines = drain_output(session).await?;

        debug!(
            object = %identity,
            diagnostics = report.diagnostics.len(),
            output_lines = report.output_lines.len(),
            "Compiled object"
        );
        Ok(())
    }

    /// Compile a fragment of a file.
    ///
    /// No guard, no cache update and no catalog lookup. Fault lines are
    /// shifted by `line_offset` so they point into the whole file.
    pub async fn compile_selection<S>(&self, session: &mut S, code: &str, line_offset: u32) -> CompileReport
    where
        S: DbSession + ?Sized,
    {
        let code = prepare_for_compile(code);
        let mut report = CompileReport::default();

        let result: EngineResult<()> = async {
            report.execution = Some(submit(session, &code, None).await?);
            report.output_lines = drain_output(session).await?;
            Ok(())
        }
        .await;

        if let Err(e) = result {
            warn!(line_offset, error = %e, "Selection compile raised a fault");
            report.diagnostics = fault_diagnostics(&e, &code, line_offset);
        }
        report
    }
}

async fn submit<S>(session: &mut S, code: &str, warning_scope: Option<&str>) -> DbResult<ExecuteOutcome>
where
    S: DbSession + ?Sized,
{
    if let Some(scope) = warning_scope {
        session.set_warning_scope(scope).await?;
    }
    session.enable_output().await?;
    session.execute(code).await
}

/// Read the server output buffer until it reports end of data.
pub async fn drain_output<S>(session: &mut S) -> DbResult<Vec<String>>
where
    S: DbSession + ?Sized,
{
    let mut lines = Vec::new();
    loop {
        let read = session.output_line().await?;
        if read.status != 0 {
            return Ok(lines);
        }
        if let Some(line) = read.line {
            lines.push(line);
        }
    }
}

fn fault_diagnostics(err: &EngineError, code: &str, line_offset: u32) -> DiagnosticList {
    let (line, position) = line_and_position(code, err.fault_offset());
    parse_system_fault(&err.fault_message(), line_offset, line, position)
}
