//! In-memory database for tests.
//!
//! [`FakeDatabase`] keeps a catalog of objects, scripted name resolutions and
//! output lines, and records every call made against it. Clones share state,
//! so a test keeps one handle while the engine owns the connector.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use plsync_core::{
    CatalogError, ConnectionConfig, Connector, DbError, DbResult, DbSession, DdlTime,
    ExecuteOutcome, NameResolution, NAME_NOT_RESOLVABLE_IN_CONTEXT, ObjectFilter, ObjectIdentity,
    ObjectInfo, OutputLine,
};

/// An object in the fake catalog.
#[derive(Debug, Clone)]
pub struct FakeObject {
    /// Identity of the object.
    pub identity: ObjectIdentity,
    /// Definition returned by the DDL generator.
    pub ddl: Option<String>,
    /// Current last DDL time.
    pub last_ddl_time: Option<DdlTime>,
    /// `VALID` or `INVALID`.
    pub status: String,
    /// Rows returned from the error catalog.
    pub errors: Vec<CatalogError>,
}

impl FakeObject {
    /// A valid object with a definition and DDL time.
    pub fn new(identity: ObjectIdentity, ddl: &str, last_ddl_time: &str) -> Self {
        Self {
            identity,
            ddl: Some(ddl.to_string()),
            last_ddl_time: DdlTime::from_canonical(last_ddl_time).ok(),
            status: "VALID".to_string(),
            errors: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    objects: Vec<(i64, FakeObject)>,
    next_object_id: i64,
    resolutions: Vec<(String, u8, NameResolution)>,
    resolve_faults: HashMap<u8, DbError>,
    generators: HashMap<String, String>,
    output: VecDeque<String>,
    compile_times: HashMap<String, DdlTime>,
    execute_fault: Option<DbError>,
    ddl_fault: Option<DbError>,
    connect_fault: Option<DbError>,
    executed: Vec<String>,
    warning_scopes: Vec<String>,
    resolve_attempts: Vec<(String, u8)>,
    generator_calls: Vec<(String, String, Option<String>)>,
    ddl_calls: Vec<(String, String, String, String)>,
    connects: Vec<String>,
    output_enabled: usize,
}

impl State {
    fn object(&self, identity: &ObjectIdentity) -> Option<&FakeObject> {
        let key = identity.cache_key();
        self.objects
            .iter()
            .map(|(_, obj)| obj)
            .find(|obj| obj.identity.cache_key() == key)
    }

    fn object_mut(&mut self, identity: &ObjectIdentity) -> Option<&mut FakeObject> {
        let key = identity.cache_key();
        self.objects
            .iter_mut()
            .map(|(_, obj)| obj)
            .find(|obj| obj.identity.cache_key() == key)
    }
}

/// Shared in-memory database.
#[derive(Debug, Clone, Default)]
pub struct FakeDatabase {
    state: Arc<Mutex<State>>,
}

impl FakeDatabase {
    /// Create an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object to the catalog. Object ids follow insertion order.
    pub fn add_object(&self, object: FakeObject) {
        let mut state = self.state.lock();
        state.next_object_id += 1;
        let id = state.next_object_id;
        state.objects.push((id, object));
    }

    /// Change an object's DDL time, as an out-of-band edit would.
    pub fn set_last_ddl_time(&self, identity: &ObjectIdentity, time: &str) {
        let mut state = self.state.lock();
        if let Some(obj) = state.object_mut(identity) {
            obj.last_ddl_time = DdlTime::from_canonical(time).ok();
        }
    }

    /// Change an object's definition.
    pub fn set_ddl(&self, identity: &ObjectIdentity, ddl: Option<&str>) {
        let mut state = self.state.lock();
        if let Some(obj) = state.object_mut(identity) {
            obj.ddl = ddl.map(str::to_string);
        }
    }

    /// Set the error catalog rows of an object.
    pub fn set_errors(&self, identity: &ObjectIdentity, errors: Vec<CatalogError>) {
        let mut state = self.state.lock();
        if let Some(obj) = state.object_mut(identity) {
            obj.status = if errors.iter().any(|e| e.attribute == "ERROR") {
                "INVALID".to_string()
            } else {
                "VALID".to_string()
            };
            obj.errors = errors;
        }
    }

    /// DDL time an object takes when any source is executed.
    pub fn touch_on_execute(&self, identity: &ObjectIdentity, time: &str) {
        if let Ok(time) = DdlTime::from_canonical(time) {
            self.state.lock().compile_times.insert(identity.cache_key(), time);
        }
    }

    /// Make every `execute` fail with `error`.
    pub fn fail_execute(&self, error: DbError) {
        self.state.lock().execute_fault = Some(error);
    }

    /// Make every DDL generator call fail with `error`.
    pub fn fail_ddl(&self, error: DbError) {
        self.state.lock().ddl_fault = Some(error);
    }

    /// Make every new session fail with `error`.
    pub fn fail_connect(&self, error: DbError) {
        self.state.lock().connect_fault = Some(error);
    }

    /// Clear scripted faults.
    pub fn clear_faults(&self) {
        let mut state = self.state.lock();
        state.execute_fault = None;
        state.ddl_fault = None;
        state.connect_fault = None;
    }

    /// Queue a server output line.
    pub fn push_output(&self, line: &str) {
        self.state.lock().output.push_back(line.to_string());
    }

    /// Make `name` resolvable in `context`.
    pub fn add_resolution(&self, name: &str, context: u8, resolution: NameResolution) {
        self.state
            .lock()
            .resolutions
            .push((name.to_uppercase(), context, resolution));
    }

    /// Make name resolution in `context` fail with `error`.
    pub fn fail_resolve_in(&self, context: u8, error: DbError) {
        self.state.lock().resolve_faults.insert(context, error);
    }

    /// Register the text returned by a generator function.
    pub fn add_generator(&self, function: &str, output: &str) {
        self.state
            .lock()
            .generators
            .insert(function.to_lowercase(), output.to_string());
    }

    /// Current DDL time of an object.
    pub fn last_ddl_time(&self, identity: &ObjectIdentity) -> Option<DdlTime> {
        self.state.lock().object(identity).and_then(|o| o.last_ddl_time)
    }

    /// Sources passed to `execute`, in call order.
    pub fn executed(&self) -> Vec<String> {
        self.state.lock().executed.clone()
    }

    /// Warning scopes enabled, in call order.
    pub fn warning_scopes(&self) -> Vec<String> {
        self.state.lock().warning_scopes.clone()
    }

    /// Name resolution calls as `(name, context)`.
    pub fn resolve_attempts(&self) -> Vec<(String, u8)> {
        self.state.lock().resolve_attempts.clone()
    }

    /// Generator calls as `(function, cache key, selected)`.
    pub fn generator_calls(&self) -> Vec<(String, String, Option<String>)> {
        self.state.lock().generator_calls.clone()
    }

    /// DDL generator calls as `(generator, type code, name, owner)`.
    pub fn ddl_calls(&self) -> Vec<(String, String, String, String)> {
        self.state.lock().ddl_calls.clone()
    }

    /// Users sessions were opened for.
    pub fn connects(&self) -> Vec<String> {
        self.state.lock().connects.clone()
    }

    /// Number of sessions opened.
    pub fn connect_count(&self) -> usize {
        self.state.lock().connects.len()
    }

    /// Number of times server output was enabled.
    pub fn output_enabled_count(&self) -> usize {
        self.state.lock().output_enabled
    }
}

/// [`Connector`] over a [`FakeDatabase`].
#[derive(Debug, Clone)]
pub struct FakeConnector {
    db: FakeDatabase,
}

impl FakeConnector {
    /// Create a connector for `db`.
    pub fn new(db: FakeDatabase) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Connector for FakeConnector {
    type Session = FakeSession;

    async fn connect(&self, config: &ConnectionConfig) -> DbResult<FakeSession> {
        let mut state = self.db.state.lock();
        if let Some(err) = state.connect_fault.clone() {
            return Err(err);
        }
        state.connects.push(config.user.to_uppercase());
        Ok(FakeSession { db: self.db.clone() })
    }
}

/// A session on a [`FakeDatabase`].
#[derive(Debug)]
pub struct FakeSession {
    db: FakeDatabase,
}

#[async_trait]
impl DbSession for FakeSession {
    async fn objects_info(&mut self, filter: &ObjectFilter) -> DbResult<Vec<ObjectInfo>> {
        let state = self.db.state.lock();
        let mut rows: Vec<ObjectInfo> = state
            .objects
            .iter()
            .filter(|(_, obj)| {
                filter.matches(obj.identity.owner_str(), obj.identity.type_name(), &obj.identity.object_name)
            })
            .map(|(id, obj)| ObjectInfo {
                owner: obj.identity.owner_str().to_string(),
                object_id: *id,
                object_name: obj.identity.object_name.clone(),
                object_type: obj.identity.type_name().to_string(),
                last_ddl_time: obj.last_ddl_time,
                status: obj.status.clone(),
            })
            .collect();
        rows.sort_by_key(|row| row.object_id);
        Ok(rows)
    }

    async fn object_ddl(&mut self, generator: &str, identity: &ObjectIdentity) -> DbResult<Option<String>> {
        let mut state = self.db.state.lock();
        state.ddl_calls.push((
            generator.to_string(),
            identity.type_code().to_string(),
            identity.object_name.clone(),
            identity.owner_str().to_string(),
        ));
        if let Some(err) = state.ddl_fault.clone() {
            return Err(err);
        }
        match state.object(identity) {
            Some(obj) => Ok(obj.ddl.clone()),
            None => Err(DbError::new(format!(
                "ORA-31603: object \"{}\" of type {} not found in schema \"{}\"",
                identity.object_name,
                identity.type_name(),
                identity.owner_str()
            ))
            .with_code(31603)),
        }
    }

    async fn call_generator(
        &mut self,
        function: &str,
        identity: &ObjectIdentity,
        selected: Option<&str>,
    ) -> DbResult<Option<String>> {
        let mut state = self.db.state.lock();
        state.generator_calls.push((
            function.to_string(),
            identity.cache_key(),
            selected.map(str::to_string),
        ));
        match state.generators.get(&function.to_lowercase()) {
            Some(output) => Ok(Some(output.clone())),
            None => Err(DbError::new(format!("ORA-00904: \"{}\": invalid identifier", function.to_uppercase()))
                .with_code(904)),
        }
    }

    async fn set_warning_scope(&mut self, scope: &str) -> DbResult<()> {
        self.db.state.lock().warning_scopes.push(scope.to_string());
        Ok(())
    }

    async fn enable_output(&mut self) -> DbResult<()> {
        self.db.state.lock().output_enabled += 1;
        Ok(())
    }

    async fn execute(&mut self, code: &str) -> DbResult<ExecuteOutcome> {
        let mut state = self.db.state.lock();
        state.executed.push(code.to_string());
        if let Some(err) = state.execute_fault.clone() {
            return Err(err);
        }

        let compile_times: Vec<(String, DdlTime)> =
            state.compile_times.iter().map(|(k, v)| (k.clone(), *v)).collect();
        for (_, obj) in state.objects.iter_mut() {
            if let Some((_, time)) = compile_times.iter().find(|(k, _)| *k == obj.identity.cache_key()) {
                obj.last_ddl_time = Some(*time);
            }
        }

        Ok(ExecuteOutcome::default())
    }

    async fn catalog_errors(&mut self, identity: &ObjectIdentity) -> DbResult<Vec<CatalogError>> {
        let state = self.db.state.lock();
        Ok(state.object(identity).map(|o| o.errors.clone()).unwrap_or_default())
    }

    async fn output_line(&mut self) -> DbResult<OutputLine> {
        let mut state = self.db.state.lock();
        Ok(match state.output.pop_front() {
            Some(line) => OutputLine::line(line),
            None => OutputLine::end(),
        })
    }

    async fn name_resolve(&mut self, name: &str, context: u8) -> DbResult<NameResolution> {
        let mut state = self.db.state.lock();
        state.resolve_attempts.push((name.to_string(), context));

        if let Some(err) = state.resolve_faults.get(&context) {
            return Err(err.clone());
        }

        let wanted = name.to_uppercase();
        state
            .resolutions
            .iter()
            .find(|(n, c, _)| *n == wanted && *c == context)
            .map(|(_, _, res)| res.clone())
            .ok_or_else(|| {
                DbError::new("ORA-04047: object specified is incompatible with the flag specified")
                    .with_code(NAME_NOT_RESOLVABLE_IN_CONTEXT)
            })
    }
}
