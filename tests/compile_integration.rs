//! Integration tests for the compile path.
//!
//! These tests verify the stale-object guard, forced compiles, diagnostics
//! from the catalog and from faults, and selection compiles.

use std::path::Path;
use std::sync::Arc;

use plsync::domain::{Attribute, CatalogError, DdlTime, DiagnosticKind};
use plsync::{
    CompileOptions, DbConfig, DbError, DdlTimeStore, EngineSettings, ObjectIdentity, ObjectType,
    SqliteDdlCache, SyncEngine,
};
use plsync_engine::testing::{FakeConnector, FakeDatabase, FakeObject};
use pretty_assertions::assert_eq;

const DBCONFIG: &str = r#"{
    "DEV": {
        "connectString": "localhost:1521/DEVPDB",
        "users": [
            { "user": "hr", "password": "hr", "default": true },
            { "user": "scott", "password": "tiger" }
        ]
    }
}"#;

const FILE: &str = "src/hr/PACKAGE_BODIES/emp_api.pkb";

const SOURCE: &str = "create or replace package body emp_api is\n\
                      procedure hire(p_name varchar2) is\n\
                      begin\n\
                      insert into employees(name) values (p_name);\n\
                      end hire;\n\
                      end emp_api;\n\
                      /\n";

fn emp_api() -> ObjectIdentity {
    ObjectIdentity::new("HR", "EMP_API", ObjectType::PackageBody)
}

struct Fixture {
    db: FakeDatabase,
    cache: Arc<SqliteDdlCache>,
    engine: SyncEngine<FakeConnector>,
}

async fn fixture() -> Fixture {
    let db = FakeDatabase::new();
    db.add_object(FakeObject::new(emp_api(), SOURCE, "2023-01-01 10:00:00"));
    let cache = Arc::new(SqliteDdlCache::open_in_memory().await.unwrap());
    let engine = SyncEngine::new(
        DbConfig::from_json_str(DBCONFIG).unwrap(),
        FakeConnector::new(db.clone()),
        cache.clone(),
        EngineSettings::default(),
    );
    Fixture { db, cache, engine }
}

async fn cache_at(cache: &SqliteDdlCache, time: &str) {
    cache
        .put(&emp_api(), Some(DdlTime::from_canonical(time).unwrap()))
        .await
        .unwrap();
}

/// Test that a remote change blocks the compile without executing anything
#[tokio::test]
async fn test_stale_object_blocks_compile() {
    let fx = fixture().await;
    cache_at(&fx.cache, "2022-12-01 00:00:00").await;

    let outcome = fx
        .engine
        .compile_file(SOURCE, Path::new(FILE), "DEV", &CompileOptions::new())
        .await
        .unwrap();

    assert_eq!(outcome.diagnostics.len(), 1);
    let diag = outcome.diagnostics.iter().next().unwrap();
    assert_eq!(diag.kind, DiagnosticKind::ObjectChanged);
    assert_eq!(diag.attribute, Attribute::Error);
    assert_eq!(
        outcome.diagnostics.to_string(),
        "1/1 ERROR Db Object has changed. Resolve any merge failure and compile again."
    );
    assert!(fx.db.executed().is_empty());
    assert_eq!(outcome.env, "DEV");
    assert_eq!(outcome.file, Path::new(FILE));
}

/// Test that a forced compile executes and leaves the cache alone
#[tokio::test]
async fn test_forced_compile_never_updates_cache() {
    let fx = fixture().await;
    cache_at(&fx.cache, "2022-12-01 00:00:00").await;
    fx.db.touch_on_execute(&emp_api(), "2023-06-01 12:00:00");

    let outcome = fx
        .engine
        .compile_file(SOURCE, Path::new(FILE), "DEV", &CompileOptions::new().force(true))
        .await
        .unwrap();

    assert!(!outcome.diagnostics.has_dirt());
    assert_eq!(fx.db.executed().len(), 1);
    assert_eq!(
        fx.cache.get(&emp_api()).await.unwrap().as_deref(),
        Some("2022-12-01 00:00:00")
    );
}

/// Test that a forced compile of a never-synced object leaves no record
#[tokio::test]
async fn test_forced_compile_without_record() {
    let fx = fixture().await;

    fx.engine
        .compile_file(SOURCE, Path::new(FILE), "DEV", &CompileOptions::new().force(true))
        .await
        .unwrap();

    assert!(fx.cache.is_empty().await.unwrap());
}

/// Test that a guarded compile records the post-compile DDL time
#[tokio::test]
async fn test_compile_syncs_cache() {
    let fx = fixture().await;
    cache_at(&fx.cache, "2023-01-01 10:00:00").await;
    fx.db.touch_on_execute(&emp_api(), "2023-06-01 12:00:00");

    let outcome = fx
        .engine
        .compile_file(SOURCE, Path::new(FILE), "DEV", &CompileOptions::new())
        .await
        .unwrap();

    assert!(outcome.diagnostics.is_empty());
    assert!(outcome.execution.is_some());
    assert_eq!(
        fx.cache.get(&emp_api()).await.unwrap().as_deref(),
        Some("2023-06-01 12:00:00")
    );
    assert_eq!(
        fx.db.executed(),
        vec![SOURCE.trim().trim_end_matches('/').trim().to_string()]
    );
}

/// Test that two compiles of unchanged code produce identical diagnostics
#[tokio::test]
async fn test_repeated_compiles_are_idempotent() {
    let fx = fixture().await;
    fx.db.touch_on_execute(&emp_api(), "2023-06-01 12:00:00");
    fx.db.set_errors(
        &emp_api(),
        vec![CatalogError {
            line: 4,
            position: 1,
            attribute: "WARNING".into(),
            text: "PLW-06009: procedure \"HIRE\" OTHERS handler does not end in RAISE".into(),
        }],
    );

    let options = CompileOptions::new().warning_scope("ALL");
    let first = fx
        .engine
        .compile_file(SOURCE, Path::new(FILE), "DEV", &options)
        .await
        .unwrap();
    let second = fx
        .engine
        .compile_file(SOURCE, Path::new(FILE), "DEV", &options)
        .await
        .unwrap();

    assert!(first.diagnostics.has_warnings());
    assert!(!first.diagnostics.has_errors());
    assert_eq!(first.diagnostics, second.diagnostics);
    assert_eq!(fx.db.executed().len(), 2);
    assert_eq!(fx.db.warning_scopes(), vec!["ALL", "ALL"]);
}

/// Test that configured warning scope NONE enables nothing
#[tokio::test]
async fn test_default_options_use_settings_scope() {
    let fx = fixture().await;
    let options = fx.engine.compile_options();
    assert_eq!(options.warning_scope, None);

    fx.engine
        .compile_file(SOURCE, Path::new(FILE), "DEV", &options)
        .await
        .unwrap();
    assert!(fx.db.warning_scopes().is_empty());
    assert_eq!(fx.db.output_enabled_count(), 1);
}

/// Test that a submission fault is located by its offset
#[tokio::test]
async fn test_fault_offset_becomes_location() {
    let fx = fixture().await;
    fx.db.fail_execute(
        DbError::new("ORA-24344: success with compilation error")
            .with_code(24344)
            .with_offset(52),
    );

    let outcome = fx
        .engine
        .compile_file(SOURCE, Path::new(FILE), "DEV", &CompileOptions::new())
        .await
        .unwrap();

    assert_eq!(outcome.diagnostics.len(), 1);
    let diag = &outcome.diagnostics.as_slice()[0];
    assert_eq!(diag.kind, DiagnosticKind::System);
    assert_eq!((diag.line, diag.position), (2, 11));
    assert_eq!(diag.text, "ORA-24344: success with compilation error");
}

/// Test that embedded line/column segments win over the offset
#[tokio::test]
async fn test_fault_with_embedded_locations() {
    let fx = fixture().await;
    fx.db.fail_execute(DbError::new(
        "ORA-06550: line 5, column 12:\nPLS-00201: identifier 'P_NAM' must be declared\n\
         ORA-06550: line 5, column 1:\nPL/SQL: Statement ignored",
    ));

    let outcome = fx
        .engine
        .compile_file(SOURCE, Path::new(FILE), "DEV", &CompileOptions::new())
        .await
        .unwrap();

    let located: Vec<(u32, u32, &str)> = outcome
        .diagnostics
        .iter()
        .map(|d| (d.line, d.position, d.text.as_str()))
        .collect();
    assert_eq!(
        located,
        vec![
            (5, 12, "PLS-00201: identifier 'P_NAM' must be declared"),
            (5, 1, "PL/SQL: Statement ignored"),
        ]
    );
}

/// Test that a selection compile reports file-absolute lines and output
#[tokio::test]
async fn test_compile_selection() {
    let fx = fixture().await;
    fx.db.push_output("hired 1 employee");

    let ok = fx
        .engine
        .compile_selection("begin emp_api.hire('KING'); end;", Path::new(FILE), "DEV", 40)
        .await
        .unwrap();
    assert!(ok.diagnostics.is_empty());
    assert_eq!(ok.output_lines, vec!["hired 1 employee"]);

    fx.db.fail_execute(DbError::new(
        "ORA-06550: line 3, column 7:\nPLS-00302: component 'HIR' must be declared",
    ));
    let failed = fx
        .engine
        .compile_selection("begin\n  null;\n  emp_api.hir('KING');\nend;", Path::new(FILE), "DEV", 40)
        .await
        .unwrap();
    let diag = &failed.diagnostics.as_slice()[0];
    assert_eq!((diag.line, diag.position), (42, 7));
    assert!(fx.cache.is_empty().await.unwrap());
}

/// Test that the owner directory picks the matching user
#[tokio::test]
async fn test_owner_directory_selects_session_user() {
    let fx = fixture().await;

    let outcome = fx
        .engine
        .compile_file(
            "begin null; end;",
            Path::new("src/scott/PROCEDURES/noop.prc"),
            "DEV",
            &CompileOptions::new(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.identity.owner.as_deref(), Some("SCOTT"));
    assert_eq!(fx.db.connects(), vec!["SCOTT"]);
}

/// Test the JSON shape front ends read
#[tokio::test]
async fn test_outcome_serializes_for_front_ends() {
    let fx = fixture().await;
    cache_at(&fx.cache, "2022-12-01 00:00:00").await;

    let outcome = fx
        .engine
        .compile_file(SOURCE, Path::new(FILE), "DEV", &CompileOptions::new())
        .await
        .unwrap();
    let json = serde_json::to_value(&outcome).unwrap();

    assert_eq!(json["env"], "DEV");
    assert_eq!(json["identity"]["object_type"], "PACKAGE BODY");
    assert_eq!(json["diagnostics"][0]["line"], 1);
    assert_eq!(json["diagnostics"][0]["attribute"], "ERROR");
    assert_eq!(json["execution"], serde_json::Value::Null);
}

/// Test that a warning scope that is not a plain category is refused unsent
#[tokio::test]
async fn test_injected_warning_scope_is_refused() {
    let fx = fixture().await;

    let options = CompileOptions::new().warning_scope("ALL'); drop");
    let outcome = fx
        .engine
        .compile_file(SOURCE, Path::new(FILE), "DEV", &options)
        .await
        .unwrap();

    assert_eq!(outcome.diagnostics.len(), 1);
    let diag = &outcome.diagnostics.as_slice()[0];
    assert_eq!(diag.kind, DiagnosticKind::System);
    assert_eq!(diag.text, "invalid warning scope: ALL'); drop");
    assert!(fx.db.warning_scopes().is_empty());
    assert_eq!(fx.db.output_enabled_count(), 0);
    assert!(fx.db.executed().is_empty());
}
