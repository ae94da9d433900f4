//! Integration tests for export and remote change detection.
//!
//! These tests run the engine against the in-memory database and a real
//! SQLite cache file.

use std::path::Path;
use std::sync::Arc;

use plsync::cache::SqliteDdlCache;
use plsync::domain::DdlTime;
use plsync::engine::sync::has_remote_changed_since;
use plsync::{DbConfig, DdlTimeStore, EngineSettings, ObjectIdentity, ObjectType, SyncEngine};
use plsync_engine::testing::{FakeConnector, FakeDatabase, FakeObject};
use pretty_assertions::assert_eq;

const DBCONFIG: &str = r#"{
    "DEV": {
        "connectString": "localhost:1521/DEVPDB",
        "users": [ { "user": "hr", "password": "hr" } ]
    }
}"#;

const TRIGGER_DDL: &str = "\n  CREATE OR REPLACE EDITIONABLE TRIGGER \"HR\".\"EMP_AUDIT\"\n\
                           BEFORE UPDATE ON employees FOR EACH ROW\n\
                           BEGIN\n  :new.updated_at := sysdate;\nEND;\n\
                           /\n\
                           ALTER TRIGGER \"HR\".\"EMP_AUDIT\" ENABLE;\n";

fn emp_audit() -> ObjectIdentity {
    ObjectIdentity::new("HR", "EMP_AUDIT", ObjectType::Trigger)
}

async fn engine(db: &FakeDatabase, cache: Arc<SqliteDdlCache>) -> SyncEngine<FakeConnector> {
    SyncEngine::new(
        DbConfig::from_json_str(DBCONFIG).unwrap(),
        FakeConnector::new(db.clone()),
        cache,
        EngineSettings::default(),
    )
}

fn database() -> FakeDatabase {
    let db = FakeDatabase::new();
    db.add_object(FakeObject::new(emp_audit(), TRIGGER_DDL, "2023-01-01 10:00:00"));
    db
}

/// Test that exported trigger definitions are normalized
#[tokio::test]
async fn test_export_normalizes_definition() {
    let db = database();
    let engine = engine(&db, Arc::new(SqliteDdlCache::open_in_memory().await.unwrap())).await;

    let outcome = engine
        .export_file("-- local", Path::new("src/TRIGGERS/emp_audit.trg"), "DEV", false)
        .await
        .unwrap();

    assert!(outcome.exported);
    assert_eq!(outcome.identity, emp_audit());
    assert!(outcome.code.starts_with("CREATE OR REPLACE EDITIONABLE TRIGGER"));
    assert_eq!(
        db.ddl_calls(),
        vec![(
            "dbms_metadata.get_ddl".to_string(),
            "TRIGGER".to_string(),
            "EMP_AUDIT".to_string(),
            "HR".to_string()
        )]
    );
    assert!(outcome.code.ends_with("END;\n/"));
    assert!(!outcome.code.contains("ALTER TRIGGER"));
}

/// Test that a lenient re-export with no remote change keeps local code
#[tokio::test]
async fn test_lenient_reexport_is_not_exported() {
    let db = database();
    let engine = engine(&db, Arc::new(SqliteDdlCache::open_in_memory().await.unwrap())).await;
    let file = Path::new("src/TRIGGERS/emp_audit.trg");

    let first = engine.export_file("-- local", file, "DEV", false).await.unwrap();
    assert!(first.exported);

    let second = engine.export_file(&first.code, file, "DEV", true).await.unwrap();
    assert!(!second.exported);
    assert_eq!(second.code, first.code);
}

/// Test that a lenient export picks up an out-of-band edit
#[tokio::test]
async fn test_lenient_export_after_remote_edit() {
    let db = database();
    let cache = Arc::new(SqliteDdlCache::open_in_memory().await.unwrap());
    let engine = engine(&db, cache.clone()).await;
    let file = Path::new("src/TRIGGERS/emp_audit.trg");

    engine.export_file("-- local", file, "DEV", false).await.unwrap();
    db.set_last_ddl_time(&emp_audit(), "2023-01-02 09:00:00");

    let outcome = engine.export_file("-- local", file, "DEV", true).await.unwrap();
    assert!(outcome.exported);
    assert_eq!(cache.get(&emp_audit()).await.unwrap().as_deref(), Some("2023-01-02 09:00:00"));
}

/// Test that a lenient export of a never-synced object keeps local code
#[tokio::test]
async fn test_lenient_export_without_cache_entry() {
    let db = database();
    let engine = engine(&db, Arc::new(SqliteDdlCache::open_in_memory().await.unwrap())).await;

    let outcome = engine
        .export_file("-- local", Path::new("src/TRIGGERS/emp_audit.trg"), "DEV", true)
        .await
        .unwrap();
    assert!(!outcome.exported);
    assert_eq!(outcome.code, "-- local");
}

/// Test the change detection examples on canonical timestamps
#[tokio::test]
async fn test_has_remote_changed_examples() {
    let cases = [
        ("2023-01-01 10:00:00", "2023-01-01 10:00:00", false),
        ("2023-01-01 10:00:00", "2023-01-02 09:00:00", true),
    ];

    for (cached, remote, expected) in cases {
        let db = database();
        db.set_last_ddl_time(&emp_audit(), remote);
        let cache = SqliteDdlCache::open_in_memory().await.unwrap();
        cache
            .put(&emp_audit(), Some(DdlTime::from_canonical(cached).unwrap()))
            .await
            .unwrap();

        let engine = engine(&db, Arc::new(SqliteDdlCache::open_in_memory().await.unwrap())).await;
        let conn = engine.config().resolve("DEV", None).unwrap();
        let mut lease = engine.pools().lease(&conn).await.unwrap();

        let changed = has_remote_changed_since(&mut *lease, &cache, &emp_audit()).await.unwrap();
        assert_eq!(changed, expected, "cached {cached} vs remote {remote}");
    }
}

/// Test that the cache survives an engine restart
#[tokio::test]
async fn test_cache_file_persists_between_engines() {
    let dir = tempfile::tempdir().unwrap();
    let settings = EngineSettings {
        cache_path: dir.path().join(".plsync").join("ddl_times.db"),
        ..Default::default()
    };
    let db = database();
    let file = Path::new("src/TRIGGERS/emp_audit.trg");

    {
        let engine = SyncEngine::open(
            DbConfig::from_json_str(DBCONFIG).unwrap(),
            FakeConnector::new(db.clone()),
            settings.clone(),
        )
        .await
        .unwrap();
        assert!(engine.export_file("", file, "DEV", false).await.unwrap().exported);
    }

    let engine = SyncEngine::open(
        DbConfig::from_json_str(DBCONFIG).unwrap(),
        FakeConnector::new(db.clone()),
        settings,
    )
    .await
    .unwrap();
    let outcome = engine.export_file("kept", file, "DEV", true).await.unwrap();
    assert!(!outcome.exported);
    assert_eq!(outcome.code, "kept");
}

/// Test that a generator fault never fails the export or leaks a session
#[tokio::test]
async fn test_export_fault_is_not_fatal() {
    let db = database();
    db.fail_ddl(plsync::DbError::new("ORA-31603: object \"EMP_AUDIT\" of type TRIGGER not found"));
    let engine = engine(&db, Arc::new(SqliteDdlCache::open_in_memory().await.unwrap())).await;

    for _ in 0..2 {
        let outcome = engine
            .export_file("-- local", Path::new("src/TRIGGERS/emp_audit.trg"), "DEV", false)
            .await
            .unwrap();
        assert!(!outcome.exported);
        assert_eq!(outcome.code, "-- local");
    }

    let status = engine.pools().status().await;
    assert_eq!(status[0].connections, status[0].idle_connections);
    assert_eq!(db.connect_count(), 1);
}
