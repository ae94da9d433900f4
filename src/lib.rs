//! # plsync
//!
//! Keeps local PL/SQL sources in sync with a live database and compiles them
//! with structured diagnostics.
//!
//! plsync provides:
//! - Mapping of source files to database objects by path convention
//! - Connection selection per environment and user, with pooled sessions
//! - Detection of remote edits made outside plsync before overwriting them
//! - Compilation with diagnostics from the error catalog and from faults
//! - Resolution of unqualified names to their owner and object
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use plsync::prelude::*;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), plsync::EngineError> {
//!     plsync::logging::init();
//!
//!     let config = DbConfig::load("dbconfig.json")?;
//!     let engine = SyncEngine::open(config, MyOracleConnector::new(), EngineSettings::default()).await?;
//!
//!     let file = Path::new("src/HR/PACKAGE_BODIES/emp_api.pkb");
//!     let code = std::fs::read_to_string(file).unwrap();
//!     let outcome = engine.compile_file(&code, file, "DEV", &engine.compile_options()).await?;
//!
//!     for diagnostic in &outcome.diagnostics {
//!         println!("{}", diagnostic);
//!     }
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Domain types: configuration, identities, diagnostics and the session boundary.
pub mod domain {
    pub use plsync_core::*;
}

/// The persisted DDL time cache.
pub mod cache {
    pub use plsync_cache::*;
}

/// Pools, export, compile and name resolution.
pub mod engine {
    pub use plsync_engine::*;
}

pub use plsync_core::logging;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use plsync_cache::{DdlTimeStore, SqliteDdlCache};
    pub use plsync_core::prelude::*;
    pub use plsync_engine::prelude::*;
}

// Re-export key types at the crate root
pub use plsync_cache::{CacheError, DdlTimeStore, SqliteDdlCache};
pub use plsync_core::{
    ConfigError, ConnectionConfig, DbConfig, DbError, Diagnostic, DiagnosticList, ObjectIdentity,
    ObjectType,
};
pub use plsync_engine::{
    CompileOptions, CompileOutcome, EngineError, EngineResult, EngineSettings, ExportOutcome,
    ResolvedObject, SyncEngine,
};
