//! # plsync-engine
//!
//! Export, compile and name resolution against a live database.
//!
//! This crate provides:
//! - Session pooling per (environment, user) using `bb8`
//! - Remote change detection backed by the DDL time cache
//! - The export path with lenient re-export
//! - The compile path with the stale-object guard and structured diagnostics
//! - Name resolution across the database's resolution contexts
//! - [`SyncEngine`], the facade tying these together
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::path::Path;
//! use plsync_core::DbConfig;
//! use plsync_engine::{EngineSettings, SyncEngine};
//!
//! let config = DbConfig::load("dbconfig.json")?;
//! let engine = SyncEngine::open(config, connector, EngineSettings::default()).await?;
//!
//! let file = Path::new("src/HR/PACKAGE_BODIES/emp_api.pkb");
//! let outcome = engine
//!     .compile_file(&code, file, "DEV", &engine.compile_options())
//!     .await?;
//!
//! if outcome.diagnostics.has_dirt() {
//!     // Re-export, merge and compile again.
//! }
//! println!("{}", outcome.diagnostics);
//! ```

#![deny(missing_docs)]

pub mod compiler;
pub mod connection;
pub mod engine;
pub mod error;
pub mod pool;
pub mod resolver;
pub mod settings;
pub mod sync;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use compiler::{CompileOptions, CompileReport, Compiler};
pub use connection::{Lease, SessionManager};
pub use engine::{
    CompileOutcome, ExportOutcome, GeneratorOutcome, GeneratorRequest, ResolvedObject, SyncEngine,
};
pub use error::{EngineError, EngineResult};
pub use pool::{ConnectionPoolManager, PoolConfig, PoolKey, PoolStatus};
pub use resolver::{NameResolver, ContextOutcome, ResolvedName};
pub use settings::{EngineSettings, PoolSettings};
pub use sync::{ExportReport, Exporter};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::compiler::CompileOptions;
    pub use crate::engine::{CompileOutcome, ExportOutcome, ResolvedObject, SyncEngine};
    pub use crate::error::{EngineError, EngineResult};
    pub use crate::settings::EngineSettings;
}
