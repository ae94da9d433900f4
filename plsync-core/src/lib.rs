//! # plsync-core
//!
//! Domain types shared by the plsync crates.
//!
//! This crate provides:
//! - Connection configuration sets and user resolution ([`DbConfig`])
//! - Artifact path to object identity mapping ([`ObjectIdentity`])
//! - Structured diagnostics and the system fault parser
//! - Source normalization for export and compile
//! - The [`DbSession`] / [`Connector`] database boundary
//!
//! ## Example
//!
//! ```rust
//! use plsync_core::{DbConfig, ObjectIdentity, ObjectType};
//!
//! let config = DbConfig::from_json_str(r#"{
//!     "DEV": { "connectString": "localhost/DEV", "users": [ { "user": "hr", "password": "pw" } ] }
//! }"#).unwrap();
//!
//! let conn = config.resolve("DEV", None).unwrap();
//! let id = ObjectIdentity::from_path("PACKAGE_BODIES/emp_api.pkb");
//! let id = id.with_owner(&conn.effective_owner());
//!
//! assert_eq!(id.object_type, Some(ObjectType::PackageBody));
//! assert_eq!(id.cache_key(), "HR.PACKAGE BODY.EMP_API");
//! ```

#![deny(missing_docs)]

pub mod config;
pub mod diagnostic;
pub mod error;
pub mod fault;
pub mod identifiers;
pub mod identity;
pub mod logging;
pub mod session;
pub mod source;
pub mod time;

pub use config::{ConnectionConfig, DbConfig, EnvironmentConfig, UserEntry};
pub use diagnostic::{Attribute, Diagnostic, DiagnosticKind, DiagnosticList};
pub use error::{ConfigError, ConfigResult, DbError, DbResult, NAME_NOT_RESOLVABLE_IN_CONTEXT};
pub use fault::{line_and_position, parse_system_fault};
pub use identity::{ObjectIdentity, ObjectType};
pub use session::{
    CatalogError, Connector, DbSession, ExecuteOutcome, NameResolution, ObjectFilter, ObjectInfo,
    OutputLine,
};
pub use time::DdlTime;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{ConnectionConfig, DbConfig};
    pub use crate::diagnostic::{Attribute, Diagnostic, DiagnosticKind, DiagnosticList};
    pub use crate::error::{ConfigError, DbError};
    pub use crate::identity::{ObjectIdentity, ObjectType};
    pub use crate::session::{Connector, DbSession};
    pub use crate::time::DdlTime;
}
