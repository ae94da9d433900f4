//! The database session boundary.
//!
//! The engine never talks to a driver directly. It issues the calls of
//! [`DbSession`] on sessions opened by a [`Connector`]. A driver binding
//! implements both traits. Values travel as bind variables; the names the
//! engine interpolates are checked by [`crate::identifiers`] first.

use async_trait::async_trait;
use serde::Serialize;

use crate::config::ConnectionConfig;
use crate::error::DbResult;
use crate::identity::{ObjectIdentity, ObjectType};
use crate::time::DdlTime;

/// Catalog filter on owner, type and name. `None` matches anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectFilter {
    /// Owner, matched case-insensitively.
    pub owner: String,
    /// Catalog object type, e.g. `PACKAGE BODY`.
    pub object_type: Option<String>,
    /// Object name.
    pub object_name: Option<String>,
}

impl ObjectFilter {
    /// Filter every object of an owner.
    pub fn owner(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            ..Default::default()
        }
    }

    /// Filter matching exactly one identity.
    pub fn for_identity(identity: &ObjectIdentity) -> Self {
        Self {
            owner: identity.owner_str().to_string(),
            object_type: identity.object_type.map(|t| t.catalog_name().to_string()),
            object_name: Some(identity.object_name.clone()),
        }
    }

    /// Restrict to an object type.
    pub fn with_type(mut self, object_type: ObjectType) -> Self {
        self.object_type = Some(object_type.catalog_name().to_string());
        self
    }

    /// Restrict to an object name.
    pub fn with_name(mut self, object_name: impl Into<String>) -> Self {
        self.object_name = Some(object_name.into());
        self
    }

    /// Check if a catalog row passes the filter.
    pub fn matches(&self, owner: &str, object_type: &str, object_name: &str) -> bool {
        self.owner.eq_ignore_ascii_case(owner)
            && self
                .object_type
                .as_deref()
                .is_none_or(|t| t.eq_ignore_ascii_case(object_type))
            && self
                .object_name
                .as_deref()
                .is_none_or(|n| n.eq_ignore_ascii_case(object_name))
    }
}

/// One row of the object catalog (`all_objects`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectInfo {
    /// Owning schema.
    pub owner: String,
    /// Catalog object id.
    pub object_id: i64,
    /// Object name.
    pub object_name: String,
    /// Catalog object type.
    pub object_type: String,
    /// Last DDL time, absent for objects never compiled.
    pub last_ddl_time: Option<DdlTime>,
    /// `VALID` or `INVALID`.
    pub status: String,
}

impl ObjectInfo {
    /// The identity described by this row.
    pub fn identity(&self) -> ObjectIdentity {
        ObjectIdentity {
            owner: Some(self.owner.to_uppercase()),
            object_name: self.object_name.to_uppercase(),
            object_type: ObjectType::from_catalog_name(&self.object_type),
        }
    }

    /// Check if the object compiled cleanly.
    pub fn is_valid(&self) -> bool {
        self.status.eq_ignore_ascii_case("VALID")
    }
}

/// One row of the error catalog (`all_errors`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogError {
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub position: u32,
    /// `ERROR`, `WARNING` or `INFO`.
    pub attribute: String,
    /// Message text.
    pub text: String,
}

/// Result of executing submitted source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecuteOutcome {
    /// Rows affected, for DML.
    pub rows_affected: Option<u64>,
    /// Success-with-info text, e.g. "created with compilation errors".
    pub warning: Option<String>,
}

/// One read from the server output buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    /// The line, absent at end of data.
    pub line: Option<String>,
    /// `0` while lines remain.
    pub status: i32,
}

impl OutputLine {
    /// A line read successfully.
    pub fn line(text: impl Into<String>) -> Self {
        Self {
            line: Some(text.into()),
            status: 0,
        }
    }

    /// The end-of-data marker.
    pub fn end() -> Self {
        Self { line: None, status: 1 }
    }
}

/// Out binds of a name resolution call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NameResolution {
    /// Resolved schema.
    pub schema: Option<String>,
    /// First name part (object or package).
    pub part1: Option<String>,
    /// Second name part (subprogram).
    pub part2: Option<String>,
    /// Database link, if any.
    pub dblink: Option<String>,
    /// Numeric type of `part1`.
    pub part1_type: Option<String>,
    /// Catalog object number.
    pub object_number: Option<i64>,
}

impl NameResolution {
    /// The resolved object name: `part1`, else `part2`.
    pub fn object_name(&self) -> Option<&str> {
        [self.part1.as_deref(), self.part2.as_deref()]
            .into_iter()
            .flatten()
            .find(|part| !part.is_empty())
    }

    /// Check if the call resolved to anything.
    pub fn is_resolved(&self) -> bool {
        self.object_name().is_some()
    }
}

/// A live database session.
#[async_trait]
pub trait DbSession: Send {
    /// Catalog rows matching `filter`, ordered by object id.
    async fn objects_info(&mut self, filter: &ObjectFilter) -> DbResult<Vec<ObjectInfo>>;

    /// Full definition text from the DDL generator function.
    async fn object_ddl(&mut self, generator: &str, identity: &ObjectIdentity) -> DbResult<Option<String>>;

    /// Call a generator function with an optional selected sub-object.
    async fn call_generator(
        &mut self,
        function: &str,
        identity: &ObjectIdentity,
        selected: Option<&str>,
    ) -> DbResult<Option<String>>;

    /// Enable a compiler warning scope for the session.
    async fn set_warning_scope(&mut self, scope: &str) -> DbResult<()>;

    /// Enable the server output buffer.
    async fn enable_output(&mut self) -> DbResult<()>;

    /// Execute source text.
    async fn execute(&mut self, code: &str) -> DbResult<ExecuteOutcome>;

    /// Error catalog rows for an identity, most recent first.
    async fn catalog_errors(&mut self, identity: &ObjectIdentity) -> DbResult<Vec<CatalogError>>;

    /// Read one line from the server output buffer.
    async fn output_line(&mut self) -> DbResult<OutputLine>;

    /// Resolve a name within one resolution context.
    async fn name_resolve(&mut self, name: &str, context: u8) -> DbResult<NameResolution>;

    /// Check that the session is still usable.
    async fn ping(&mut self) -> DbResult<()> {
        Ok(())
    }
}

/// Opens sessions for a connection configuration.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Session type produced by this connector.
    type Session: DbSession + 'static;

    /// Open a new session.
    async fn connect(&self, config: &ConnectionConfig) -> DbResult<Self::Session>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_for_identity() {
        let id = ObjectIdentity::new("hr", "emp_api", ObjectType::PackageBody);
        let filter = ObjectFilter::for_identity(&id);
        assert_eq!(filter.owner, "HR");
        assert_eq!(filter.object_type.as_deref(), Some("PACKAGE BODY"));
        assert!(filter.matches("hr", "package body", "EMP_API"));
        assert!(!filter.matches("HR", "PACKAGE", "EMP_API"));
    }

    #[test]
    fn test_filter_wildcards() {
        let filter = ObjectFilter::owner("HR");
        assert!(filter.matches("HR", "VIEW", "ANYTHING"));
        assert!(!filter.matches("SCOTT", "VIEW", "ANYTHING"));
        assert!(ObjectFilter::owner("HR").with_name("X").matches("HR", "TABLE", "x"));
    }

    #[test]
    fn test_name_resolution_object_name() {
        let mut res = NameResolution {
            part1: Some(String::new()),
            part2: Some("RAISE_SALARY".into()),
            ..Default::default()
        };
        assert_eq!(res.object_name(), Some("RAISE_SALARY"));
        res.part1 = Some("EMP_API".into());
        assert_eq!(res.object_name(), Some("EMP_API"));
        assert!(!NameResolution::default().is_resolved());
    }

    #[test]
    fn test_object_info_identity() {
        let info = ObjectInfo {
            owner: "HR".into(),
            object_id: 42,
            object_name: "EMP_API".into(),
            object_type: "PACKAGE BODY".into(),
            last_ddl_time: None,
            status: "VALID".into(),
        };
        assert_eq!(info.identity(), ObjectIdentity::new("HR", "EMP_API", ObjectType::PackageBody));
        assert!(info.is_valid());
    }
}
