//! Mapping from local artifact paths to database object identities.
//!
//! Artifacts follow a `<owner>/<TYPE_DIR>/<name>.<suffix>` layout, e.g.
//! `src/HR/PACKAGE_BODIES/emp_api.pkb`. When no type directory is present
//! the type is taken from the file suffix and the owner from the parent
//! directory.

use std::fmt;

use serde::{Serialize, Serializer};

/// Kinds of database program objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    /// Package specification.
    Package,
    /// Package body.
    PackageBody,
    /// Standalone procedure.
    Procedure,
    /// Standalone function.
    Function,
    /// Trigger.
    Trigger,
    /// Object type specification.
    Type,
    /// Object type body.
    TypeBody,
    /// View.
    View,
    /// Synonym.
    Synonym,
    /// Sequence.
    Sequence,
    /// Table.
    Table,
}

impl ObjectType {
    /// Every object type, in catalog order.
    pub const ALL: [ObjectType; 11] = [
        Self::Package,
        Self::PackageBody,
        Self::Procedure,
        Self::Function,
        Self::Trigger,
        Self::Type,
        Self::TypeBody,
        Self::View,
        Self::Synonym,
        Self::Sequence,
        Self::Table,
    ];

    /// Name used by the data dictionary (`all_objects.object_type`).
    pub fn catalog_name(self) -> &'static str {
        match self {
            Self::Package => "PACKAGE",
            Self::PackageBody => "PACKAGE BODY",
            Self::Procedure => "PROCEDURE",
            Self::Function => "FUNCTION",
            Self::Trigger => "TRIGGER",
            Self::Type => "TYPE",
            Self::TypeBody => "TYPE BODY",
            Self::View => "VIEW",
            Self::Synonym => "SYNONYM",
            Self::Sequence => "SEQUENCE",
            Self::Table => "TABLE",
        }
    }

    /// Type code expected by the DDL generator function.
    pub fn type_code(self) -> &'static str {
        match self {
            Self::Package => "PACKAGE_SPEC",
            Self::PackageBody => "PACKAGE_BODY",
            Self::Type => "TYPE_SPEC",
            Self::TypeBody => "TYPE_BODY",
            other => other.catalog_name(),
        }
    }

    /// Directory name holding artifacts of this type.
    pub fn directory(self) -> &'static str {
        match self {
            Self::Package => "PACKAGES",
            Self::PackageBody => "PACKAGE_BODIES",
            Self::Procedure => "PROCEDURES",
            Self::Function => "FUNCTIONS",
            Self::Trigger => "TRIGGERS",
            Self::Type => "TYPES",
            Self::TypeBody => "TYPE_BODIES",
            Self::View => "VIEWS",
            Self::Synonym => "SYNONYMS",
            Self::Sequence => "SEQUENCES",
            Self::Table => "TABLES",
        }
    }

    /// Conventional file suffix, when the type has one.
    pub fn suffix(self) -> Option<&'static str> {
        match self {
            Self::Package => Some("pks"),
            Self::PackageBody => Some("pkb"),
            Self::Procedure => Some("prc"),
            Self::Function => Some("fnc"),
            Self::Trigger => Some("trg"),
            Self::Type => Some("tps"),
            Self::TypeBody => Some("tpb"),
            Self::View => Some("vw"),
            Self::Synonym | Self::Sequence | Self::Table => None,
        }
    }

    /// Look up a type by its directory name (case-insensitive).
    pub fn from_directory(dir: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.directory().eq_ignore_ascii_case(dir))
    }

    /// Look up a type by file suffix (case-insensitive).
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.suffix().is_some_and(|s| s.eq_ignore_ascii_case(suffix)))
    }

    /// Look up a type by its data dictionary name (case-insensitive).
    pub fn from_catalog_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.catalog_name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.catalog_name())
    }
}

impl Serialize for ObjectType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.catalog_name())
    }
}

/// Identity of a database program object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ObjectIdentity {
    /// Owning schema, when known.
    pub owner: Option<String>,
    /// Object name, uppercased.
    pub object_name: String,
    /// Object type, when it could be derived.
    pub object_type: Option<ObjectType>,
}

impl ObjectIdentity {
    /// Create a fully specified identity.
    pub fn new(owner: impl Into<String>, object_name: impl Into<String>, object_type: ObjectType) -> Self {
        Self {
            owner: Some(owner.into().to_uppercase()),
            object_name: object_name.into().to_uppercase(),
            object_type: Some(object_type),
        }
    }

    /// Derive an identity from an artifact path.
    ///
    /// Never fails; a path that does not follow the layout yields an
    /// identity for which [`is_valid`](Self::is_valid) is false.
    pub fn from_path(path: &str) -> Self {
        let segments: Vec<&str> = path.split(['/', '\\']).collect();
        let (dirs, file) = match segments.split_last() {
            Some((file, dirs)) => (dirs, *file),
            None => (&[][..], ""),
        };

        let (stem, suffix) = match file.rsplit_once('.') {
            Some((stem, suffix)) if !stem.is_empty() => (stem, Some(suffix)),
            _ => (file, None),
        };

        let type_dir = dirs
            .iter()
            .enumerate()
            .rev()
            .find_map(|(idx, dir)| ObjectType::from_directory(dir).map(|t| (idx, t)));

        let (owner, object_type) = match type_dir {
            Some((idx, object_type)) => {
                let owner = idx.checked_sub(1).and_then(|i| owner_segment(dirs[i]));
                (owner, Some(object_type))
            }
            None => {
                let owner = dirs.last().and_then(|dir| owner_segment(dir));
                (owner, suffix.and_then(ObjectType::from_suffix))
            }
        };

        Self {
            owner,
            object_name: stem.trim().to_uppercase(),
            object_type,
        }
    }

    /// Return a copy with the owner replaced by `owner`, uppercased.
    pub fn with_owner(&self, owner: &str) -> Self {
        Self {
            owner: Some(owner.to_uppercase()),
            ..self.clone()
        }
    }

    /// An identity is usable only when both name and type are known.
    pub fn is_valid(&self) -> bool {
        !self.object_name.is_empty() && self.object_type.is_some()
    }

    /// Owner as a string slice, empty when unknown.
    pub fn owner_str(&self) -> &str {
        self.owner.as_deref().unwrap_or_default()
    }

    /// Catalog name of the type, empty when unknown.
    pub fn type_name(&self) -> &'static str {
        self.object_type.map(ObjectType::catalog_name).unwrap_or_default()
    }

    /// Type code passed to the DDL generator, empty when unknown.
    pub fn type_code(&self) -> &'static str {
        self.object_type.map(ObjectType::type_code).unwrap_or_default()
    }

    /// Key under which the identity's DDL time is cached: `OWNER.TYPE.NAME`.
    pub fn cache_key(&self) -> String {
        format!("{}.{}.{}", self.owner_str(), self.type_name(), self.object_name)
    }
}

impl fmt::Display for ObjectIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.owner {
            Some(owner) => write!(f, "{}.{}", owner, self.object_name)?,
            None => f.write_str(&self.object_name)?,
        }
        if let Some(object_type) = self.object_type {
            write!(f, " ({})", object_type)?;
        }
        Ok(())
    }
}

fn owner_segment(segment: &str) -> Option<String> {
    let segment = segment.trim();
    match segment {
        "" | "." | ".." => None,
        _ => Some(segment.to_uppercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_type_directory() {
        let id = ObjectIdentity::from_path("src/hr/PACKAGE_BODIES/emp_api.pkb");
        assert_eq!(id.owner.as_deref(), Some("HR"));
        assert_eq!(id.object_name, "EMP_API");
        assert_eq!(id.object_type, Some(ObjectType::PackageBody));
        assert!(id.is_valid());
    }

    #[test]
    fn test_windows_separators() {
        let id = ObjectIdentity::from_path(r"C:\work\SCOTT\PROCEDURES\raise_salary.sql");
        assert_eq!(id.owner.as_deref(), Some("SCOTT"));
        assert_eq!(id.object_type, Some(ObjectType::Procedure));
        assert_eq!(id.object_name, "RAISE_SALARY");
    }

    #[test]
    fn test_from_suffix() {
        let id = ObjectIdentity::from_path("hr/emp_trg.trg");
        assert_eq!(id.owner.as_deref(), Some("HR"));
        assert_eq!(id.object_type, Some(ObjectType::Trigger));
    }

    #[test]
    fn test_relative_type_directory_has_no_owner() {
        let id = ObjectIdentity::from_path("./FUNCTIONS/get_total.sql");
        assert_eq!(id.owner, None);
        assert_eq!(id.object_type, Some(ObjectType::Function));
        assert!(id.is_valid());
    }

    #[test]
    fn test_unknown_layout_is_invalid() {
        let id = ObjectIdentity::from_path("notes/readme.txt");
        assert_eq!(id.object_type, None);
        assert!(!id.is_valid());
        assert!(!ObjectIdentity::from_path("").is_valid());
    }

    #[test]
    fn test_with_owner_returns_new_value() {
        let id = ObjectIdentity::from_path("PACKAGES/emp_api.pks");
        let owned = id.with_owner("hr");
        assert_eq!(id.owner, None);
        assert_eq!(owned.owner.as_deref(), Some("HR"));
        assert_eq!(owned.cache_key(), "HR.PACKAGE.EMP_API");
        assert_eq!(owned.to_string(), "HR.EMP_API (PACKAGE)");
    }

    #[test]
    fn test_type_codes() {
        assert_eq!(ObjectType::Package.type_code(), "PACKAGE_SPEC");
        assert_eq!(ObjectType::TypeBody.type_code(), "TYPE_BODY");
        assert_eq!(ObjectType::Trigger.type_code(), "TRIGGER");
        assert_eq!(
            ObjectIdentity::new("HR", "EMP_API", ObjectType::PackageBody).type_code(),
            "PACKAGE_BODY"
        );
        assert_eq!(ObjectIdentity::from_path("notes/readme").type_code(), "");
        assert_eq!(ObjectType::from_catalog_name("package body"), Some(ObjectType::PackageBody));
        assert_eq!(ObjectType::from_suffix("PKS"), Some(ObjectType::Package));
    }
}
