//! Structured compiler diagnostics.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Text of the synthetic diagnostic raised by the stale-object guard.
pub const OBJECT_CHANGED_TEXT: &str =
    "Db Object has changed. Resolve any merge failure and compile again.";

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Attribute {
    /// Compilation failed.
    Error,
    /// Compiler warning.
    Warning,
    /// Informational message.
    Info,
}

impl Attribute {
    /// Parse the `attribute` column of the error catalog.
    ///
    /// Unknown values are treated as errors.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "WARNING" => Self::Warning,
            "INFO" => Self::Info,
            _ => Self::Error,
        }
    }

    /// Upper-case name as stored in the catalog.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a diagnostic came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticKind {
    /// Recorded by the database in its error catalog.
    Compiler,
    /// Raised by the stale-object guard.
    ObjectChanged,
    /// Converted from a driver or database fault.
    System,
}

impl DiagnosticKind {
    /// Stable identifier for front ends that key on it.
    pub fn code(self) -> Option<&'static str> {
        match self {
            Self::Compiler => None,
            Self::ObjectChanged => Some("0001"),
            Self::System => Some("0003"),
        }
    }
}

/// A single diagnostic with its location in the submitted source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub position: u32,
    /// Severity.
    pub attribute: Attribute,
    /// Message text.
    pub text: String,
    /// Origin.
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    /// A diagnostic read from the database error catalog.
    pub fn compiler(line: u32, position: u32, attribute: Attribute, text: impl Into<String>) -> Self {
        Self {
            line,
            position,
            attribute,
            text: text.into(),
            kind: DiagnosticKind::Compiler,
        }
    }

    /// An error converted from a system fault.
    pub fn system(line: u32, position: u32, text: impl Into<String>) -> Self {
        Self {
            line,
            position,
            attribute: Attribute::Error,
            text: text.into(),
            kind: DiagnosticKind::System,
        }
    }

    /// The stale-object guard error, reported at 1/1.
    pub fn object_changed() -> Self {
        Self {
            line: 1,
            position: 1,
            attribute: Attribute::Error,
            text: OBJECT_CHANGED_TEXT.to_string(),
            kind: DiagnosticKind::ObjectChanged,
        }
    }

    /// Check if this is an error.
    pub fn is_error(&self) -> bool {
        self.attribute == Attribute::Error
    }

    /// Check if this is a warning.
    pub fn is_warning(&self) -> bool {
        self.attribute == Attribute::Warning
    }

    /// Check if this is informational.
    pub fn is_info(&self) -> bool {
        self.attribute == Attribute::Info
    }

    /// Check if this is the stale-object conflict marker.
    pub fn is_dirty(&self) -> bool {
        self.kind == DiagnosticKind::ObjectChanged
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} {} {}", self.line, self.position, self.attribute, self.text)
    }
}

/// Ordered, append-only diagnostics of one export or compile attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiagnosticList(Vec<Diagnostic>);

impl DiagnosticList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    /// Iterate over the diagnostics in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    /// Number of diagnostics.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check if any diagnostic is an error.
    pub fn has_errors(&self) -> bool {
        self.0.iter().any(Diagnostic::is_error)
    }

    /// Check if any diagnostic is a warning.
    pub fn has_warnings(&self) -> bool {
        self.0.iter().any(Diagnostic::is_warning)
    }

    /// Check if any diagnostic is informational.
    pub fn has_infos(&self) -> bool {
        self.0.iter().any(Diagnostic::is_info)
    }

    /// Check if the list carries the stale-object conflict marker.
    pub fn has_dirt(&self) -> bool {
        self.0.iter().any(Diagnostic::is_dirty)
    }

    /// View as a slice.
    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.0
    }
}

impl Extend<Diagnostic> for DiagnosticList {
    fn extend<I: IntoIterator<Item = Diagnostic>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl FromIterator<Diagnostic> for DiagnosticList {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for DiagnosticList {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a DiagnosticList {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for DiagnosticList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, diagnostic) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{}", diagnostic)?;
        }
        Ok(())
    }
}
