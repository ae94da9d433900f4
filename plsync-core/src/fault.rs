//! Conversion of raw driver fault text into diagnostics.
//!
//! Database faults raised while submitting source (as opposed to errors
//! recorded in the catalog) arrive as free text. Known layouts are listed in
//! [`FAULT_PATTERNS`]; each pattern captures `(line, column, text)` and may
//! match several times in one message. Anything else becomes a single
//! diagnostic at the location the caller computed from the fault offset.

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::diagnostic::{Diagnostic, DiagnosticList};

/// A named fault message layout.
#[derive(Debug)]
pub struct FaultPattern {
    /// Short identifier used in tests and logs.
    pub name: &'static str,
    /// Pattern with three groups: line, column, text.
    pub regex: Regex,
}

const PATTERN_SOURCES: &[(&str, &str)] = &[
    // "ORA-06550: line 5, column 12:\nPLS-00201: identifier 'X' must be declared"
    ("line-column", r".*:\sline\s(\d+),\scolumn\s(\d+):\r?\n(.*)"),
];

/// Fault layouts, tried in order. The first pattern that matches wins.
pub static FAULT_PATTERNS: LazyLock<Vec<FaultPattern>> = LazyLock::new(|| {
    PATTERN_SOURCES
        .iter()
        .map(|(name, source)| FaultPattern {
            name,
            regex: Regex::new(source).unwrap(),
        })
        .collect()
});

/// Parse a fault message into error diagnostics.
///
/// `line_offset` is the 1-based file line of the first submitted line, so a
/// compiled selection reports file-absolute lines. `line` and `position` are
/// the fallback location, used only when no pattern matches.
pub fn parse_system_fault(message: &str, line_offset: u32, line: u32, position: u32) -> DiagnosticList {
    for pattern in FAULT_PATTERNS.iter() {
        let list: DiagnosticList = pattern
            .regex
            .captures_iter(message)
            .map(|caps| {
                let fault_line = caps[1].parse::<u32>().unwrap_or(1);
                let fault_position = caps[2].parse::<u32>().unwrap_or(1);
                Diagnostic::system(absolute_line(line_offset, fault_line), fault_position, caps[3].trim())
            })
            .collect();

        if !list.is_empty() {
            tracing::debug!(pattern = pattern.name, count = list.len(), "Parsed system fault");
            return list;
        }
    }

    std::iter::once(Diagnostic::system(absolute_line(line_offset, line), position, message.trim()))
        .collect()
}

fn absolute_line(line_offset: u32, line: u32) -> u32 {
    line_offset.saturating_add(line).saturating_sub(1)
}

/// Translate a character offset into a 1-based `(line, column)`.
///
/// `None` means the end of `source`. Offsets past the end are clamped.
pub fn line_and_position(source: &str, offset: Option<usize>) -> (u32, u32) {
    let limit = offset.unwrap_or(usize::MAX);
    let mut line: u32 = 1;
    let mut column: u32 = 1;

    for ch in source.chars().take(limit) {
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }

    (line, column)
}
