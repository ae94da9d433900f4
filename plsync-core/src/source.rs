//! Source text normalization on the way in and out of the database.

use std::sync::LazyLock;

use regex_lite::Regex;

static TRIGGER_ENABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\nALTER TRIGGER.*").unwrap());

static BLOCK_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)END(\s\w*)*;$").unwrap());

/// Clean up a definition produced by the DDL generator.
///
/// Trims whitespace, strips NUL bytes and drops the `ALTER TRIGGER .. ENABLE`
/// line the generator appends to trigger definitions.
pub fn normalize_exported(ddl: &str) -> String {
    let without_nul: String = ddl.trim().chars().filter(|c| *c != '\0').collect();
    TRIGGER_ENABLE.replace_all(&without_nul, "").trim().to_string()
}

/// Prepare local source for submission.
///
/// Removes a trailing `/` terminator, then every trailing `;` unless the source
/// ends with a block closer such as `END;` or `END name;`.
pub fn prepare_for_compile(code: &str) -> String {
    let code = code.trim().trim_end_matches('/').trim();

    if BLOCK_END.is_match(code) {
        return code.to_string();
    }

    code.trim_end_matches(';').to_string()
}
