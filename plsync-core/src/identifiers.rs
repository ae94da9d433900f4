//! Checks for names that end up inside statement text.
//!
//! Generator functions and warning scopes cannot be bound as parameters, so
//! they are validated before any session call is made with them.

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::error::{DbError, DbResult};

static FUNCTION_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_$#]*(\.[A-Za-z][A-Za-z0-9_$#]*)*$").unwrap());

static WARNING_SCOPE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z_]+$").unwrap());

/// Accept a dotted function path such as `hr.api_gen.table_api`.
pub fn function_name(function: &str) -> DbResult<&str> {
    if FUNCTION_PATH.is_match(function) {
        Ok(function)
    } else {
        Err(DbError::new(format!("invalid generator function name: {function}")))
    }
}

/// Accept a warning category such as `ALL` or `SEVERE`.
pub fn warning_scope(scope: &str) -> DbResult<&str> {
    if WARNING_SCOPE.is_match(scope) {
        Ok(scope)
    } else {
        Err(DbError::new(format!("invalid warning scope: {scope}")))
    }
}
