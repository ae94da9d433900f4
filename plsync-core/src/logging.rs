//! Logging setup for plsync.
//!
//! All plsync crates log through `tracing`. This module only decides whether a
//! subscriber should be installed and how it formats events.
//!
//! # Environment Variables
//!
//! - `PLSYNC_DEBUG=true|1|yes` - Enable debug logging
//! - `PLSYNC_LOG_LEVEL=trace|debug|info|warn|error` - Set a specific level
//! - `PLSYNC_LOG_FORMAT=json|pretty|compact` - Output format (default: compact)
//!
//! # Usage
//!
//! ```rust,no_run
//! use plsync_core::logging;
//!
//! // Call once at startup; later calls are no-ops.
//! logging::init();
//! ```
//!
//! Installing a subscriber requires the `tracing-subscriber` feature. Without
//! it, events go to whatever subscriber the host application installs.

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

const DEBUG_VAR: &str = "PLSYNC_DEBUG";
const LEVEL_VAR: &str = "PLSYNC_LOG_LEVEL";
const FORMAT_VAR: &str = "PLSYNC_LOG_FORMAT";

/// Crates whose events are enabled by the generated filter.
const TARGETS: &[&str] = &["plsync", "plsync_core", "plsync_cache", "plsync_engine"];

/// Output format for the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Multi-line human readable output.
    Pretty,
    /// Single-line human readable output.
    Compact,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            "pretty" => Self::Pretty,
            _ => Self::Compact,
        }
    }
}

/// Check if debug logging is enabled via `PLSYNC_DEBUG`.
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var(DEBUG_VAR)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// The level requested through `PLSYNC_LOG_LEVEL`.
///
/// Falls back to `debug` when `PLSYNC_DEBUG` is on, otherwise `warn`.
pub fn log_level() -> &'static str {
    let fallback = if is_debug_enabled() { "debug" } else { "warn" };
    match env::var(LEVEL_VAR) {
        Ok(level) => match level.to_ascii_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "info" => "info",
            "warn" => "warn",
            "error" => "error",
            _ => fallback,
        },
        Err(_) => fallback,
    }
}

/// The format requested through `PLSYNC_LOG_FORMAT`.
pub fn log_format() -> LogFormat {
    env::var(FORMAT_VAR)
        .map(|f| LogFormat::parse(&f))
        .unwrap_or(LogFormat::Compact)
}

/// Build the `EnvFilter` directive string for a level.
pub fn filter_directive(level: &str) -> String {
    TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize logging from the environment.
///
/// Does nothing unless `PLSYNC_DEBUG` or `PLSYNC_LOG_LEVEL` is set.
pub fn init() {
    INIT.call_once(|| {
        if !is_debug_enabled() && env::var(LEVEL_VAR).is_err() {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let level = log_level();
            let filter = EnvFilter::try_new(filter_directive(level))
                .unwrap_or_else(|_| EnvFilter::new("warn"));
            let format = log_format();

            match format {
                LogFormat::Json => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().json())
                        .init();
                }
                LogFormat::Pretty => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().pretty())
                        .init();
                }
                LogFormat::Compact => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().compact())
                        .init();
                }
            }

            tracing::info!(level, format = ?format, "plsync logging initialized");
        }
    });
}

/// Initialize logging at a specific level.
///
/// # Safety
///
/// Sets `PLSYNC_LOG_LEVEL` in the process environment. Call it at startup
/// before other threads exist.
pub fn init_with_level(level: &str) {
    // SAFETY: only called at program startup before threads are spawned.
    unsafe {
        env::set_var(LEVEL_VAR, level);
    }
    init();
}
