//! Unit tests for log.rs
//!
//! Tests Logger trait, LogEntry, LogSeverity, DefaultLogger, LogFacadeLogger and the macros.

use crate::context::EngineContext;
use crate::error::Error;
use crate::log::{DefaultLogger, LogEntry, LogFacadeLogger, LogSeverity, Logger};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

/// Logger capturing every entry for inspection
struct CaptureLogger {
    entries: Mutex<Vec<LogEntry>>,
}

impl CaptureLogger {
    fn new() -> Arc<Self> {
        Arc::new(Self { entries: Mutex::new(Vec::new()) })
    }

    fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap().clone()
    }
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

fn entry(severity: LogSeverity, file: Option<&'static str>, line: Option<u32>) -> LogEntry {
    LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: "strata::Test".to_string(),
        message: "hello".to_string(),
        file,
        line,
    }
}

// ============================================================================
// LOG SEVERITY TESTS
// ============================================================================

#[test]
fn test_log_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}

#[test]
fn test_log_severity_debug() {
    assert_eq!(format!("{:?}", LogSeverity::Trace), "Trace");
    assert_eq!(format!("{:?}", LogSeverity::Error), "Error");
}

// ============================================================================
// DEFAULT LOGGER
// ============================================================================

#[test]
fn test_default_logger_plain_format_without_location() {
    let line = DefaultLogger::format_plain(&entry(LogSeverity::Info, None, None));
    assert!(line.contains("[INFO ]"));
    assert!(line.contains("[strata::Test]"));
    assert!(line.ends_with("hello"));
}

#[test]
fn test_default_logger_plain_format_with_location() {
    let line = DefaultLogger::format_plain(&entry(LogSeverity::Error, Some("scheduler.rs"), Some(42)));
    assert!(line.contains("[ERROR]"));
    assert!(line.ends_with("hello (scheduler.rs:42)"));
}

#[test]
fn test_default_logger_does_not_panic() {
    DefaultLogger.log(&entry(LogSeverity::Warn, None, None));
    DefaultLogger.log(&entry(LogSeverity::Error, Some("a.rs"), Some(1)));
}

#[test]
fn test_facade_level_mapping() {
    assert_eq!(LogFacadeLogger::level(LogSeverity::Trace), log::Level::Trace);
    assert_eq!(LogFacadeLogger::level(LogSeverity::Debug), log::Level::Debug);
    assert_eq!(LogFacadeLogger::level(LogSeverity::Info), log::Level::Info);
    assert_eq!(LogFacadeLogger::level(LogSeverity::Warn), log::Level::Warn);
    assert_eq!(LogFacadeLogger::level(LogSeverity::Error), log::Level::Error);
}

#[test]
fn test_facade_logger_without_backend_is_silent() {
    LogFacadeLogger.log(&entry(LogSeverity::Info, None, None));
}

// ============================================================================
// MACROS
// ============================================================================

#[test]
fn test_macros_route_through_context() {
    let capture = CaptureLogger::new();
    let ctx = EngineContext::new(capture.clone());

    crate::engine_trace!(ctx, "strata::Test", "trace {}", 1);
    crate::engine_debug!(ctx, "strata::Test", "debug {}", 2);
    crate::engine_info!(ctx, "strata::Test", "info {}", 3);
    crate::engine_warn!(ctx, "strata::Test", "warn {}", 4);
    crate::engine_error!(ctx, "strata::Test", "error {}", 5);

    let entries = capture.entries();
    assert_eq!(entries.len(), 5);
    assert_eq!(entries[0].severity, LogSeverity::Trace);
    assert_eq!(entries[2].message, "info 3");
    assert_eq!(entries[4].severity, LogSeverity::Error);
    assert!(entries[4].file.is_some());
    assert!(entries[4].line.is_some());
    assert!(entries[3].file.is_none());
}

#[test]
fn test_engine_err_logs_and_builds_backend_error() {
    let capture = CaptureLogger::new();
    let ctx = EngineContext::new(capture.clone());

    let err = crate::engine_err!(ctx, "strata::Test", "fence {} failed", 3);
    assert!(matches!(err, Error::BackendError(ref m) if m == "fence 3 failed"));

    let entries = capture.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, LogSeverity::Error);
}

#[test]
fn test_engine_bail_returns_early() {
    let capture = CaptureLogger::new();
    let ctx = EngineContext::new(capture.clone());

    fn check(ctx: &EngineContext, value: u32) -> crate::error::Result<u32> {
        if value > 2 {
            crate::engine_bail!(ctx, "strata::Test", "value {} too large", value);
        }
        Ok(value)
    }

    assert_eq!(check(&ctx, 1).unwrap(), 1);
    assert!(check(&ctx, 7).is_err());
    assert_eq!(capture.entries().len(), 1);
}
