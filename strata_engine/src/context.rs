//! Engine context - explicit logging and metrics state
//!
//! Every component that logs or reports statistics holds an `Arc<EngineContext>`.
//! Several engines (or several test cases) can therefore run in one process
//! without sharing a logger or counters.

use std::sync::{Arc, RwLock};
use std::time::SystemTime;
use crate::frame::FrameStats;
use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};

/// Cumulative renderer statistics plus the counters of the last presented frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RendererStats {
    /// Frames submitted and handed to the presentation engine
    pub frames_presented: u64,
    /// Frames abandoned because the surface went stale before submission
    pub frames_abandoned: u64,
    /// Number of surface/target rebuilds
    pub surface_rebuilds: u64,
    /// Draw calls recorded in the last frame
    pub draw_calls: u32,
    /// Triangles submitted in the last frame
    pub triangles: u64,
    /// Render passes begun in the last frame
    pub render_passes: u32,
    /// Hidden objects skipped in the last frame
    pub hidden_skipped: u32,
}

/// Logging and metrics context passed explicitly to engine components
pub struct EngineContext {
    logger: RwLock<Arc<dyn Logger>>,
    min_severity: RwLock<LogSeverity>,
    stats: RwLock<RendererStats>,
}

impl EngineContext {
    /// Create a context logging through `logger`
    pub fn new(logger: Arc<dyn Logger>) -> Arc<Self> {
        Arc::new(Self {
            logger: RwLock::new(logger),
            min_severity: RwLock::new(LogSeverity::Trace),
            stats: RwLock::new(RendererStats::default()),
        })
    }

    /// Create a context using the colored console logger
    pub fn with_default_logger() -> Arc<Self> {
        Self::new(Arc::new(DefaultLogger))
    }

    /// Replace the logger
    pub fn set_logger(&self, logger: Arc<dyn Logger>) {
        if let Ok(mut guard) = self.logger.write() {
            *guard = logger;
        }
    }

    /// Drop every entry below `severity`
    pub fn set_min_severity(&self, severity: LogSeverity) {
        if let Ok(mut guard) = self.min_severity.write() {
            *guard = severity;
        }
    }

    /// Current minimum severity
    pub fn min_severity(&self) -> LogSeverity {
        self.min_severity.read().map(|s| *s).unwrap_or(LogSeverity::Trace)
    }

    /// Log a message without file/line information
    pub fn log(&self, severity: LogSeverity, source: &str, message: String) {
        self.dispatch(LogEntry {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: None,
            line: None,
        });
    }

    /// Log a message with file/line information
    pub fn log_detailed(
        &self,
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        self.dispatch(LogEntry {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: Some(file),
            line: Some(line),
        });
    }

    fn dispatch(&self, entry: LogEntry) {
        if entry.severity < self.min_severity() {
            return;
        }
        if let Ok(logger) = self.logger.read() {
            logger.log(&entry);
        }
    }

    /// Snapshot of the current statistics
    pub fn stats(&self) -> RendererStats {
        self.stats.read().map(|s| *s).unwrap_or_default()
    }

    /// Account for one presented frame
    pub fn record_frame(&self, frame: &FrameStats) {
        if let Ok(mut stats) = self.stats.write() {
            stats.frames_presented += 1;
            stats.draw_calls = frame.draw_calls;
            stats.triangles = frame.triangles;
            stats.render_passes = frame.render_passes;
            stats.hidden_skipped = frame.hidden_skipped;
        }
    }

    /// Account for one frame abandoned before submission
    pub fn record_abandoned_frame(&self) {
        if let Ok(mut stats) = self.stats.write() {
            stats.frames_abandoned += 1;
        }
    }

    /// Account for one surface rebuild
    pub fn record_surface_rebuild(&self) {
        if let Ok(mut stats) = self.stats.write() {
            stats.surface_rebuilds += 1;
        }
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
