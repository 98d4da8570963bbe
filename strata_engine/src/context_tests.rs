//! Unit tests for context.rs

use crate::context::{EngineContext, RendererStats};
use crate::frame::FrameStats;
use crate::log::{LogEntry, LogSeverity, Logger};
use std::sync::{Arc, Mutex};

struct CountingLogger {
    count: Mutex<usize>,
}

impl Logger for CountingLogger {
    fn log(&self, _entry: &LogEntry) {
        *self.count.lock().unwrap() += 1;
    }
}

#[test]
fn test_min_severity_filters_entries() {
    let logger = Arc::new(CountingLogger { count: Mutex::new(0) });
    let ctx = EngineContext::new(logger.clone());
    ctx.set_min_severity(LogSeverity::Warn);

    ctx.log(LogSeverity::Trace, "strata::Test", "dropped".to_string());
    ctx.log(LogSeverity::Info, "strata::Test", "dropped".to_string());
    ctx.log(LogSeverity::Warn, "strata::Test", "kept".to_string());
    ctx.log_detailed(LogSeverity::Error, "strata::Test", "kept".to_string(), file!(), line!());

    assert_eq!(*logger.count.lock().unwrap(), 2);
    assert_eq!(ctx.min_severity(), LogSeverity::Warn);
}

#[test]
fn test_set_logger_replaces_sink() {
    let first = Arc::new(CountingLogger { count: Mutex::new(0) });
    let second = Arc::new(CountingLogger { count: Mutex::new(0) });
    let ctx = EngineContext::new(first.clone());

    ctx.log(LogSeverity::Info, "strata::Test", "one".to_string());
    ctx.set_logger(second.clone());
    ctx.log(LogSeverity::Info, "strata::Test", "two".to_string());

    assert_eq!(*first.count.lock().unwrap(), 1);
    assert_eq!(*second.count.lock().unwrap(), 1);
}

#[test]
fn test_contexts_are_independent() {
    let a = EngineContext::with_default_logger();
    let b = EngineContext::with_default_logger();
    a.record_surface_rebuild();
    assert_eq!(a.stats().surface_rebuilds, 1);
    assert_eq!(b.stats(), RendererStats::default());
}

#[test]
fn test_record_frame_keeps_last_frame_counters() {
    let ctx = EngineContext::with_default_logger();
    ctx.record_frame(&FrameStats { draw_calls: 3, triangles: 30, render_passes: 1, hidden_skipped: 1 });
    ctx.record_frame(&FrameStats { draw_calls: 2, triangles: 4, render_passes: 2, hidden_skipped: 0 });
    ctx.record_abandoned_frame();

    let stats = ctx.stats();
    assert_eq!(stats.frames_presented, 2);
    assert_eq!(stats.frames_abandoned, 1);
    assert_eq!(stats.draw_calls, 2);
    assert_eq!(stats.triangles, 4);
    assert_eq!(stats.render_passes, 2);
    assert_eq!(stats.hidden_skipped, 0);
}
