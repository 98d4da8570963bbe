//! Engine configuration

use crate::error::{Error, Result};
use crate::log::LogSeverity;

/// Upper bound on frames in flight accepted by [`EngineConfig::validate`]
pub const MAX_FRAMES_IN_FLIGHT: usize = 4;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Application name reported to the graphics API
    pub app_name: String,
    /// Application version (major, minor, patch)
    pub app_version: (u32, u32, u32),
    /// Enable API validation layers and route their messages to the logger
    pub enable_validation: bool,
    /// Number of frame slots recorded/submitted concurrently (N)
    pub frames_in_flight: usize,
    /// Capacity of each scene's dynamic transform buffer, in objects
    pub max_objects_per_scene: usize,
    /// Color the first render pass of each frame clears to
    pub clear_color: [f32; 4],
    /// Prefer a presentation mode synchronized to the display refresh
    pub vsync: bool,
    /// Entries below this severity are dropped
    pub min_log_severity: LogSeverity,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            app_name: "Strata Application".to_string(),
            app_version: (0, 1, 0),
            enable_validation: cfg!(debug_assertions),
            frames_in_flight: 2,
            max_objects_per_scene: 1024,
            clear_color: [0.02, 0.02, 0.03, 1.0],
            vsync: true,
            min_log_severity: LogSeverity::Debug,
        }
    }
}

impl EngineConfig {
    /// Check the configuration before any device object is created
    pub fn validate(&self) -> Result<()> {
        if self.frames_in_flight == 0 || self.frames_in_flight > MAX_FRAMES_IN_FLIGHT {
            return Err(Error::InitializationFailed(format!(
                "frames_in_flight must be in 1..={}, got {}",
                MAX_FRAMES_IN_FLIGHT, self.frames_in_flight
            )));
        }
        if self.max_objects_per_scene == 0 {
            return Err(Error::InitializationFailed(
                "max_objects_per_scene must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
