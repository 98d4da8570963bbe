//! Error types for the Strata engine
//!
//! Errors fall into three groups:
//! - fatal device/initialization failures (no retry),
//! - the recoverable stale-surface condition, absorbed by a rebuild at the next frame,
//! - invariant violations that indicate a programming error in the caller.

use thiserror::Error;

/// Result type for Strata engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Strata engine errors
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Backend-specific error (Vulkan, mock, etc.)
    #[error("Backend error: {0}")]
    BackendError(String),

    /// Out of GPU memory
    #[error("Out of GPU memory")]
    OutOfMemory,

    /// Invalid resource (texture, buffer, shader, pipeline index, etc.)
    #[error("Invalid resource: {0}")]
    InvalidResource(String),

    /// Initialization failed (engine, device, subsystems)
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// The presentable surface is stale and must be recreated
    #[error("Surface out of date")]
    SurfaceOutOfDate,

    /// The device was lost; nothing created from it is usable anymore
    #[error("Device lost")]
    DeviceLost,

    /// The device reported an unusable uniform buffer offset alignment
    #[error("Alignment misconfigured: {0}")]
    AlignmentMisconfigured(String),

    /// An object position does not fit in the dynamic block buffer
    #[error("Capacity exceeded: position {position} does not fit capacity {capacity}")]
    CapacityExceeded { position: usize, capacity: usize },

    /// A dynamic offset would read past the end of its buffer
    #[error("Offset out of bounds: {offset} + {size} exceeds buffer size {buffer_size}")]
    OffsetOutOfBounds { offset: u64, size: u64, buffer_size: u64 },

    /// A frame slot was recorded before its in-flight fence was waited on
    #[error("Frame slot {slot} recorded before its fence was waited on")]
    FenceNotWaited { slot: usize },

    /// Shader bytecode could not be loaded
    #[error("Shader load failed: {0}")]
    ShaderLoadFailed(String),
}

impl Error {
    /// True for conditions that are absorbed by rebuilding the surface
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::SurfaceOutOfDate)
    }

    /// True for errors that can only come from incorrect engine usage
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Error::CapacityExceeded { .. }
                | Error::OffsetOutOfBounds { .. }
                | Error::FenceNotWaited { .. }
        )
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
