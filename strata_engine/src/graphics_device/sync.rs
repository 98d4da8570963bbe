/// Host/device synchronization primitives

use crate::error::Result;

/// Timeout meaning "block until signaled"
pub const WAIT_FOREVER: u64 = u64::MAX;

/// Host-observable completion signal
///
/// Destroyed when dropped. The owner must make sure no pending
/// submission still references it (see `FrameScheduler::drain`).
pub trait Fence: Send + Sync {
    /// Block until signaled or `timeout_ns` elapses
    fn wait(&self, timeout_ns: u64) -> Result<()>;

    /// Return the fence to the unsignaled state
    fn reset(&self) -> Result<()>;

    /// Query without blocking
    fn is_signaled(&self) -> Result<bool>;
}

/// Device-only ordering signal between queue operations
pub trait Semaphore: Send + Sync {}
