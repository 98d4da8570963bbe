/// Swapchain trait - the surface provider the frame scheduler drives

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{RenderTarget, Semaphore, TextureFormat};

/// Outcome of a successful present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentStatus {
    /// Surface matches the window
    Optimal,
    /// Presented, but the surface should be rebuilt before the next frame
    Suboptimal,
}

/// Presentable image set bound to a window surface
pub trait Swapchain: Send + Sync {
    /// Acquire the next presentable image
    ///
    /// `signal` is signaled when the image is ready to be written.
    /// Returns `Error::SurfaceOutOfDate` when the surface must be rebuilt.
    fn acquire_next_image(&mut self, signal: &dyn Semaphore) -> Result<u32>;

    /// Queue `image_index` for presentation after `wait` is signaled
    fn present(&mut self, image_index: u32, wait: &dyn Semaphore) -> Result<PresentStatus>;

    /// Rebuild the image set for a new extent
    fn recreate(&mut self, width: u32, height: u32) -> Result<()>;

    fn image_count(&self) -> usize;

    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Negotiated color format
    fn format(&self) -> TextureFormat;

    /// Color render target wrapping image `image_index`
    fn color_target(&self, image_index: u32) -> Result<Arc<dyn RenderTarget>>;
}
