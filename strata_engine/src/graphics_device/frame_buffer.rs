/// Framebuffer trait - groups render target attachments for a render pass
///
/// Created once per (attachment layout, surface image) and reused each frame.
/// Recreated only when the surface is rebuilt.

use std::sync::Arc;
use crate::graphics_device::{RenderPass, RenderTarget};

/// Framebuffer — groups color and depth attachments together
pub trait Framebuffer: Send + Sync {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
}

/// Descriptor for creating a framebuffer
pub struct FramebufferDesc<'a> {
    /// The render pass this framebuffer is compatible with
    pub render_pass: &'a Arc<dyn RenderPass>,
    /// Color attachments
    pub color_attachments: Vec<Arc<dyn RenderTarget>>,
    /// Optional depth attachment
    pub depth_attachment: Option<Arc<dyn RenderTarget>>,
    pub width: u32,
    pub height: u32,
}
