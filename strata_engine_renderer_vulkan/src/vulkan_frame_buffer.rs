/// Framebuffer - Vulkan implementation of the Framebuffer trait
///
/// Wraps a VkFramebuffer that groups color and depth attachments.
/// Created once per (attachment layout, surface image), reused each frame.

use strata_engine::strata::render::{Framebuffer as RenderFramebuffer, RenderTarget};
use ash::vk;
use std::sync::Arc;

/// Vulkan framebuffer implementation
///
/// Keeps its attachments alive; destroyed when dropped.
pub struct Framebuffer {
    /// Vulkan framebuffer handle
    pub(crate) framebuffer: vk::Framebuffer,
    width: u32,
    height: u32,
    _attachments: Vec<Arc<dyn RenderTarget>>,
    /// Vulkan device (for cleanup)
    device: ash::Device,
}

impl Framebuffer {
    pub(crate) fn new(
        framebuffer: vk::Framebuffer,
        width: u32,
        height: u32,
        attachments: Vec<Arc<dyn RenderTarget>>,
        device: ash::Device,
    ) -> Self {
        Self { framebuffer, width, height, _attachments: attachments, device }
    }
}

impl RenderFramebuffer for Framebuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_framebuffer(self.framebuffer, None);
        }
    }
}
