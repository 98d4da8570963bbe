/// RenderPass - Vulkan implementation of the RenderPass trait

use strata_engine::strata::render::RenderPass as RenderRenderPass;
use ash::vk;

/// Vulkan render pass implementation
///
/// Simple wrapper around vk::RenderPass
pub struct RenderPass {
    /// Vulkan render pass handle
    pub(crate) render_pass: vk::RenderPass,
    /// Number of attachments, color first then depth
    pub(crate) attachment_count: usize,
    /// Vulkan device (for cleanup)
    pub(crate) device: ash::Device,
}

impl RenderRenderPass for RenderPass {}

impl Drop for RenderPass {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_render_pass(self.render_pass, None);
        }
    }
}
