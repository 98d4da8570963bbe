/// Pipeline - Vulkan implementation of the Pipeline trait

use strata_engine::strata::render::Pipeline as RenderPipeline;
use ash::vk;

/// Vulkan pipeline implementation
///
/// Descriptor set layouts are owned by the device's layout cache, not by
/// the pipeline, so they are shared with binding groups.
pub struct Pipeline {
    /// Vulkan graphics pipeline
    pub(crate) pipeline: vk::Pipeline,
    /// Pipeline layout (used for descriptor set binding and push constants)
    pub(crate) pipeline_layout: vk::PipelineLayout,
    pub(crate) set_layout_count: u32,
    /// Vulkan device (for cleanup)
    pub(crate) device: ash::Device,
}

impl RenderPipeline for Pipeline {
    fn binding_group_layout_count(&self) -> u32 {
        self.set_layout_count
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline(self.pipeline, None);
            self.device.destroy_pipeline_layout(self.pipeline_layout, None);
        }
    }
}
