/// BindingGroup - Vulkan implementation of the BindingGroup trait

use strata_engine::strata::render::BindingGroup as RenderBindingGroup;
use ash::vk;

/// Vulkan binding group implementation
///
/// Wraps a VkDescriptorSet handle. The descriptor set is freed when its
/// pool is destroyed. Immutable after creation.
pub struct BindingGroup {
    /// Vulkan descriptor set handle
    pub(crate) descriptor_set: vk::DescriptorSet,
    /// Set index this binding group was created for
    pub(crate) set_index: u32,
    /// Number of dynamic offsets a bind must supply
    pub(crate) dynamic_offset_count: usize,
}

impl RenderBindingGroup for BindingGroup {
    fn set_index(&self) -> u32 {
        self.set_index
    }
}
