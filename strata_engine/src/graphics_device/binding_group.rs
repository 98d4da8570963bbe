/// Binding groups (descriptor sets) and their layouts

use bitflags::bitflags;
use crate::graphics_device::{Buffer, SamplerType, Texture};

bitflags! {
    /// Shader stages a binding is visible to
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStageFlags: u32 {
        const VERTEX = 1 << 0;
        const FRAGMENT = 1 << 1;
    }
}

/// Kind of resource a binding slot holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingType {
    /// Plain uniform buffer
    UniformBuffer,
    /// Uniform buffer addressed with a per-draw dynamic offset
    UniformBufferDynamic,
    /// Texture plus sampler
    CombinedImageSampler,
}

/// One slot of a binding group layout
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingSlotDesc {
    pub binding: u32,
    pub binding_type: BindingType,
    pub stages: ShaderStageFlags,
}

/// Layout of one binding group
///
/// Identical layouts are shared by the backend, so this type is hashable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BindingGroupLayoutDesc {
    pub entries: Vec<BindingSlotDesc>,
}

impl BindingGroupLayoutDesc {
    /// Number of dynamic offsets a bind of this layout expects
    pub fn dynamic_offset_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.binding_type == BindingType::UniformBufferDynamic)
            .count()
    }
}

/// A resource written into a binding group slot
pub enum BindingResource<'a> {
    /// Whole buffer
    UniformBuffer(&'a dyn Buffer),
    /// Window of `range` bytes, positioned at bind time by a dynamic offset
    DynamicUniformBuffer(&'a dyn Buffer, u64),
    /// Texture sampled with the given sampler
    SampledTexture(&'a dyn Texture, SamplerType),
}

/// Immutable binding group (destroyed when dropped)
pub trait BindingGroup: Send + Sync {
    /// Set index the group was created for
    fn set_index(&self) -> u32;
}

#[cfg(test)]
#[path = "binding_group_tests.rs"]
mod tests;
