/// Binding group layouts shared by scenes and the pipelines that draw them
///
/// Set 0: binding 0 = camera block (uniform), binding 1 = transform blocks (dynamic uniform).
/// Set 1: binding 0 = object texture (combined image sampler), textured pipelines only.

use crate::graphics_device::{BindingGroupLayoutDesc, BindingSlotDesc, BindingType, ShaderStageFlags};

/// Set index of the per-scene group
pub const SCENE_SET: u32 = 0;
/// Set index of the per-texture group
pub const TEXTURE_SET: u32 = 1;

/// Layout of the per-scene, per-slot binding group
pub fn scene_binding_layout() -> BindingGroupLayoutDesc {
    BindingGroupLayoutDesc {
        entries: vec![
            BindingSlotDesc {
                binding: 0,
                binding_type: BindingType::UniformBuffer,
                stages: ShaderStageFlags::VERTEX,
            },
            BindingSlotDesc {
                binding: 1,
                binding_type: BindingType::UniformBufferDynamic,
                stages: ShaderStageFlags::VERTEX,
            },
        ],
    }
}

/// Layout of a texture set
pub fn texture_binding_layout() -> BindingGroupLayoutDesc {
    BindingGroupLayoutDesc {
        entries: vec![BindingSlotDesc {
            binding: 0,
            binding_type: BindingType::CombinedImageSampler,
            stages: ShaderStageFlags::FRAGMENT,
        }],
    }
}
