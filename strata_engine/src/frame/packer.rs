/// DynamicBlockPacker — copies transform blocks into a slot's dynamic buffer
///
/// Every object is packed, visible or not, so the block of the object at
/// position `i` always sits at `i * stride`. The caller must have waited on
/// the slot's fence: this writes memory the device may otherwise still read.

use crate::error::{Error, Result};
use crate::scene::Scene;
use super::alignment::DynamicBlockLayout;

pub struct DynamicBlockPacker {
    layout: DynamicBlockLayout,
    scratch: Vec<u8>,
}

impl DynamicBlockPacker {
    pub fn new(layout: DynamicBlockLayout) -> Self {
        Self {
            layout,
            scratch: vec![0; layout.buffer_size() as usize],
        }
    }

    pub fn layout(&self) -> &DynamicBlockLayout {
        &self.layout
    }

    /// Pack `scene` into the buffers of frame slot `slot`
    ///
    /// Writes `stride * object_count` bytes of transform blocks and the
    /// scene's camera block. Returns the number of transform bytes written.
    pub fn pack(&mut self, scene: &Scene, slot: usize) -> Result<u64> {
        if scene.layout() != &self.layout {
            return Err(Error::InvalidResource(format!(
                "scene '{}' was planned with a different dynamic block layout",
                scene.name()
            )));
        }
        let resources = scene.frame_resources(slot)?;

        for (position, object) in scene.objects().iter().enumerate() {
            let offset = self.layout.offset_of(position)? as usize;
            let bytes = bytemuck::bytes_of(object.transform());
            self.scratch[offset..offset + bytes.len()].copy_from_slice(bytes);
        }

        let len = self.layout.stride() * scene.len() as u64;
        if len > 0 {
            resources.dynamic_buffer.update(0, &self.scratch[..len as usize])?;
        }
        resources
            .camera_buffer
            .update(0, bytemuck::bytes_of(&scene.camera().to_block()))?;
        Ok(len)
    }
}

#[cfg(test)]
#[path = "packer_tests.rs"]
mod tests;
