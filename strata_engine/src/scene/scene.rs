/// Scene — ordered objects, one camera, and per-slot device buffers
///
/// Objects are addressed by their position, which is stable for the
/// lifetime of the scene (objects are never removed individually). The
/// position is also the object's dynamic block index.

use std::sync::Arc;
use crate::error::{Error, Result};
use crate::frame::DynamicBlockLayout;
use crate::graphics_device::{
    BindingGroup, BindingResource, Buffer, BufferDesc, BufferUsage, GraphicsDevice,
    SamplerType, Texture,
};
use super::camera::{Camera, CameraBlock};
use super::layouts::{scene_binding_layout, texture_binding_layout, SCENE_SET, TEXTURE_SET};
use super::render_object::{ObjectDesc, RenderObject};

/// Device resources one frame slot writes and binds for a scene
pub struct SceneFrameResources {
    pub camera_buffer: Arc<dyn Buffer>,
    pub dynamic_buffer: Arc<dyn Buffer>,
    pub binding_group: Arc<dyn BindingGroup>,
}

/// A texture and the set-1 binding group sampling it
pub struct TextureSet {
    pub texture: Arc<dyn Texture>,
    pub binding_group: Arc<dyn BindingGroup>,
}

pub struct Scene {
    name: String,
    camera: Camera,
    objects: Vec<RenderObject>,
    textures: Vec<TextureSet>,
    layout: DynamicBlockLayout,
    /// One entry per frame slot
    frames: Vec<SceneFrameResources>,
}

impl Scene {
    /// Create an empty scene with one camera buffer, dynamic buffer and
    /// binding group per frame slot
    pub fn new(
        device: &dyn GraphicsDevice,
        name: impl Into<String>,
        layout: DynamicBlockLayout,
        frames_in_flight: usize,
    ) -> Result<Self> {
        let name = name.into();
        let group_layout = scene_binding_layout();
        let mut frames = Vec::with_capacity(frames_in_flight);
        for slot in 0..frames_in_flight {
            let camera_buffer = device.create_buffer(BufferDesc {
                size: std::mem::size_of::<CameraBlock>() as u64,
                usage: BufferUsage::Uniform,
                label: format!("{}.camera[{}]", name, slot),
            })?;
            let dynamic_buffer = device.create_buffer(BufferDesc {
                size: layout.buffer_size(),
                usage: BufferUsage::Uniform,
                label: format!("{}.transforms[{}]", name, slot),
            })?;
            let binding_group = device.create_binding_group(
                &group_layout,
                SCENE_SET,
                &[
                    BindingResource::UniformBuffer(camera_buffer.as_ref()),
                    BindingResource::DynamicUniformBuffer(dynamic_buffer.as_ref(), layout.block_size()),
                ],
            )?;
            frames.push(SceneFrameResources { camera_buffer, dynamic_buffer, binding_group });
        }

        Ok(Self {
            name,
            camera: Camera::default(),
            objects: Vec::new(),
            textures: Vec::new(),
            layout,
            frames,
        })
    }

    /// Append an object and upload its mesh; returns its position
    ///
    /// # Errors
    ///
    /// `CapacityExceeded` if the scene's dynamic buffer is full,
    /// `InvalidResource` for an empty mesh or an unknown texture set.
    pub fn add_object(&mut self, device: &dyn GraphicsDevice, desc: ObjectDesc) -> Result<usize> {
        let position = self.objects.len();
        self.layout.offset_of(position)?;

        if desc.mesh.vertices.is_empty() || desc.mesh.indices.is_empty() {
            return Err(Error::InvalidResource(format!("object '{}' has an empty mesh", desc.label)));
        }
        if let Some(texture) = desc.texture {
            if texture >= self.textures.len() {
                return Err(Error::InvalidResource(format!(
                    "object '{}' references texture set {} but scene '{}' has {}",
                    desc.label, texture, self.name, self.textures.len()
                )));
            }
        }

        let vertex_bytes = desc.mesh.vertex_bytes();
        let vertex_buffer = device.create_buffer(BufferDesc {
            size: vertex_bytes.len() as u64,
            usage: BufferUsage::Vertex,
            label: format!("{}.{}.vertices", self.name, desc.label),
        })?;
        vertex_buffer.update(0, vertex_bytes)?;

        let index_bytes = desc.mesh.index_bytes();
        let index_buffer = device.create_buffer(BufferDesc {
            size: index_bytes.len() as u64,
            usage: BufferUsage::Index,
            label: format!("{}.{}.indices", self.name, desc.label),
        })?;
        index_buffer.update(0, index_bytes)?;

        self.objects.push(RenderObject::new(&desc, vertex_buffer, index_buffer));
        Ok(position)
    }

    /// Register a texture set; returns its index
    pub fn add_texture(
        &mut self,
        device: &dyn GraphicsDevice,
        texture: Arc<dyn Texture>,
        sampler: SamplerType,
    ) -> Result<usize> {
        let binding_group = device.create_binding_group(
            &texture_binding_layout(),
            TEXTURE_SET,
            &[BindingResource::SampledTexture(texture.as_ref(), sampler)],
        )?;
        self.textures.push(TextureSet { texture, binding_group });
        Ok(self.textures.len() - 1)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Objects in position order
    pub fn objects(&self) -> &[RenderObject] {
        &self.objects
    }

    pub fn object(&self, position: usize) -> Option<&RenderObject> {
        self.objects.get(position)
    }

    pub fn object_mut(&mut self, position: usize) -> Option<&mut RenderObject> {
        self.objects.get_mut(position)
    }

    /// Show or hide the object at `position`; it keeps its dynamic block
    pub fn set_visible(&mut self, position: usize, visible: bool) -> Result<()> {
        let name = &self.name;
        let object = self.objects.get_mut(position).ok_or_else(|| {
            Error::InvalidResource(format!("scene '{}' has no object at position {}", name, position))
        })?;
        object.set_visible(visible);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn layout(&self) -> &DynamicBlockLayout {
        &self.layout
    }

    pub fn texture_sets(&self) -> &[TextureSet] {
        &self.textures
    }

    /// Resources written and bound by frame slot `slot`
    pub fn frame_resources(&self, slot: usize) -> Result<&SceneFrameResources> {
        self.frames.get(slot).ok_or_else(|| {
            Error::InvalidResource(format!("scene '{}' has no resources for frame slot {}", self.name, slot))
        })
    }
}

#[cfg(test)]
#[path = "scene_tests.rs"]
mod tests;
