/// RenderObject — one drawable entry of a scene

use std::sync::Arc;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use crate::graphics_device::Buffer;
use super::mesh::Mesh;

/// Per-object transform, written to the dynamic uniform buffer and pushed as constants
///
/// `model_inv_transpose` is recomputed whenever `model` changes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TransformBlock {
    pub model: Mat4,
    pub model_inv_transpose: Mat4,
}

impl TransformBlock {
    pub fn from_model(model: Mat4) -> Self {
        Self {
            model,
            model_inv_transpose: model.inverse().transpose(),
        }
    }
}

impl Default for TransformBlock {
    fn default() -> Self {
        Self::from_model(Mat4::IDENTITY)
    }
}

/// What the application hands to `Scene::add_object`
#[derive(Debug, Clone)]
pub struct ObjectDesc {
    pub label: String,
    pub mesh: Mesh,
    pub transform: Mat4,
    /// Index into the engine's pipeline set
    pub pipeline: usize,
    /// Index into the scene's texture sets
    pub texture: Option<usize>,
    pub visible: bool,
}

impl ObjectDesc {
    pub fn new(label: impl Into<String>, mesh: Mesh, pipeline: usize) -> Self {
        Self {
            label: label.into(),
            mesh,
            transform: Mat4::IDENTITY,
            pipeline,
            texture: None,
            visible: true,
        }
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_texture(mut self, texture: usize) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// Drawable object owned by exactly one scene
///
/// The object's dynamic block offset is derived from its position in the
/// scene and never stored here.
pub struct RenderObject {
    label: String,
    vertex_buffer: Arc<dyn Buffer>,
    index_buffer: Arc<dyn Buffer>,
    index_count: u32,
    triangle_count: u64,
    transform: TransformBlock,
    pipeline: usize,
    texture: Option<usize>,
    visible: bool,
}

impl RenderObject {
    pub(crate) fn new(
        desc: &ObjectDesc,
        vertex_buffer: Arc<dyn Buffer>,
        index_buffer: Arc<dyn Buffer>,
    ) -> Self {
        Self {
            label: desc.label.clone(),
            vertex_buffer,
            index_buffer,
            index_count: desc.mesh.indices.len() as u32,
            triangle_count: desc.mesh.triangle_count(),
            transform: TransformBlock::from_model(desc.transform),
            pipeline: desc.pipeline,
            texture: desc.texture,
            visible: desc.visible,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn vertex_buffer(&self) -> &dyn Buffer {
        self.vertex_buffer.as_ref()
    }

    pub fn index_buffer(&self) -> &dyn Buffer {
        self.index_buffer.as_ref()
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn triangle_count(&self) -> u64 {
        self.triangle_count
    }

    pub fn transform(&self) -> &TransformBlock {
        &self.transform
    }

    /// Replace the model matrix
    pub fn set_transform(&mut self, model: Mat4) {
        self.transform = TransformBlock::from_model(model);
    }

    /// Pre-multiply the current model matrix by `transform`
    pub fn apply_transform(&mut self, transform: Mat4) {
        self.transform = TransformBlock::from_model(transform * self.transform.model);
    }

    pub fn pipeline(&self) -> usize {
        self.pipeline
    }

    pub fn texture(&self) -> Option<usize> {
        self.texture
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn show(&mut self) {
        self.visible = true;
    }
}

#[cfg(test)]
#[path = "render_object_tests.rs"]
mod tests;
