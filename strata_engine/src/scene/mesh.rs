/// Mesh — CPU-side vertex and index arrays
///
/// Mesh data arrives from the application (or an asset loader) already
/// decoded; the scene uploads it once when the object is added.

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};
use crate::graphics_device::{
    BufferFormat, VertexAttribute, VertexBinding, VertexInputRate, VertexLayout,
};

/// Vertex made only of `Vec4` members (16 bytes each)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec4,
    pub normal: Vec4,
    pub color: Vec4,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, color: Vec4) -> Self {
        Self {
            position: position.extend(1.0),
            normal: normal.extend(0.0),
            color,
        }
    }
}

/// Indexed triangle mesh
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Unit quad in the XY plane, centered at the origin, facing +Z
    pub fn quad(color: Vec4) -> Self {
        let normal = Vec3::Z;
        let vertices = vec![
            Vertex::new(Vec3::new(-0.5, -0.5, 0.0), normal, color),
            Vertex::new(Vec3::new(0.5, -0.5, 0.0), normal, color),
            Vertex::new(Vec3::new(0.5, 0.5, 0.0), normal, color),
            Vertex::new(Vec3::new(-0.5, 0.5, 0.0), normal, color),
        ];
        Self::new(vertices, vec![0, 1, 2, 2, 3, 0])
    }

    /// Unit cube centered at the origin, 4 vertices per face
    pub fn cube(color: Vec4) -> Self {
        let faces = [
            (Vec3::X, Vec3::Y),
            (Vec3::NEG_X, Vec3::Y),
            (Vec3::Y, Vec3::Z),
            (Vec3::NEG_Y, Vec3::Z),
            (Vec3::Z, Vec3::Y),
            (Vec3::NEG_Z, Vec3::Y),
        ];
        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, up) in faces {
            let right = up.cross(normal);
            let center = normal * 0.5;
            let base = vertices.len() as u32;
            for (u, v) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
                vertices.push(Vertex::new(center + right * u + up * v, normal, color));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }
        Self::new(vertices, indices)
    }

    /// Overwrite the color of every vertex
    pub fn set_color(&mut self, color: Vec4) {
        for vertex in &mut self.vertices {
            vertex.color = color;
        }
    }

    pub fn triangle_count(&self) -> u64 {
        self.indices.len() as u64 / 3
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Vertex layout matching [`Vertex`]
    pub fn vertex_layout() -> VertexLayout {
        let stride = std::mem::size_of::<Vertex>() as u32;
        VertexLayout {
            bindings: vec![VertexBinding { binding: 0, stride, input_rate: VertexInputRate::Vertex }],
            attributes: (0..3)
                .map(|location| VertexAttribute {
                    location,
                    binding: 0,
                    format: BufferFormat::R32G32B32A32_SFLOAT,
                    offset: location * 16,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
#[path = "mesh_tests.rs"]
mod tests;
