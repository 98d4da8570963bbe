/// Pipeline trait and pipeline descriptor

use std::sync::Arc;
use crate::graphics_device::{
    BindingGroupLayoutDesc, BufferFormat, RenderPass, Shader, ShaderStage,
};

/// Vertex input rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexInputRate {
    /// Advance per vertex
    Vertex,
    /// Advance per instance
    Instance,
}

/// One vertex buffer binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexBinding {
    pub binding: u32,
    pub stride: u32,
    pub input_rate: VertexInputRate,
}

/// One vertex attribute inside a binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    pub binding: u32,
    pub format: BufferFormat,
    pub offset: u32,
}

/// Vertex layout of a pipeline
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VertexLayout {
    pub bindings: Vec<VertexBinding>,
    pub attributes: Vec<VertexAttribute>,
}

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    TriangleList,
    TriangleStrip,
    LineList,
    PointList,
}

/// Face culling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    None,
    Front,
    Back,
}

/// Winding of front-facing triangles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontFace {
    CounterClockwise,
    Clockwise,
}

/// Polygon fill mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonMode {
    Fill,
    Line,
}

/// Color blending of the single color attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// Source replaces destination
    Opaque,
    /// `src * a + dst * (1 - a)`
    AlphaBlend,
}

/// Push constant range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushConstantRange {
    pub stages: Vec<ShaderStage>,
    pub offset: u32,
    pub size: u32,
}

/// Descriptor for creating a graphics pipeline
#[derive(Clone)]
pub struct PipelineDesc {
    /// Debug label
    pub label: String,
    pub vertex_shader: Arc<dyn Shader>,
    pub fragment_shader: Arc<dyn Shader>,
    pub vertex_layout: VertexLayout,
    pub topology: PrimitiveTopology,
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
    pub polygon_mode: PolygonMode,
    pub depth_test: bool,
    pub depth_write: bool,
    pub blend: BlendMode,
    /// One layout per descriptor set, in set order
    pub binding_group_layouts: Vec<BindingGroupLayoutDesc>,
    pub push_constant_ranges: Vec<PushConstantRange>,
    /// Render pass the pipeline must stay compatible with
    pub render_pass: Arc<dyn RenderPass>,
}

/// Graphics pipeline trait (destroyed when dropped)
pub trait Pipeline: Send + Sync {
    /// Number of descriptor sets the pipeline layout declares
    fn binding_group_layout_count(&self) -> u32;
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
