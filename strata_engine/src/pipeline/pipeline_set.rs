/// PipelineSet — the ordered, immutable list of graphics pipelines
///
/// Pipelines are built once at startup and shared read-only by every frame
/// slot. Render passes are cached per attachment layout in three variants
/// (see `PassStart`). They differ only in load operations and layouts, so a
/// pipeline built against the clear variant may be bound inside any of them.

use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::context::EngineContext;
use crate::engine_info;
use crate::error::{Error, Result};
use crate::graphics_device::{
    AttachmentDesc, BlendMode, CullMode, FrontFace, GraphicsDevice, ImageLayout, LoadOp,
    Pipeline, PipelineDesc, PolygonMode, PrimitiveTopology, PushConstantRange, Rect2D,
    RenderPass, RenderPassDesc, ShaderDesc, ShaderStage, StoreOp, TextureFormat, Viewport,
};
use crate::scene::{scene_binding_layout, texture_binding_layout, Mesh, TransformBlock};
use super::shader_loader::ShaderLoader;

/// Attachment layout a pipeline renders into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetAttachments {
    pub color_format: TextureFormat,
    pub depth_format: Option<TextureFormat>,
}

impl TargetAttachments {
    pub fn color_only(color_format: TextureFormat) -> Self {
        Self { color_format, depth_format: None }
    }

    pub fn with_depth(color_format: TextureFormat, depth_format: TextureFormat) -> Self {
        Self { color_format, depth_format: Some(depth_format) }
    }
}

/// Region of the surface a pipeline draws into
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputRegion {
    /// Whole surface
    Full,
    /// Fractions of the surface extent, each in `0.0..=1.0`
    Fraction { x: f32, y: f32, width: f32, height: f32 },
    /// Fixed pixel rectangle, clipped to the surface
    Pixels(Rect2D),
}

impl OutputRegion {
    /// Viewport and scissor for a `width` x `height` surface
    pub fn resolve(&self, width: u32, height: u32) -> (Viewport, Rect2D) {
        let rect = match *self {
            OutputRegion::Full => Rect2D { x: 0, y: 0, width, height },
            OutputRegion::Fraction { x, y, width: w, height: h } => {
                let fx = (x.clamp(0.0, 1.0) * width as f32) as u32;
                let fy = (y.clamp(0.0, 1.0) * height as f32) as u32;
                Rect2D {
                    x: fx as i32,
                    y: fy as i32,
                    width: ((w.clamp(0.0, 1.0) * width as f32) as u32).min(width - fx),
                    height: ((h.clamp(0.0, 1.0) * height as f32) as u32).min(height - fy),
                }
            }
            OutputRegion::Pixels(r) => {
                let x = (r.x.max(0) as u32).min(width);
                let y = (r.y.max(0) as u32).min(height);
                Rect2D {
                    x: x as i32,
                    y: y as i32,
                    width: r.width.min(width - x),
                    height: r.height.min(height - y),
                }
            }
        };
        let viewport = Viewport {
            x: rect.x as f32,
            y: rect.y as f32,
            width: rect.width as f32,
            height: rect.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };
        (viewport, rect)
    }
}

/// Everything needed to build one pipeline
#[derive(Debug, Clone)]
pub struct PipelineSpec {
    pub name: String,
    /// Shader names resolved by the [`ShaderLoader`]
    pub vertex_shader: String,
    pub fragment_shader: String,
    pub attachments: TargetAttachments,
    pub region: OutputRegion,
    pub topology: PrimitiveTopology,
    pub cull_mode: CullMode,
    /// Declares set 1 (object texture)
    pub textured: bool,
    pub blend: BlendMode,
}

impl PipelineSpec {
    pub fn new(
        name: impl Into<String>,
        vertex_shader: impl Into<String>,
        fragment_shader: impl Into<String>,
        attachments: TargetAttachments,
    ) -> Self {
        Self {
            name: name.into(),
            vertex_shader: vertex_shader.into(),
            fragment_shader: fragment_shader.into(),
            attachments,
            region: OutputRegion::Full,
            topology: PrimitiveTopology::TriangleList,
            cull_mode: CullMode::Back,
            textured: false,
            blend: BlendMode::Opaque,
        }
    }

    pub fn with_region(mut self, region: OutputRegion) -> Self {
        self.region = region;
        self
    }

    pub fn with_cull_mode(mut self, cull_mode: CullMode) -> Self {
        self.cull_mode = cull_mode;
        self
    }

    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    pub fn textured(mut self) -> Self {
        self.textured = true;
        self
    }
}

/// What a render pass keeps from the attachments it opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassStart {
    /// First pass of the frame: color and depth are cleared
    Clear,
    /// Color is kept and depth cleared, for a scene's first depth pass
    LoadColor,
    /// Color and depth are kept, for a scene continuing after a pipeline switch
    LoadAll,
}

/// Render pass variants for one attachment layout
///
/// Every variant stores depth so a later pass of the same scene can resume
/// it. Without a depth attachment `load_all` is the same pass as `load_color`.
#[derive(Clone)]
pub struct RenderPassVariants {
    pub clear: Arc<dyn RenderPass>,
    pub load_color: Arc<dyn RenderPass>,
    pub load_all: Arc<dyn RenderPass>,
}

impl RenderPassVariants {
    pub fn get(&self, start: PassStart) -> &Arc<dyn RenderPass> {
        match start {
            PassStart::Clear => &self.clear,
            PassStart::LoadColor => &self.load_color,
            PassStart::LoadAll => &self.load_all,
        }
    }
}

/// A built pipeline and the `PipelineSpec` it was built from
pub struct PipelineEntry {
    pub spec: PipelineSpec,
    pub pipeline: Arc<dyn Pipeline>,
}

pub struct PipelineSet {
    ctx: Arc<EngineContext>,
    entries: Vec<PipelineEntry>,
    render_passes: FxHashMap<TargetAttachments, RenderPassVariants>,
}

impl PipelineSet {
    pub fn new(ctx: Arc<EngineContext>) -> Self {
        Self {
            ctx,
            entries: Vec::new(),
            render_passes: FxHashMap::default(),
        }
    }

    /// Build a pipeline and return its stable index
    ///
    /// Both shaders are loaded before any device object is created, and a
    /// newly created set of render passes is only cached once the pipeline
    /// exists, so a failure leaves the set unchanged.
    pub fn add_pipeline(
        &mut self,
        device: &dyn GraphicsDevice,
        loader: &dyn ShaderLoader,
        spec: PipelineSpec,
    ) -> Result<usize> {
        let vertex_code = loader.load(&spec.vertex_shader)?;
        let fragment_code = loader.load(&spec.fragment_shader)?;

        let cached = self.render_passes.get(&spec.attachments).cloned();
        let variants = match cached {
            Some(variants) => variants,
            None => Self::create_render_passes(device, &spec.attachments)?,
        };

        let vertex_shader = device.create_shader(ShaderDesc {
            code: &vertex_code,
            stage: ShaderStage::Vertex,
            entry_point: "main".to_string(),
        })?;
        let fragment_shader = device.create_shader(ShaderDesc {
            code: &fragment_code,
            stage: ShaderStage::Fragment,
            entry_point: "main".to_string(),
        })?;

        let mut binding_group_layouts = vec![scene_binding_layout()];
        if spec.textured {
            binding_group_layouts.push(texture_binding_layout());
        }
        let has_depth = spec.attachments.depth_format.is_some();

        let pipeline = device.create_pipeline(PipelineDesc {
            label: spec.name.clone(),
            vertex_shader,
            fragment_shader,
            vertex_layout: Mesh::vertex_layout(),
            topology: spec.topology,
            cull_mode: spec.cull_mode,
            front_face: FrontFace::CounterClockwise,
            polygon_mode: PolygonMode::Fill,
            depth_test: has_depth,
            depth_write: has_depth,
            blend: spec.blend,
            binding_group_layouts,
            push_constant_ranges: vec![PushConstantRange {
                stages: vec![ShaderStage::Vertex],
                offset: 0,
                size: std::mem::size_of::<TransformBlock>() as u32,
            }],
            render_pass: variants.clear.clone(),
        })?;

        self.render_passes.entry(spec.attachments).or_insert(variants);
        engine_info!(self.ctx, "strata::PipelineSet", "Pipeline '{}' ready (index {})",
            spec.name, self.entries.len());
        self.entries.push(PipelineEntry { spec, pipeline });
        Ok(self.entries.len() - 1)
    }

    fn create_render_passes(
        device: &dyn GraphicsDevice,
        attachments: &TargetAttachments,
    ) -> Result<RenderPassVariants> {
        let depth = |load_op, initial_layout| {
            attachments.depth_format.map(|format| AttachmentDesc {
                format,
                load_op,
                store_op: StoreOp::Store,
                initial_layout,
                final_layout: ImageLayout::DepthStencilAttachment,
            })
        };
        let color = |load_op, initial_layout| AttachmentDesc {
            format: attachments.color_format,
            load_op,
            store_op: StoreOp::Store,
            initial_layout,
            final_layout: ImageLayout::PresentSrc,
        };

        let clear = device.create_render_pass(&RenderPassDesc {
            color_attachments: vec![color(LoadOp::Clear, ImageLayout::Undefined)],
            depth_attachment: depth(LoadOp::Clear, ImageLayout::Undefined),
        })?;
        let load_color = device.create_render_pass(&RenderPassDesc {
            color_attachments: vec![color(LoadOp::Load, ImageLayout::PresentSrc)],
            depth_attachment: depth(LoadOp::Clear, ImageLayout::Undefined),
        })?;
        let load_all = if attachments.depth_format.is_some() {
            device.create_render_pass(&RenderPassDesc {
                color_attachments: vec![color(LoadOp::Load, ImageLayout::PresentSrc)],
                depth_attachment: depth(LoadOp::Load, ImageLayout::DepthStencilAttachment),
            })?
        } else {
            load_color.clone()
        };
        Ok(RenderPassVariants { clear, load_color, load_all })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&PipelineEntry> {
        self.entries
            .get(index)
            .ok_or_else(|| Error::InvalidResource(format!("no pipeline at index {}", index)))
    }

    pub fn entries(&self) -> &[PipelineEntry] {
        &self.entries
    }

    /// Render pass variants for an attachment layout used by at least one pipeline
    pub fn render_passes(&self, attachments: &TargetAttachments) -> Result<&RenderPassVariants> {
        self.render_passes.get(attachments).ok_or_else(|| {
            Error::InvalidResource(format!("no render pass for attachments {:?}", attachments))
        })
    }

    /// Distinct attachment layouts, in first-use order
    pub fn attachment_layouts(&self) -> Vec<TargetAttachments> {
        let mut layouts: Vec<TargetAttachments> = Vec::new();
        for entry in &self.entries {
            if !layouts.contains(&entry.spec.attachments) {
                layouts.push(entry.spec.attachments);
            }
        }
        layouts
    }
}

#[cfg(test)]
#[path = "pipeline_set_tests.rs"]
mod tests;
