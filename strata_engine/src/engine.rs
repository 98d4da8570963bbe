/// Engine — owns the device collaborators and drives one frame per call
///
/// The engine is an explicit value: no global state. Everything that logs
/// receives the same `Arc<EngineContext>`.
///
/// # Example
///
/// ```no_run
/// # use std::sync::Arc;
/// # use strata_engine::strata::{Engine, EngineConfig, EngineContext};
/// # use strata_engine::strata::render::{GraphicsDevice, Swapchain};
/// # fn run(device: Arc<dyn GraphicsDevice>, swapchain: Box<dyn Swapchain>) -> strata_engine::strata::Result<()> {
/// let ctx = EngineContext::with_default_logger();
/// let mut engine = Engine::new(ctx, EngineConfig::default(), device, swapchain)?;
/// let _world = engine.create_scene("world")?;
/// engine.draw_frame()?;
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;
use glam::Vec4;
use crate::config::EngineConfig;
use crate::context::{EngineContext, RendererStats};
use crate::error::{Error, Result};
use crate::frame::{
    CommandRecorder, DynamicBlockLayout, DynamicBlockPacker, FrameOutcome, FrameScheduler, TargetSet,
};
use crate::graphics_device::{
    GraphicsDevice, SamplerType, Swapchain, TextureDesc, TextureFormat,
};
use crate::overlay::OverlayRenderer;
use crate::pipeline::{PipelineSet, PipelineSpec, ShaderLoader, TargetAttachments};
use crate::scene::{
    ObjectDesc, PanelId, PanelRect, Scene, SceneKey, SceneRegistry, TransformBlock, UiScene,
};
use crate::{engine_debug, engine_error, engine_info, engine_warn};

pub struct Engine {
    ctx: Arc<EngineContext>,
    config: EngineConfig,
    scheduler: FrameScheduler,
    overlay: Option<Box<dyn OverlayRenderer>>,
    targets: Option<TargetSet>,
    scenes: SceneRegistry,
    pipelines: PipelineSet,
    packer: DynamicBlockPacker,
    layout: DynamicBlockLayout,
    swapchain: Box<dyn Swapchain>,
    device: Arc<dyn GraphicsDevice>,
    surface_stale: bool,
    pending_extent: Option<(u32, u32)>,
}

impl Engine {
    /// Validate `config`, plan the dynamic block layout and create the frame slots
    pub fn new(
        ctx: Arc<EngineContext>,
        config: EngineConfig,
        device: Arc<dyn GraphicsDevice>,
        swapchain: Box<dyn Swapchain>,
    ) -> Result<Self> {
        config.validate()?;
        ctx.set_min_severity(config.min_log_severity);

        let alignment = device.min_uniform_buffer_offset_alignment();
        let layout = DynamicBlockLayout::plan(
            alignment,
            std::mem::size_of::<TransformBlock>() as u64,
            config.max_objects_per_scene,
        )
        .map_err(|e| {
            engine_error!(ctx, "strata::Engine", "Cannot plan dynamic blocks: {}", e);
            e
        })?;
        engine_info!(ctx, "strata::Engine",
            "Dynamic blocks: alignment {} stride {} capacity {} ({} bytes per scene slot)",
            alignment, layout.stride(), layout.capacity(), layout.buffer_size());

        let scheduler = FrameScheduler::new(ctx.clone(), device.as_ref(), config.frames_in_flight)?;

        Ok(Self {
            pipelines: PipelineSet::new(ctx.clone()),
            ctx,
            config,
            scheduler,
            overlay: None,
            targets: None,
            scenes: SceneRegistry::new(),
            packer: DynamicBlockPacker::new(layout),
            layout,
            swapchain,
            device,
            surface_stale: false,
            pending_extent: None,
        })
    }

    // ===== PIPELINES =====

    /// Attachment layout of the surface, with an optional depth attachment
    pub fn surface_attachments(&self, depth_format: Option<TextureFormat>) -> TargetAttachments {
        TargetAttachments { color_format: self.swapchain.format(), depth_format }
    }

    /// Build a pipeline; returns its index
    pub fn add_pipeline(&mut self, loader: &dyn ShaderLoader, spec: PipelineSpec) -> Result<usize> {
        let name = spec.name.clone();
        let index = self
            .pipelines
            .add_pipeline(self.device.as_ref(), loader, spec)
            .map_err(|e| {
                engine_error!(self.ctx, "strata::Engine", "Pipeline '{}' failed: {}", name, e);
                e
            })?;
        // Framebuffers are keyed by attachment layout; a new layout needs new ones.
        // The old ones may still be bound by in-flight frames.
        if self.targets.is_some() {
            self.scheduler.drain()?;
            self.targets = None;
        }
        Ok(index)
    }

    pub fn pipelines(&self) -> &PipelineSet {
        &self.pipelines
    }

    // ===== SCENES =====

    /// Register an empty scene after every existing one
    pub fn create_scene(&mut self, name: &str) -> Result<SceneKey> {
        let scene = Scene::new(self.device.as_ref(), name, self.layout, self.config.frames_in_flight)?;
        engine_debug!(self.ctx, "strata::Engine", "Scene '{}' created", name);
        Ok(self.scenes.add_scene(scene))
    }

    /// Register an empty UI scene after every existing one
    pub fn create_ui_scene(&mut self, name: &str) -> Result<SceneKey> {
        let ui = UiScene::new(self.device.as_ref(), name, self.layout, self.config.frames_in_flight)?;
        engine_debug!(self.ctx, "strata::Engine", "UI scene '{}' created", name);
        Ok(self.scenes.add_ui_scene(ui))
    }

    /// Tear down a scene once no in-flight frame can read it
    pub fn remove_scene(&mut self, key: SceneKey) -> Result<()> {
        self.scheduler.drain()?;
        self.scenes
            .remove_scene(key)
            .map(|_| ())
            .ok_or_else(|| Error::InvalidResource("unknown scene".to_string()))
    }

    pub fn scene(&self, key: SceneKey) -> Option<&Scene> {
        self.scenes.get(key)
    }

    pub fn scene_mut(&mut self, key: SceneKey) -> Option<&mut Scene> {
        self.scenes.scene_mut(key)
    }

    pub fn scenes(&self) -> &SceneRegistry {
        &self.scenes
    }

    /// Append an object to a scene; returns its position
    pub fn add_object(&mut self, key: SceneKey, desc: ObjectDesc) -> Result<usize> {
        self.check_pipeline(desc.pipeline)?;
        let spec = &self.pipelines.get(desc.pipeline)?.spec;
        if spec.textured && desc.texture.is_none() {
            return Err(Error::InvalidResource(format!(
                "object '{}' uses textured pipeline '{}' without a texture set",
                desc.label, spec.name
            )));
        }
        let device = self.device.clone();
        let scene = self.world_scene_mut(key)?;
        scene.add_object(device.as_ref(), desc)
    }

    pub fn set_visible(&mut self, key: SceneKey, position: usize, visible: bool) -> Result<()> {
        self.world_scene_mut(key)?.set_visible(position, visible)
    }

    /// Create a sampled texture from decoded RGBA pixels and register it with a scene
    pub fn add_texture(
        &mut self,
        key: SceneKey,
        desc: TextureDesc,
        sampler: SamplerType,
    ) -> Result<usize> {
        let texture = self.device.create_texture(desc)?;
        let device = self.device.clone();
        self.world_scene_mut(key)?.add_texture(device.as_ref(), texture, sampler)
    }

    pub fn add_panel(&mut self, key: SceneKey, rect: PanelRect, color: Vec4, pipeline: usize) -> Result<PanelId> {
        self.check_pipeline(pipeline)?;
        let device = self.device.clone();
        self.ui_scene_mut(key)?.add_panel(device.as_ref(), rect, color, pipeline)
    }

    pub fn set_panel_visible(&mut self, key: SceneKey, panel: PanelId, visible: bool) -> Result<()> {
        self.ui_scene_mut(key)?.set_panel_visible(panel, visible)
    }

    fn world_scene_mut(&mut self, key: SceneKey) -> Result<&mut Scene> {
        self.scenes
            .scene_mut(key)
            .ok_or_else(|| Error::InvalidResource("unknown scene (or a UI scene)".to_string()))
    }

    fn ui_scene_mut(&mut self, key: SceneKey) -> Result<&mut UiScene> {
        self.scenes
            .ui_mut(key)
            .ok_or_else(|| Error::InvalidResource("unknown UI scene".to_string()))
    }

    fn check_pipeline(&self, pipeline: usize) -> Result<()> {
        if pipeline >= self.pipelines.len() {
            return Err(Error::InvalidResource(format!(
                "pipeline index {} out of range ({} pipelines)",
                pipeline,
                self.pipelines.len()
            )));
        }
        Ok(())
    }

    // ===== FRAME =====

    /// Draw the overlay inside the first scene's pass from now on
    pub fn set_overlay(&mut self, overlay: Box<dyn OverlayRenderer>) {
        self.overlay = Some(overlay);
    }

    /// Request a surface rebuild at the next frame boundary
    pub fn resize(&mut self, width: u32, height: u32) {
        self.pending_extent = Some((width, height));
        self.surface_stale = true;
    }

    /// Run one frame
    ///
    /// A stale surface is rebuilt first; a zero-sized (minimized) surface
    /// skips the frame and reports `NeedsRebuild`.
    pub fn draw_frame(&mut self) -> Result<FrameOutcome> {
        if self.surface_stale && !self.rebuild_surface()? {
            return Ok(FrameOutcome::NeedsRebuild);
        }
        if self.targets.is_none() {
            self.rebuild_targets()?;
        }

        let Self { scheduler, device, swapchain, packer, scenes, pipelines, targets, overlay, config, .. } = self;
        let targets = targets
            .as_ref()
            .ok_or_else(|| Error::InvalidResource("render targets missing".to_string()))?;

        let outcome = scheduler.render_frame(device.as_ref(), swapchain.as_mut(), |slot, image_index| {
            for (_, scene) in scenes.iter() {
                packer.pack(scene, slot.index())?;
            }
            let overlay = overlay.as_mut().map(|o| &mut **o as &mut dyn OverlayRenderer);
            CommandRecorder::new(pipelines, scenes, targets, config.clear_color)
                .record(slot, image_index, overlay)
        });
        if let Some(image_index) = self.scheduler.take_orphaned_image() {
            engine_warn!(self.ctx, "strata::Engine",
                "Surface image {} was acquired but never presented; rebuilding the surface", image_index);
            self.surface_stale = true;
        }
        let outcome = outcome?;

        match outcome {
            FrameOutcome::NeedsRebuild | FrameOutcome::Presented { suboptimal: true, .. } => {
                self.surface_stale = true;
            }
            FrameOutcome::Presented { .. } => {}
        }
        Ok(outcome)
    }

    /// Recreate the surface images; false if the surface has no area
    fn rebuild_surface(&mut self) -> Result<bool> {
        let (width, height) = self
            .pending_extent
            .unwrap_or((self.swapchain.width(), self.swapchain.height()));
        if width == 0 || height == 0 {
            return Ok(false);
        }

        self.scheduler.drain()?;
        self.device.wait_idle()?;
        self.targets = None;
        self.swapchain.recreate(width, height)?;
        self.rebuild_targets()?;

        self.surface_stale = false;
        self.pending_extent = None;
        self.ctx.record_surface_rebuild();
        engine_info!(self.ctx, "strata::Engine", "Surface rebuilt at {}x{}", width, height);
        Ok(true)
    }

    fn rebuild_targets(&mut self) -> Result<()> {
        // Old framebuffers may still be referenced by in-flight frames
        self.scheduler.drain()?;
        self.targets = None;
        let targets = TargetSet::build(self.device.as_ref(), self.swapchain.as_ref(), &self.pipelines)?;
        engine_debug!(self.ctx, "strata::Engine", "{} framebuffers over {} surface images",
            targets.framebuffer_count(), targets.image_count());
        self.targets = Some(targets);
        Ok(())
    }

    // ===== ACCESSORS =====

    pub fn context(&self) -> &Arc<EngineContext> {
        &self.ctx
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn device(&self) -> &Arc<dyn GraphicsDevice> {
        &self.device
    }

    pub fn layout(&self) -> &DynamicBlockLayout {
        &self.layout
    }

    pub fn frame_counter(&self) -> u64 {
        self.scheduler.frame_counter()
    }

    pub fn stats(&self) -> RendererStats {
        self.ctx.stats()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if let Err(e) = self.scheduler.drain() {
            engine_warn!(self.ctx, "strata::Engine", "Drain on shutdown failed: {}", e);
        }
        if let Err(e) = self.device.wait_idle() {
            engine_warn!(self.ctx, "strata::Engine", "wait_idle on shutdown failed: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
