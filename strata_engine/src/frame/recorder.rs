/// CommandRecorder — records one frame's draws into a frame slot
///
/// Traversal order is fixed: scenes in registry order, then objects in
/// position order. Consecutive visible objects whose pipelines share an
/// attachment layout are drawn inside one render pass. The first pass of
/// the frame clears the surface; every later pass loads it. Depth is cleared
/// by a scene's first pass over it and kept by that scene's later passes.

use crate::error::{Error, Result};
use crate::graphics_device::{ClearValue, CommandList, IndexType, Rect2D, ShaderStage, TextureFormat};
use crate::overlay::OverlayRenderer;
use crate::pipeline::{PassStart, PipelineSet, TargetAttachments};
use crate::scene::{SceneRegistry, SCENE_SET, TEXTURE_SET};
use super::scheduler::{FrameSlot, SlotPhase};
use super::targets::TargetSet;

/// Counters for one recorded frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draw_calls: u32,
    pub triangles: u64,
    pub render_passes: u32,
    pub hidden_skipped: u32,
}

pub struct CommandRecorder<'a> {
    pub pipelines: &'a PipelineSet,
    pub scenes: &'a SceneRegistry,
    pub targets: &'a TargetSet,
    pub clear_color: [f32; 4],
}

/// Render pass currently begun on the command list
struct OpenPass {
    attachments: TargetAttachments,
    start: PassStart,
}

/// Picks the render pass variant for each pass of one scene
struct PassPlanner {
    first_of_frame: bool,
    /// Depth formats already cleared by the current scene
    scene_depth: Vec<TextureFormat>,
}

impl PassPlanner {
    fn new() -> Self {
        Self { first_of_frame: true, scene_depth: Vec::new() }
    }

    fn next_scene(&mut self) {
        self.scene_depth.clear();
    }

    fn start(&mut self, attachments: &TargetAttachments) -> PassStart {
        let depth_kept = match attachments.depth_format {
            Some(format) if self.scene_depth.contains(&format) => true,
            Some(format) => {
                self.scene_depth.push(format);
                false
            }
            None => false,
        };
        if std::mem::replace(&mut self.first_of_frame, false) {
            PassStart::Clear
        } else if depth_kept {
            PassStart::LoadAll
        } else {
            PassStart::LoadColor
        }
    }
}

impl<'a> CommandRecorder<'a> {
    pub fn new(
        pipelines: &'a PipelineSet,
        scenes: &'a SceneRegistry,
        targets: &'a TargetSet,
        clear_color: [f32; 4],
    ) -> Self {
        Self { pipelines, scenes, targets, clear_color }
    }

    /// Record the frame for surface image `image_index` into `slot`
    ///
    /// # Errors
    ///
    /// `FenceNotWaited` if the slot's fence was not waited on and reset
    /// first. Any command recording failure is fatal for the frame.
    pub fn record(
        &self,
        slot: &mut FrameSlot,
        image_index: u32,
        mut overlay: Option<&mut dyn OverlayRenderer>,
    ) -> Result<FrameStats> {
        if slot.phase() != SlotPhase::Recording {
            return Err(Error::FenceNotWaited { slot: slot.index() });
        }
        let slot_index = slot.index();
        let cmd = slot.command_list_mut();
        let mut stats = FrameStats::default();
        let mut planner = PassPlanner::new();

        cmd.begin()?;

        for (scene_index, (_, scene)) in self.scenes.iter().enumerate() {
            let resources = scene.frame_resources(slot_index)?;
            let mut open: Option<OpenPass> = None;
            let mut bound_pipeline: Option<usize> = None;
            planner.next_scene();

            for (position, object) in scene.objects().iter().enumerate() {
                if !object.is_visible() {
                    stats.hidden_skipped += 1;
                    continue;
                }
                let entry = self.pipelines.get(object.pipeline())?;
                let attachments = entry.spec.attachments;

                if open.as_ref().map(|p| p.attachments) != Some(attachments) {
                    if open.is_some() {
                        cmd.end_render_pass()?;
                    }
                    let start = planner.start(&attachments);
                    open = Some(self.begin_pass(cmd, attachments, image_index, start)?);
                    stats.render_passes += 1;
                    bound_pipeline = None;
                }

                let pipeline = entry.pipeline.as_ref();
                if bound_pipeline != Some(object.pipeline()) {
                    cmd.bind_pipeline(pipeline)?;
                    let (width, height) = self.targets.extent();
                    let (viewport, scissor) = entry.spec.region.resolve(width, height);
                    cmd.set_viewport(viewport)?;
                    cmd.set_scissor(scissor)?;
                    bound_pipeline = Some(object.pipeline());
                }

                cmd.bind_vertex_buffer(object.vertex_buffer(), 0)?;
                cmd.bind_index_buffer(object.index_buffer(), 0, IndexType::U32)?;
                cmd.push_constants(&[ShaderStage::Vertex], 0, bytemuck::bytes_of(object.transform()))?;

                let dynamic_offset = scene.layout().dynamic_offset(position)?;
                cmd.bind_binding_group(pipeline, SCENE_SET, resources.binding_group.as_ref(), &[dynamic_offset])?;

                if entry.spec.textured {
                    let texture = object
                        .texture()
                        .and_then(|t| scene.texture_sets().get(t))
                        .ok_or_else(|| Error::InvalidResource(format!(
                            "object '{}' uses textured pipeline '{}' without a texture set",
                            object.label(), entry.spec.name
                        )))?;
                    cmd.bind_binding_group(pipeline, TEXTURE_SET, texture.binding_group.as_ref(), &[])?;
                }

                cmd.draw_indexed(object.index_count(), 0, 0)?;
                stats.draw_calls += 1;
                stats.triangles += object.triangle_count();
            }

            if scene_index == 0 {
                if let Some(overlay) = overlay.as_deref_mut() {
                    if open.is_none() {
                        let attachments = self.default_attachments()?;
                        let start = planner.start(&attachments);
                        open = Some(self.begin_pass(cmd, attachments, image_index, start)?);
                        stats.render_passes += 1;
                    }
                    if let Some(pass) = &open {
                        let render_pass = self.pipelines.render_passes(&pass.attachments)?.get(pass.start);
                        overlay.draw(cmd, render_pass.as_ref(), self.targets.extent())?;
                    }
                }
            }

            if open.is_some() {
                cmd.end_render_pass()?;
            }
        }

        // Nothing drawn: still clear the image and leave it presentable
        if planner.first_of_frame {
            let attachments = self.default_attachments()?;
            self.begin_pass(cmd, attachments, image_index, PassStart::Clear)?;
            cmd.end_render_pass()?;
            stats.render_passes += 1;
        }

        cmd.end()?;
        Ok(stats)
    }

    fn begin_pass(
        &self,
        cmd: &mut dyn CommandList,
        attachments: TargetAttachments,
        image_index: u32,
        start: PassStart,
    ) -> Result<OpenPass> {
        let render_pass = self.pipelines.render_passes(&attachments)?.get(start);
        let framebuffer = self.targets.framebuffer(&attachments, image_index)?;
        let (width, height) = self.targets.extent();

        let mut clear_values = vec![ClearValue::Color(self.clear_color)];
        if attachments.depth_format.is_some() {
            clear_values.push(ClearValue::DepthStencil { depth: 1.0, stencil: 0 });
        }
        cmd.begin_render_pass(
            render_pass.as_ref(),
            framebuffer,
            Rect2D { x: 0, y: 0, width, height },
            &clear_values,
        )?;
        Ok(OpenPass { attachments, start })
    }

    /// Attachment layout of pipeline 0, used for passes with no object draws
    fn default_attachments(&self) -> Result<TargetAttachments> {
        self.pipelines
            .entries()
            .first()
            .map(|entry| entry.spec.attachments)
            .ok_or_else(|| Error::InvalidResource("no pipeline to derive a render pass from".to_string()))
    }
}

#[cfg(test)]
#[path = "recorder_tests.rs"]
mod tests;
