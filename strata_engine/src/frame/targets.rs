/// TargetSet — surface color targets, depth targets and framebuffers
///
/// Built from the surface's current image set and the attachment layouts
/// used by the pipeline set, and rebuilt whenever the surface is. One
/// framebuffer exists per (attachment layout, surface image); depth targets
/// are shared by every framebuffer with the same depth format.

use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use crate::graphics_device::{
    Framebuffer, FramebufferDesc, GraphicsDevice, RenderTarget, Swapchain, TextureFormat,
};
use crate::pipeline::{PipelineSet, TargetAttachments};

pub struct TargetSet {
    width: u32,
    height: u32,
    color_targets: Vec<Arc<dyn RenderTarget>>,
    depth_targets: FxHashMap<TextureFormat, Arc<dyn RenderTarget>>,
    framebuffers: FxHashMap<(TargetAttachments, u32), Arc<dyn Framebuffer>>,
}

impl TargetSet {
    pub fn build(
        device: &dyn GraphicsDevice,
        swapchain: &dyn Swapchain,
        pipelines: &PipelineSet,
    ) -> Result<Self> {
        let (width, height) = (swapchain.width(), swapchain.height());
        let image_count = swapchain.image_count() as u32;

        let color_targets = (0..image_count)
            .map(|image| swapchain.color_target(image))
            .collect::<Result<Vec<_>>>()?;

        let mut depth_targets: FxHashMap<TextureFormat, Arc<dyn RenderTarget>> = FxHashMap::default();
        let mut framebuffers = FxHashMap::default();

        for attachments in pipelines.attachment_layouts() {
            if attachments.color_format != swapchain.format() {
                return Err(Error::InvalidResource(format!(
                    "pipeline color format {:?} does not match surface format {:?}",
                    attachments.color_format,
                    swapchain.format()
                )));
            }
            let depth = match attachments.depth_format {
                Some(format) => {
                    if !depth_targets.contains_key(&format) {
                        let target = device.create_depth_target(width, height, format)?;
                        depth_targets.insert(format, target);
                    }
                    depth_targets.get(&format).cloned()
                }
                None => None,
            };

            let render_pass = &pipelines.render_passes(&attachments)?.clear;
            for (image, color) in color_targets.iter().enumerate() {
                let framebuffer = device.create_framebuffer(&FramebufferDesc {
                    render_pass,
                    color_attachments: vec![color.clone()],
                    depth_attachment: depth.clone(),
                    width,
                    height,
                })?;
                framebuffers.insert((attachments, image as u32), framebuffer);
            }
        }

        Ok(Self { width, height, color_targets, depth_targets, framebuffers })
    }

    /// Framebuffer for `attachments` targeting surface image `image_index`
    pub fn framebuffer(&self, attachments: &TargetAttachments, image_index: u32) -> Result<&dyn Framebuffer> {
        self.framebuffers
            .get(&(*attachments, image_index))
            .map(|fb| fb.as_ref())
            .ok_or_else(|| Error::InvalidResource(format!(
                "no framebuffer for {:?} on surface image {}",
                attachments, image_index
            )))
    }

    pub fn extent(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn image_count(&self) -> usize {
        self.color_targets.len()
    }

    pub fn depth_target_count(&self) -> usize {
        self.depth_targets.len()
    }

    pub fn framebuffer_count(&self) -> usize {
        self.framebuffers.len()
    }
}

#[cfg(test)]
#[path = "targets_tests.rs"]
mod tests;
