/// RenderTarget - Vulkan implementation of the RenderTarget trait

use strata_engine::strata::render::{RenderTarget as RenderRenderTarget, TextureFormat};
use ash::vk;
use gpu_allocator::vulkan::Allocation;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Image behind a render target
enum TargetImage {
    /// Surface image; the swapchain owns image and view
    Surface,
    /// Engine-owned attachment (depth); destroyed with the target
    Owned {
        ctx: Arc<GpuContext>,
        image: vk::Image,
        allocation: Option<Allocation>,
    },
}

/// Vulkan render target implementation
pub struct RenderTarget {
    width: u32,
    height: u32,
    format: TextureFormat,
    /// Vulkan image view
    pub(crate) image_view: vk::ImageView,
    image: TargetImage,
}

impl RenderTarget {
    /// Wrap a swapchain image view (not owned)
    pub(crate) fn new_surface_target(
        width: u32,
        height: u32,
        format: TextureFormat,
        image_view: vk::ImageView,
    ) -> Self {
        Self { width, height, format, image_view, image: TargetImage::Surface }
    }

    /// Take ownership of an attachment image, its view and its memory
    pub(crate) fn new_owned_target(
        ctx: Arc<GpuContext>,
        width: u32,
        height: u32,
        format: TextureFormat,
        image: vk::Image,
        image_view: vk::ImageView,
        allocation: Allocation,
    ) -> Self {
        Self {
            width,
            height,
            format,
            image_view,
            image: TargetImage::Owned { ctx, image, allocation: Some(allocation) },
        }
    }
}

impl RenderRenderTarget for RenderTarget {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn format(&self) -> TextureFormat {
        self.format
    }
}

impl Drop for RenderTarget {
    fn drop(&mut self) {
        if let TargetImage::Owned { ctx, image, allocation } = &mut self.image {
            unsafe {
                ctx.device.destroy_image_view(self.image_view, None);
                if let Some(allocation) = allocation.take() {
                    ctx.free(allocation);
                }
                ctx.device.destroy_image(*image, None);
            }
        }
    }
}
