/// Swapchain - Vulkan implementation of the Swapchain trait

use strata_engine::strata::{Result, Error};
use strata_engine::strata::render::{
    Swapchain as RenderSwapchain,
    Semaphore as RenderSemaphore,
    RenderTarget as RenderRenderTarget,
    PresentStatus, TextureFormat,
};
use strata_engine::{engine_debug, engine_error, engine_err, engine_bail, engine_info};
use ash::vk;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::vk_to_texture_format;
use crate::vulkan_render_target::RenderTarget;
use crate::vulkan_sync::vk_semaphore;

/// Vulkan swapchain implementation
///
/// Presents to the surface owned by the device that created it and
/// must be dropped before that device. Image acquisition and
/// presentation use semaphores handed in by the frame scheduler.
pub struct VulkanSwapchain {
    ctx: Arc<GpuContext>,
    physical_device: vk::PhysicalDevice,

    /// Present queue (may be the graphics queue)
    present_queue: vk::Queue,

    /// Surface (owned by the device)
    surface: vk::SurfaceKHR,
    surface_loader: ash::khr::surface::Instance,

    swapchain: vk::SwapchainKHR,
    swapchain_loader: ash::khr::swapchain::Device,
    swapchain_images: Vec<vk::Image>,
    swapchain_image_views: Vec<vk::ImageView>,
    swapchain_format: TextureFormat,
    swapchain_extent: vk::Extent2D,

    /// FIFO when true, MAILBOX (if available) otherwise
    vsync: bool,
}

impl VulkanSwapchain {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        instance: &ash::Instance,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        surface_loader: ash::khr::surface::Instance,
        present_queue: vk::Queue,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> Result<Self> {
        let swapchain_loader = ash::khr::swapchain::Device::new(instance, &ctx.device);

        let mut swapchain = Self {
            ctx,
            physical_device,
            present_queue,
            surface,
            surface_loader,
            swapchain: vk::SwapchainKHR::null(),
            swapchain_loader,
            swapchain_images: Vec::new(),
            swapchain_image_views: Vec::new(),
            swapchain_format: TextureFormat::B8G8R8A8_SRGB,
            swapchain_extent: vk::Extent2D { width, height },
            vsync,
        };
        swapchain.build(width, height)?;

        engine_info!(swapchain.ctx.ctx, "strata::vulkan",
            "Swapchain created: {}x{} {:?}, {} images",
            swapchain.swapchain_extent.width, swapchain.swapchain_extent.height,
            swapchain.swapchain_format, swapchain.swapchain_images.len());
        Ok(swapchain)
    }

    /// Create the swapchain, retiring the current one if present
    fn build(&mut self, width: u32, height: u32) -> Result<()> {
        let ctx = Arc::clone(&self.ctx);
        unsafe {
            let capabilities = self.surface_loader
                .get_physical_device_surface_capabilities(self.physical_device, self.surface)
                .map_err(|e| {
                    engine_error!(ctx.ctx, "strata::vulkan", "Failed to get surface capabilities: {:?}", e);
                    Error::InitializationFailed(format!("Failed to get surface capabilities: {:?}", e))
                })?;

            let surface_formats = self.surface_loader
                .get_physical_device_surface_formats(self.physical_device, self.surface)
                .map_err(|e| {
                    engine_error!(ctx.ctx, "strata::vulkan", "Failed to query surface formats: {:?}", e);
                    Error::InitializationFailed(format!("Failed to get surface formats: {:?}", e))
                })?;

            let (surface_format, format) = surface_formats
                .iter()
                .find(|f| f.format == vk::Format::B8G8R8A8_SRGB || f.format == vk::Format::R8G8B8A8_SRGB)
                .or_else(|| surface_formats.iter().find(|f| vk_to_texture_format(f.format).is_some()))
                .and_then(|f| vk_to_texture_format(f.format).map(|format| (*f, format)))
                .ok_or_else(|| {
                    engine_error!(ctx.ctx, "strata::vulkan", "No supported surface format");
                    Error::InitializationFailed("No supported surface format".to_string())
                })?;

            let present_modes = self.surface_loader
                .get_physical_device_surface_present_modes(self.physical_device, self.surface)
                .map_err(|e| engine_err!(ctx.ctx, "strata::vulkan", "Failed to query present modes: {:?}", e))?;
            let present_mode = if !self.vsync && present_modes.contains(&vk::PresentModeKHR::MAILBOX) {
                vk::PresentModeKHR::MAILBOX
            } else {
                vk::PresentModeKHR::FIFO
            };

            // u32::MAX means the surface size follows the swapchain
            let extent = if capabilities.current_extent.width != u32::MAX {
                capabilities.current_extent
            } else {
                vk::Extent2D {
                    width: width.clamp(capabilities.min_image_extent.width, capabilities.max_image_extent.width),
                    height: height.clamp(capabilities.min_image_extent.height, capabilities.max_image_extent.height),
                }
            };

            let mut image_count = capabilities.min_image_count + 1;
            if capabilities.max_image_count > 0 {
                image_count = image_count.min(capabilities.max_image_count);
            }

            let old_swapchain = self.swapchain;
            let create_info = vk::SwapchainCreateInfoKHR::default()
                .surface(self.surface)
                .min_image_count(image_count)
                .image_format(surface_format.format)
                .image_color_space(surface_format.color_space)
                .image_extent(extent)
                .image_array_layers(1)
                .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
                .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
                .pre_transform(capabilities.current_transform)
                .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                .present_mode(present_mode)
                .clipped(true)
                .old_swapchain(old_swapchain);

            let swapchain = self.swapchain_loader
                .create_swapchain(&create_info, None)
                .map_err(|e| {
                    engine_error!(ctx.ctx, "strata::vulkan", "Failed to create swapchain: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create swapchain: {:?}", e))
                })?;

            self.destroy_views();
            if old_swapchain != vk::SwapchainKHR::null() {
                self.swapchain_loader.destroy_swapchain(old_swapchain, None);
            }
            self.swapchain = swapchain;

            self.swapchain_images = self.swapchain_loader
                .get_swapchain_images(swapchain)
                .map_err(|e| {
                    engine_error!(ctx.ctx, "strata::vulkan", "Failed to get swapchain images: {:?}", e);
                    Error::InitializationFailed(format!("Failed to get swapchain images: {:?}", e))
                })?;

            for &image in &self.swapchain_images {
                let view_info = vk::ImageViewCreateInfo::default()
                    .image(image)
                    .view_type(vk::ImageViewType::TYPE_2D)
                    .format(surface_format.format)
                    .components(vk::ComponentMapping::default())
                    .subresource_range(vk::ImageSubresourceRange {
                        aspect_mask: vk::ImageAspectFlags::COLOR,
                        base_mip_level: 0,
                        level_count: 1,
                        base_array_layer: 0,
                        layer_count: 1,
                    });
                let view = ctx.device.create_image_view(&view_info, None)
                    .map_err(|e| {
                        engine_error!(ctx.ctx, "strata::vulkan", "Failed to create swapchain image view: {:?}", e);
                        Error::InitializationFailed(format!("Failed to create image view: {:?}", e))
                    })?;
                self.swapchain_image_views.push(view);
            }

            self.swapchain_format = format;
            self.swapchain_extent = extent;
        }
        Ok(())
    }

    fn destroy_views(&mut self) {
        for view in self.swapchain_image_views.drain(..) {
            unsafe { self.ctx.device.destroy_image_view(view, None); }
        }
    }
}

impl RenderSwapchain for VulkanSwapchain {
    fn acquire_next_image(&mut self, signal: &dyn RenderSemaphore) -> Result<u32> {
        let semaphore = vk_semaphore(signal);
        let acquired = unsafe {
            self.swapchain_loader.acquire_next_image(
                self.swapchain,
                u64::MAX,
                semaphore,
                vk::Fence::null(),
            )
        };

        match acquired {
            Ok((image_index, suboptimal)) => {
                if suboptimal {
                    engine_debug!(self.ctx.ctx, "strata::vulkan", "Acquired image {} from suboptimal swapchain", image_index);
                }
                Ok(image_index)
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Err(Error::SurfaceOutOfDate),
            Err(vk::Result::ERROR_DEVICE_LOST) => Err(Error::DeviceLost),
            Err(e) => Err(engine_err!(self.ctx.ctx, "strata::vulkan",
                "Failed to acquire next swapchain image: {:?}", e)),
        }
    }

    fn present(&mut self, image_index: u32, wait: &dyn RenderSemaphore) -> Result<PresentStatus> {
        if image_index as usize >= self.swapchain_images.len() {
            engine_bail!(self.ctx.ctx, "strata::vulkan",
                "present: image_index {} out of range (count: {})",
                image_index, self.swapchain_images.len());
        }

        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let wait_semaphores = [vk_semaphore(wait)];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let presented = {
            let _queue = self.ctx.queue_lock.lock()
                .map_err(|_| engine_err!(self.ctx.ctx, "strata::vulkan", "Queue mutex poisoned"))?;
            unsafe { self.swapchain_loader.queue_present(self.present_queue, &present_info) }
        };

        match presented {
            Ok(false) => Ok(PresentStatus::Optimal),
            Ok(true) | Err(vk::Result::SUBOPTIMAL_KHR) => Ok(PresentStatus::Suboptimal),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Err(Error::SurfaceOutOfDate),
            Err(vk::Result::ERROR_DEVICE_LOST) => Err(Error::DeviceLost),
            Err(e) => Err(engine_err!(self.ctx.ctx, "strata::vulkan", "Failed to present: {:?}", e)),
        }
    }

    fn recreate(&mut self, width: u32, height: u32) -> Result<()> {
        unsafe {
            self.ctx.device.device_wait_idle()
                .map_err(|e| engine_err!(self.ctx.ctx, "strata::vulkan",
                    "Failed to wait idle before swapchain rebuild: {:?}", e))?;
        }
        self.build(width, height)?;
        engine_info!(self.ctx.ctx, "strata::vulkan", "Swapchain rebuilt: {}x{}",
            self.swapchain_extent.width, self.swapchain_extent.height);
        Ok(())
    }

    fn image_count(&self) -> usize {
        self.swapchain_images.len()
    }

    fn width(&self) -> u32 {
        self.swapchain_extent.width
    }

    fn height(&self) -> u32 {
        self.swapchain_extent.height
    }

    fn format(&self) -> TextureFormat {
        self.swapchain_format
    }

    fn color_target(&self, image_index: u32) -> Result<Arc<dyn RenderRenderTarget>> {
        let view = self.swapchain_image_views
            .get(image_index as usize)
            .copied()
            .ok_or_else(|| Error::InvalidResource(format!(
                "Swapchain image {} out of range (count: {})",
                image_index, self.swapchain_image_views.len()
            )))?;

        Ok(Arc::new(RenderTarget::new_surface_target(
            self.swapchain_extent.width,
            self.swapchain_extent.height,
            self.swapchain_format,
            view,
        )))
    }
}

impl Drop for VulkanSwapchain {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.device_wait_idle().ok();
        }
        self.destroy_views();
        unsafe {
            self.swapchain_loader.destroy_swapchain(self.swapchain, None);
        }
    }
}
