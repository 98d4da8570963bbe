/// SamplerCache - internal VkSampler management for the Vulkan backend
///
/// Creates samplers on first use. The engine knows three sampler
/// configurations, so the cache never holds more than three handles.

use strata_engine::strata::Result;
use strata_engine::strata::render::SamplerType;
use strata_engine::engine_err;
use crate::vulkan_context::GpuContext;
use ash::vk;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Creates VkSamplers on first use, destroys them on shutdown/drop
pub(crate) struct SamplerCache {
    ctx: Option<Arc<GpuContext>>,
    cache: FxHashMap<SamplerType, vk::Sampler>,
}

impl SamplerCache {
    pub(crate) fn new(ctx: Arc<GpuContext>) -> Self {
        Self {
            ctx: Some(ctx),
            cache: FxHashMap::default(),
        }
    }

    /// Get or create the VkSampler for `sampler_type`
    pub(crate) fn get(&mut self, sampler_type: SamplerType) -> Result<vk::Sampler> {
        if let Some(&sampler) = self.cache.get(&sampler_type) {
            return Ok(sampler);
        }

        let Some(ctx) = self.ctx.as_ref() else {
            return Err(strata_engine::strata::Error::InvalidResource(
                "Sampler requested after device shutdown".to_string(),
            ));
        };
        let sampler = Self::create_vk_sampler(ctx, sampler_type)?;
        self.cache.insert(sampler_type, sampler);
        Ok(sampler)
    }

    /// Destroy every cached sampler and release the GpuContext.
    /// Called from VulkanGraphicsDevice::drop() while the device is alive.
    pub(crate) fn shutdown(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            for (_, sampler) in self.cache.drain() {
                unsafe { ctx.device.destroy_sampler(sampler, None); }
            }
        }
    }

    fn create_vk_sampler(ctx: &GpuContext, sampler_type: SamplerType) -> Result<vk::Sampler> {
        let (filter, mipmap, address) = match sampler_type {
            SamplerType::LinearRepeat => (
                vk::Filter::LINEAR,
                vk::SamplerMipmapMode::LINEAR,
                vk::SamplerAddressMode::REPEAT,
            ),
            SamplerType::LinearClamp => (
                vk::Filter::LINEAR,
                vk::SamplerMipmapMode::LINEAR,
                vk::SamplerAddressMode::CLAMP_TO_EDGE,
            ),
            SamplerType::NearestClamp => (
                vk::Filter::NEAREST,
                vk::SamplerMipmapMode::NEAREST,
                vk::SamplerAddressMode::CLAMP_TO_EDGE,
            ),
        };

        let create_info = vk::SamplerCreateInfo::default()
            .mag_filter(filter)
            .min_filter(filter)
            .mipmap_mode(mipmap)
            .address_mode_u(address)
            .address_mode_v(address)
            .address_mode_w(address)
            .mip_lod_bias(0.0)
            .min_lod(0.0)
            .max_lod(vk::LOD_CLAMP_NONE)
            .border_color(vk::BorderColor::FLOAT_OPAQUE_BLACK)
            .compare_enable(false)
            .compare_op(vk::CompareOp::ALWAYS)
            .anisotropy_enable(false)
            .max_anisotropy(1.0)
            .unnormalized_coordinates(false);

        unsafe { ctx.device.create_sampler(&create_info, None) }
            .map_err(|e| engine_err!(ctx.ctx, "strata::vulkan",
                "Failed to create sampler {:?}: {:?}", sampler_type, e))
    }
}

impl Drop for SamplerCache {
    fn drop(&mut self) {
        self.shutdown();
    }
}
