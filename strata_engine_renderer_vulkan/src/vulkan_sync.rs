/// Fence and Semaphore - Vulkan implementations of the sync traits

use strata_engine::strata::{EngineContext, Error, Result};
use strata_engine::strata::render::{Fence as RenderFence, Semaphore as RenderSemaphore};
use strata_engine::{engine_err, engine_error};
use ash::vk;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Vulkan fence (destroyed when dropped)
pub struct Fence {
    pub(crate) fence: vk::Fence,
    ctx: Arc<GpuContext>,
}

impl Fence {
    pub(crate) fn new(ctx: Arc<GpuContext>, signaled: bool) -> Result<Self> {
        let flags = if signaled { vk::FenceCreateFlags::SIGNALED } else { vk::FenceCreateFlags::empty() };
        let info = vk::FenceCreateInfo::default().flags(flags);
        let fence = unsafe { ctx.device.create_fence(&info, None) }
            .map_err(|e| engine_err!(ctx.ctx, "strata::vulkan", "Failed to create fence: {:?}", e))?;
        Ok(Self { fence, ctx })
    }
}

/// Device loss surfaces as `Error::DeviceLost`, like submit and present
fn fence_error(ctx: &EngineContext, action: &str, result: vk::Result) -> Error {
    match result {
        vk::Result::ERROR_DEVICE_LOST => {
            engine_error!(ctx, "strata::vulkan", "Device lost while trying to {} fence", action);
            Error::DeviceLost
        }
        e => engine_err!(ctx, "strata::vulkan", "Failed to {} fence: {:?}", action, e),
    }
}

impl RenderFence for Fence {
    fn wait(&self, timeout_ns: u64) -> Result<()> {
        unsafe { self.ctx.device.wait_for_fences(&[self.fence], true, timeout_ns) }
            .map_err(|e| fence_error(&self.ctx.ctx, "wait for", e))
    }

    fn reset(&self) -> Result<()> {
        unsafe { self.ctx.device.reset_fences(&[self.fence]) }
            .map_err(|e| fence_error(&self.ctx.ctx, "reset", e))
    }

    fn is_signaled(&self) -> Result<bool> {
        unsafe { self.ctx.device.get_fence_status(self.fence) }
            .map_err(|e| fence_error(&self.ctx.ctx, "query", e))
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_fence(self.fence, None);
        }
    }
}

/// Vulkan binary semaphore (destroyed when dropped)
pub struct Semaphore {
    pub(crate) semaphore: vk::Semaphore,
    ctx: Arc<GpuContext>,
}

impl Semaphore {
    pub(crate) fn new(ctx: Arc<GpuContext>) -> Result<Self> {
        let semaphore = unsafe { ctx.device.create_semaphore(&vk::SemaphoreCreateInfo::default(), None) }
            .map_err(|e| engine_err!(ctx.ctx, "strata::vulkan", "Failed to create semaphore: {:?}", e))?;
        Ok(Self { semaphore, ctx })
    }
}

impl RenderSemaphore for Semaphore {}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_semaphore(self.semaphore, None);
        }
    }
}

/// Downcast an engine semaphore to the Vulkan handle
///
/// Every semaphore handed to this backend was created by it.
pub(crate) fn vk_semaphore(semaphore: &dyn RenderSemaphore) -> vk::Semaphore {
    let vk_semaphore = semaphore as *const dyn RenderSemaphore as *const Semaphore;
    unsafe { (*vk_semaphore).semaphore }
}

pub(crate) fn vk_fence(fence: &dyn RenderFence) -> vk::Fence {
    let vk_fence = fence as *const dyn RenderFence as *const Fence;
    unsafe { (*vk_fence).fence }
}

#[cfg(test)]
#[path = "vulkan_sync_tests.rs"]
mod tests;
