/// Buffer - Vulkan implementation of the Buffer trait
///
/// Every buffer lives in host-visible (CpuToGpu) memory and stays mapped,
/// so `update` and `read` are plain copies.

use strata_engine::strata::{Error, Result};
use strata_engine::strata::render::{check_range, Buffer as RenderBuffer};
use strata_engine::engine_error;
use ash::vk;
use gpu_allocator::vulkan::Allocation;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Vulkan buffer implementation
pub struct Buffer {
    /// Shared GPU context (device, allocator)
    ctx: Arc<GpuContext>,
    /// Vulkan buffer
    pub(crate) buffer: vk::Buffer,
    /// GPU memory allocation
    allocation: Option<Allocation>,
    /// Buffer size
    size: u64,
    label: String,
}

impl Buffer {
    pub fn new(
        ctx: Arc<GpuContext>,
        buffer: vk::Buffer,
        allocation: Allocation,
        size: u64,
        label: String,
    ) -> Self {
        Self {
            ctx,
            buffer,
            allocation: Some(allocation),
            size,
            label,
        }
    }

    fn mapped_ptr(&self) -> Result<*mut u8> {
        let allocation = self.allocation.as_ref().ok_or_else(|| {
            engine_error!(self.ctx.ctx, "strata::vulkan", "Buffer '{}' has no GPU allocation", self.label);
            Error::BackendError(format!("buffer '{}' has no allocation", self.label))
        })?;
        allocation
            .mapped_ptr()
            .map(|ptr| ptr.as_ptr() as *mut u8)
            .ok_or_else(|| Error::BackendError(format!("buffer '{}' is not CPU-accessible", self.label)))
    }
}

impl RenderBuffer for Buffer {
    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        check_range(offset, data.len() as u64, self.size)?;
        let mapped_ptr = self.mapped_ptr()?;
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), mapped_ptr.add(offset as usize), data.len());
        }
        Ok(())
    }

    fn read(&self, offset: u64, len: u64) -> Result<Vec<u8>> {
        check_range(offset, len, self.size)?;
        let mapped_ptr = self.mapped_ptr()?;
        let mut out = vec![0u8; len as usize];
        unsafe {
            std::ptr::copy_nonoverlapping(mapped_ptr.add(offset as usize), out.as_mut_ptr(), out.len());
        }
        Ok(out)
    }

    fn size(&self) -> u64 {
        self.size
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if let Some(allocation) = self.allocation.take() {
            self.ctx.free(allocation);
        }
        unsafe {
            self.ctx.device.destroy_buffer(self.buffer, None);
        }
    }
}
