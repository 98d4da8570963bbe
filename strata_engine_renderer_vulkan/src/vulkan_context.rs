/// GpuContext - Shared GPU resources for all Vulkan objects
///
/// Contains everything a resource needs after creation:
/// - Device for Vulkan API calls
/// - Allocator for memory management
/// - Queue and command pool for one-shot upload operations
/// - The engine context resources log through

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme, Allocator};
use gpu_allocator::MemoryLocation;
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};
use strata_engine::strata::{EngineContext, Error, Result};
use strata_engine::{engine_err, engine_error};

/// Shared GPU context for all Vulkan resources.
///
/// Shared (via `Arc`) by buffers, textures and the sampler cache so each
/// resource can free itself on drop. Device and instance destruction is
/// handled by `VulkanGraphicsDevice::drop()`.
pub struct GpuContext {
    /// Vulkan logical device
    pub device: ash::Device,

    /// GPU memory allocator
    /// Wrapped in ManuallyDrop so it is dropped BEFORE the device is destroyed
    pub allocator: ManuallyDrop<Arc<Mutex<Allocator>>>,

    /// Graphics queue for command submission
    pub graphics_queue: vk::Queue,

    /// Graphics queue family index
    pub graphics_queue_family: u32,

    /// Guards every submission to `graphics_queue` (external synchronization)
    pub queue_lock: Mutex<()>,

    /// Reusable command pool for one-shot upload operations
    /// (created with TRANSIENT + RESET_COMMAND_BUFFER flags)
    pub upload_command_pool: Mutex<vk::CommandPool>,

    /// Logging/metrics context
    pub ctx: Arc<EngineContext>,
}

impl GpuContext {
    pub fn new(
        device: ash::Device,
        allocator: Arc<Mutex<Allocator>>,
        graphics_queue: vk::Queue,
        graphics_queue_family: u32,
        upload_command_pool: vk::CommandPool,
        ctx: Arc<EngineContext>,
    ) -> Self {
        Self {
            device,
            allocator: ManuallyDrop::new(allocator),
            graphics_queue,
            graphics_queue_family,
            queue_lock: Mutex::new(()),
            upload_command_pool: Mutex::new(upload_command_pool),
            ctx,
        }
    }

    /// Allocate memory for `requirements` at `location`
    pub fn allocate(
        &self,
        name: &str,
        requirements: vk::MemoryRequirements,
        location: MemoryLocation,
        linear: bool,
    ) -> Result<Allocation> {
        let mut allocator = self
            .allocator
            .lock()
            .map_err(|_| engine_err!(self.ctx, "strata::vulkan", "Allocator mutex poisoned"))?;
        allocator
            .allocate(&AllocationCreateDesc {
                name,
                requirements,
                location,
                linear,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
            .map_err(|e| {
                let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                engine_error!(self.ctx, "strata::vulkan",
                    "Out of GPU memory for '{}' ({:.2} MB): {:?}", name, size_mb, e);
                Error::OutOfMemory
            })
    }

    /// Return an allocation to the allocator
    pub fn free(&self, allocation: Allocation) {
        // Don't panic if lock fails - the caller still needs to destroy its handle
        if let Ok(mut allocator) = self.allocator.lock() {
            allocator.free(allocation).ok();
        }
    }

    /// Record and submit a one-shot command buffer, then wait for it to finish
    ///
    /// Used for staging uploads; never called while a frame is being recorded.
    pub fn submit_one_shot<F>(&self, record: F) -> Result<()>
    where
        F: FnOnce(vk::CommandBuffer),
    {
        let pool = self
            .upload_command_pool
            .lock()
            .map_err(|_| engine_err!(self.ctx, "strata::vulkan", "Upload pool mutex poisoned"))?;

        unsafe {
            let allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(*pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);
            let command_buffer = self
                .device
                .allocate_command_buffers(&allocate_info)
                .map_err(|e| engine_err!(self.ctx, "strata::vulkan",
                    "Failed to allocate upload command buffer: {:?}", e))?[0];

            let result = self.run_one_shot(command_buffer, record);
            self.device.free_command_buffers(*pool, &[command_buffer]);
            result
        }
    }

    unsafe fn run_one_shot<F>(&self, command_buffer: vk::CommandBuffer, record: F) -> Result<()>
    where
        F: FnOnce(vk::CommandBuffer),
    {
        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        self.device
            .begin_command_buffer(command_buffer, &begin_info)
            .map_err(|e| engine_err!(self.ctx, "strata::vulkan",
                "Failed to begin upload command buffer: {:?}", e))?;

        record(command_buffer);

        self.device
            .end_command_buffer(command_buffer)
            .map_err(|e| engine_err!(self.ctx, "strata::vulkan",
                "Failed to end upload command buffer: {:?}", e))?;

        let fence = self
            .device
            .create_fence(&vk::FenceCreateInfo::default(), None)
            .map_err(|e| engine_err!(self.ctx, "strata::vulkan", "Failed to create upload fence: {:?}", e))?;

        let command_buffers = [command_buffer];
        let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);
        let submitted = {
            let _queue = self
                .queue_lock
                .lock()
                .map_err(|_| engine_err!(self.ctx, "strata::vulkan", "Queue mutex poisoned"))?;
            self.device.queue_submit(self.graphics_queue, &[submit_info], fence)
        };

        let result = submitted
            .and_then(|_| self.device.wait_for_fences(&[fence], true, u64::MAX))
            .map_err(|e| engine_err!(self.ctx, "strata::vulkan", "Upload submission failed: {:?}", e));
        self.device.destroy_fence(fence, None);
        result
    }
}
