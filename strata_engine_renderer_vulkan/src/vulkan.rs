/// VulkanGraphicsDevice - Vulkan implementation of the GraphicsDevice trait

use strata_engine::strata::{EngineConfig, EngineContext, Result, Error};
use strata_engine::strata::render::{
    GraphicsDevice, Submission,
    Buffer as RenderBuffer, BufferDesc, BufferUsage,
    Texture as RenderTexture, TextureDesc, TextureInfo, TextureFormat, TextureUsage,
    Shader as RenderShader, ShaderDesc, ShaderStage,
    RenderPass as RenderRenderPass, RenderPassDesc,
    Pipeline as RenderPipeline, PipelineDesc,
    RenderTarget as RenderRenderTarget,
    Framebuffer as RenderFramebuffer, FramebufferDesc,
    BindingGroup as RenderBindingGroup, BindingGroupLayoutDesc, BindingResource, BindingType,
    CommandList as RenderCommandList,
    Fence as RenderFence, Semaphore as RenderSemaphore,
};
use strata_engine::{engine_debug, engine_info, engine_warn, engine_error, engine_bail, engine_err};
use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use gpu_allocator::MemoryLocation;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use rustc_hash::FxHashMap;
use std::ffi::CString;
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};

use crate::debug::{DebugMessenger, ValidationStats};
use crate::vulkan_binding_group::BindingGroup;
use crate::vulkan_buffer::Buffer;
use crate::vulkan_command_list::CommandList;
use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{
    aspect_of, binding_type_to_vk, blend_state_to_vk, buffer_format_to_vk, buffer_usage_to_vk,
    cull_mode_to_vk, front_face_to_vk, image_layout_to_vk, input_rate_to_vk, load_op_to_vk,
    polygon_mode_to_vk, shader_stage_to_vk, shader_stages_to_vk, stage_flags_to_vk,
    store_op_to_vk, texture_format_to_vk, topology_to_vk,
};
use crate::vulkan_frame_buffer::Framebuffer;
use crate::vulkan_pipeline::Pipeline;
use crate::vulkan_render_pass::RenderPass;
use crate::vulkan_render_target::RenderTarget;
use crate::vulkan_sampler::SamplerCache;
use crate::vulkan_shader::{reflect_push_constant_size, Shader};
use crate::vulkan_swapchain::VulkanSwapchain;
use crate::vulkan_sync::{vk_fence, vk_semaphore, Fence, Semaphore};
use crate::vulkan_texture::Texture;

/// Descriptor sets per pool; a new pool is added when one runs dry
const SETS_PER_POOL: u32 = 1024;

/// Vulkan device implementation
///
/// Owns the instance, the logical device and the window surface. Every
/// object it creates must be dropped before it; swapchains included.
pub struct VulkanGraphicsDevice {
    /// Vulkan entry (keeps the loader alive)
    _entry: ash::Entry,
    instance: ash::Instance,
    physical_device: vk::PhysicalDevice,

    /// Window surface, created with the device
    surface: vk::SurfaceKHR,
    surface_loader: ash::khr::surface::Instance,
    /// Present queue (may be the graphics queue)
    present_queue: vk::Queue,

    /// `minUniformBufferOffsetAlignment` of the physical device
    min_ubo_alignment: u64,

    /// Descriptor pools for binding group allocation (grows when exhausted)
    descriptor_pools: Mutex<Vec<vk::DescriptorPool>>,
    /// One VkDescriptorSetLayout per distinct layout description
    set_layouts: Mutex<FxHashMap<BindingGroupLayoutDesc, vk::DescriptorSetLayout>>,
    /// Creates VkSampler on first use
    sampler_cache: Mutex<SamplerCache>,

    /// Validation messenger (only with `enable_validation`)
    debug: Option<DebugMessenger>,

    /// Shared GPU context for all resources
    gpu_context: Arc<GpuContext>,
    ctx: Arc<EngineContext>,
}

impl VulkanGraphicsDevice {
    /// Create the instance, surface and logical device for `window`
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(
        window: &W,
        config: &EngineConfig,
        ctx: Arc<EngineContext>,
    ) -> Result<Self> {
        unsafe {
            let entry = ash::Entry::load()
                .map_err(|e| {
                    engine_error!(ctx, "strata::vulkan", "Failed to load Vulkan library: {:?}", e);
                    Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
                })?;

            let app_name = CString::new(config.app_name.as_str())
                .map_err(|_| Error::InitializationFailed("Application name contains a NUL byte".to_string()))?;
            let (major, minor, patch) = config.app_version;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, major, minor, patch))
                .engine_name(c"Strata")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_2);

            let display_handle = window.display_handle()
                .map_err(|e| {
                    engine_error!(ctx, "strata::vulkan", "Failed to get display handle: {}", e);
                    Error::InitializationFailed(format!("Failed to get display handle: {}", e))
                })?;
            let mut extension_names = ash_window::enumerate_required_extensions(display_handle.as_raw())
                .map_err(|e| {
                    engine_error!(ctx, "strata::vulkan", "Failed to get required extensions: {}", e);
                    Error::InitializationFailed(format!("Failed to get required extensions: {}", e))
                })?
                .to_vec();

            let validation = config.enable_validation && Self::validation_layer_available(&entry);
            if config.enable_validation && !validation {
                engine_warn!(ctx, "strata::vulkan",
                    "Validation requested but VK_LAYER_KHRONOS_validation is not installed");
            }
            if validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            }
            let layer_names = if validation {
                vec![c"VK_LAYER_KHRONOS_validation".as_ptr()]
            } else {
                vec![]
            };

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry
                .create_instance(&create_info, None)
                .map_err(|e| {
                    engine_error!(ctx, "strata::vulkan", "Failed to create Vulkan instance: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
                })?;

            let debug = if validation {
                Some(DebugMessenger::new(&entry, &instance, Arc::clone(&ctx))?)
            } else {
                None
            };

            let window_handle = window.window_handle()
                .map_err(|e| {
                    engine_error!(ctx, "strata::vulkan", "Failed to get window handle: {}", e);
                    Error::InitializationFailed(format!("Failed to get window handle: {}", e))
                })?;
            let surface = ash_window::create_surface(
                &entry,
                &instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| {
                engine_error!(ctx, "strata::vulkan", "Failed to create surface: {:?}", e);
                Error::InitializationFailed(format!("Failed to create surface: {:?}", e))
            })?;
            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

            let (physical_device, graphics_family_index, present_family_index) =
                Self::pick_physical_device(&instance, &surface_loader, surface, &ctx)?;

            let properties = instance.get_physical_device_properties(physical_device);
            let device_name = properties
                .device_name_as_c_str()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|_| "unknown".to_string());
            let min_ubo_alignment = properties.limits.min_uniform_buffer_offset_alignment;
            engine_info!(ctx, "strata::vulkan",
                "Using GPU '{}' ({:?}), minUniformBufferOffsetAlignment = {}",
                device_name, properties.device_type, min_ubo_alignment);

            let queue_priorities = [1.0];
            let mut queue_create_infos = vec![
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(graphics_family_index)
                    .queue_priorities(&queue_priorities),
            ];
            if present_family_index != graphics_family_index {
                queue_create_infos.push(
                    vk::DeviceQueueCreateInfo::default()
                        .queue_family_index(present_family_index)
                        .queue_priorities(&queue_priorities),
                );
            }

            let device_extension_names = [ash::khr::swapchain::NAME.as_ptr()];

            // Wireframe pipelines need fillModeNonSolid
            let supported = instance.get_physical_device_features(physical_device);
            let device_features = vk::PhysicalDeviceFeatures::default()
                .fill_mode_non_solid(supported.fill_mode_non_solid == vk::TRUE);

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&device_extension_names)
                .enabled_features(&device_features);

            let device = instance
                .create_device(physical_device, &device_create_info, None)
                .map_err(|e| {
                    engine_error!(ctx, "strata::vulkan", "Failed to create logical device: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create device: {:?}", e))
                })?;

            let graphics_queue = device.get_device_queue(graphics_family_index, 0);
            let present_queue = device.get_device_queue(present_family_index, 0);

            let allocator = Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            })
            .map_err(|e| {
                engine_error!(ctx, "strata::vulkan", "Failed to create GPU allocator: {:?}", e);
                Error::InitializationFailed(format!("Failed to create allocator: {:?}", e))
            })?;

            let descriptor_pool = Self::create_descriptor_pool(&device, &ctx)?;

            // TRANSIENT + RESET for reusable one-shot uploads
            let upload_pool_create_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(graphics_family_index)
                .flags(vk::CommandPoolCreateFlags::TRANSIENT | vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

            let upload_command_pool = device.create_command_pool(&upload_pool_create_info, None)
                .map_err(|e| {
                    engine_error!(ctx, "strata::vulkan", "Failed to create upload command pool: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create upload command pool: {:?}", e))
                })?;

            let gpu_context = Arc::new(GpuContext::new(
                device,
                Arc::new(Mutex::new(allocator)),
                graphics_queue,
                graphics_family_index,
                upload_command_pool,
                Arc::clone(&ctx),
            ));

            Ok(Self {
                _entry: entry,
                instance,
                physical_device,
                surface,
                surface_loader,
                present_queue,
                min_ubo_alignment,
                descriptor_pools: Mutex::new(vec![descriptor_pool]),
                set_layouts: Mutex::new(FxHashMap::default()),
                sampler_cache: Mutex::new(SamplerCache::new(Arc::clone(&gpu_context))),
                debug,
                gpu_context,
                ctx,
            })
        }
    }

    /// Create the swapchain for the device's surface
    ///
    /// `width`/`height` are used only when the surface leaves the extent
    /// to the swapchain. One swapchain per device.
    pub fn create_swapchain(&self, width: u32, height: u32, vsync: bool) -> Result<VulkanSwapchain> {
        VulkanSwapchain::new(
            Arc::clone(&self.gpu_context),
            &self.instance,
            self.physical_device,
            self.surface,
            self.surface_loader.clone(),
            self.present_queue,
            width,
            height,
            vsync,
        )
    }

    /// Validation message counts, when validation is enabled
    pub fn validation_stats(&self) -> Option<ValidationStats> {
        self.debug.as_ref().map(|debug| debug.stats())
    }

    fn validation_layer_available(entry: &ash::Entry) -> bool {
        unsafe { entry.enumerate_instance_layer_properties() }
            .map(|layers| {
                layers.iter().any(|layer| {
                    layer.layer_name_as_c_str()
                        .map(|name| name == c"VK_LAYER_KHRONOS_validation")
                        .unwrap_or(false)
                })
            })
            .unwrap_or(false)
    }

    /// Pick a GPU with graphics and present support, discrete first
    ///
    /// Returns (physical device, graphics family, present family).
    unsafe fn pick_physical_device(
        instance: &ash::Instance,
        surface_loader: &ash::khr::surface::Instance,
        surface: vk::SurfaceKHR,
        ctx: &EngineContext,
    ) -> Result<(vk::PhysicalDevice, u32, u32)> {
        let physical_devices = instance
            .enumerate_physical_devices()
            .map_err(|e| {
                engine_error!(ctx, "strata::vulkan", "Failed to enumerate physical devices: {:?}", e);
                Error::InitializationFailed(format!("Failed to enumerate physical devices: {:?}", e))
            })?;

        let mut best: Option<(u32, vk::PhysicalDevice, u32, u32)> = None;
        for physical_device in physical_devices {
            let queue_families = instance.get_physical_device_queue_family_properties(physical_device);

            let graphics = queue_families
                .iter()
                .position(|qf| qf.queue_flags.contains(vk::QueueFlags::GRAPHICS))
                .map(|i| i as u32);
            let presents = |i: u32| {
                surface_loader
                    .get_physical_device_surface_support(physical_device, i, surface)
                    .unwrap_or(false)
            };
            let Some(graphics) = graphics else { continue };
            let present = if presents(graphics) {
                Some(graphics)
            } else {
                (0..queue_families.len() as u32).find(|&i| presents(i))
            };
            let Some(present) = present else { continue };

            let score = match instance.get_physical_device_properties(physical_device).device_type {
                vk::PhysicalDeviceType::DISCRETE_GPU => 3,
                vk::PhysicalDeviceType::INTEGRATED_GPU => 2,
                _ => 1,
            };
            if best.map_or(true, |(s, ..)| score > s) {
                best = Some((score, physical_device, graphics, present));
            }
        }

        best.map(|(_, physical_device, graphics, present)| (physical_device, graphics, present))
            .ok_or_else(|| {
                engine_error!(ctx, "strata::vulkan", "No GPU with graphics and present support found");
                Error::InitializationFailed("No suitable Vulkan GPU found".to_string())
            })
    }

    /// Create a descriptor pool with fixed capacity
    ///
    /// Called during init and whenever the current pool is exhausted.
    fn create_descriptor_pool(device: &ash::Device, ctx: &EngineContext) -> Result<vk::DescriptorPool> {
        let pool_sizes = [
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                descriptor_count: SETS_PER_POOL * 2,
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::UNIFORM_BUFFER,
                descriptor_count: SETS_PER_POOL,
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC,
                descriptor_count: SETS_PER_POOL,
            },
        ];
        let info = vk::DescriptorPoolCreateInfo::default()
            .pool_sizes(&pool_sizes)
            .max_sets(SETS_PER_POOL);

        unsafe {
            device.create_descriptor_pool(&info, None)
                .map_err(|e| {
                    engine_error!(ctx, "strata::vulkan", "Failed to create descriptor pool: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create descriptor pool: {:?}", e))
                })
        }
    }

    fn device(&self) -> &ash::Device {
        &self.gpu_context.device
    }

    /// Shared VkDescriptorSetLayout for `desc`
    fn set_layout(&self, desc: &BindingGroupLayoutDesc) -> Result<vk::DescriptorSetLayout> {
        let mut layouts = self.set_layouts.lock()
            .map_err(|_| engine_err!(self.ctx, "strata::vulkan", "Set layout cache mutex poisoned"))?;
        if let Some(&layout) = layouts.get(desc) {
            return Ok(layout);
        }

        let bindings: Vec<vk::DescriptorSetLayoutBinding> = desc.entries
            .iter()
            .map(|entry| {
                vk::DescriptorSetLayoutBinding::default()
                    .binding(entry.binding)
                    .descriptor_type(binding_type_to_vk(entry.binding_type))
                    .descriptor_count(1)
                    .stage_flags(stage_flags_to_vk(entry.stages))
            })
            .collect();
        let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);

        let layout = unsafe { self.device().create_descriptor_set_layout(&create_info, None) }
            .map_err(|e| engine_err!(self.ctx, "strata::vulkan", "Failed to create descriptor set layout: {:?}", e))?;
        layouts.insert(desc.clone(), layout);
        Ok(layout)
    }

    /// Allocate one descriptor set, growing the pool list when exhausted
    fn allocate_descriptor_set(&self, layout: vk::DescriptorSetLayout) -> Result<vk::DescriptorSet> {
        let layouts = [layout];
        let mut pools = self.descriptor_pools.lock()
            .map_err(|_| engine_err!(self.ctx, "strata::vulkan", "Descriptor pool mutex poisoned"))?;
        let current_pool = *pools.last()
            .ok_or_else(|| engine_err!(self.ctx, "strata::vulkan", "No descriptor pool available"))?;

        let allocate_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(current_pool)
            .set_layouts(&layouts);

        let sets = match unsafe { self.device().allocate_descriptor_sets(&allocate_info) } {
            Ok(sets) => sets,
            Err(vk::Result::ERROR_OUT_OF_POOL_MEMORY) | Err(vk::Result::ERROR_FRAGMENTED_POOL) => {
                let new_pool = Self::create_descriptor_pool(self.device(), &self.ctx)?;
                pools.push(new_pool);
                engine_info!(self.ctx, "strata::vulkan",
                    "Descriptor pool exhausted, created new pool (total: {})", pools.len());
                let retry_info = vk::DescriptorSetAllocateInfo::default()
                    .descriptor_pool(new_pool)
                    .set_layouts(&layouts);
                unsafe { self.device().allocate_descriptor_sets(&retry_info) }
                    .map_err(|e| engine_err!(self.ctx, "strata::vulkan",
                        "Failed to allocate descriptor set after pool growth: {:?}", e))?
            }
            Err(e) => engine_bail!(self.ctx, "strata::vulkan", "Failed to allocate descriptor set: {:?}", e),
        };
        Ok(sets[0])
    }

    /// Create a host-visible, persistently mapped buffer
    fn create_host_buffer(&self, size: u64, usage: vk::BufferUsageFlags, label: &str) -> Result<Buffer> {
        if size == 0 {
            return Err(Error::InvalidResource(format!("Buffer '{}' has zero size", label)));
        }

        let device = self.device();
        let create_info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        unsafe {
            let buffer = device.create_buffer(&create_info, None)
                .map_err(|e| engine_err!(self.ctx, "strata::vulkan",
                    "Failed to create buffer '{}' of size {} bytes: {:?}", label, size, e))?;

            let requirements = device.get_buffer_memory_requirements(buffer);
            let allocation = match self.gpu_context.allocate(label, requirements, MemoryLocation::CpuToGpu, true) {
                Ok(allocation) => allocation,
                Err(e) => {
                    device.destroy_buffer(buffer, None);
                    return Err(e);
                }
            };

            if let Err(e) = device.bind_buffer_memory(buffer, allocation.memory(), allocation.offset()) {
                self.gpu_context.free(allocation);
                device.destroy_buffer(buffer, None);
                engine_bail!(self.ctx, "strata::vulkan", "Failed to bind buffer memory: {:?}", e);
            }

            Ok(Buffer::new(Arc::clone(&self.gpu_context), buffer, allocation, size, label.to_string()))
        }
    }

    /// Create a device-local 2D image with a matching view
    ///
    /// Returns (image, view, allocation); the caller takes ownership.
    fn create_image(
        &self,
        width: u32,
        height: u32,
        format: TextureFormat,
        usage: vk::ImageUsageFlags,
        label: &str,
    ) -> Result<(vk::Image, vk::ImageView, gpu_allocator::vulkan::Allocation)> {
        let device = self.device();
        let vk_format = texture_format_to_vk(format);

        let image_create_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(vk_format)
            .extent(vk::Extent3D { width, height, depth: 1 })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        unsafe {
            let image = device.create_image(&image_create_info, None)
                .map_err(|e| engine_err!(self.ctx, "strata::vulkan", "Failed to create image '{}': {:?}", label, e))?;

            let requirements = device.get_image_memory_requirements(image);
            let allocation = match self.gpu_context.allocate(label, requirements, MemoryLocation::GpuOnly, false) {
                Ok(allocation) => allocation,
                Err(e) => {
                    device.destroy_image(image, None);
                    return Err(e);
                }
            };

            if let Err(e) = device.bind_image_memory(image, allocation.memory(), allocation.offset()) {
                self.gpu_context.free(allocation);
                device.destroy_image(image, None);
                engine_bail!(self.ctx, "strata::vulkan", "Failed to bind image memory for '{}': {:?}", label, e);
            }

            let view_create_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(vk_format)
                .components(vk::ComponentMapping::default())
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: aspect_of(format),
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });

            match device.create_image_view(&view_create_info, None) {
                Ok(view) => Ok((image, view, allocation)),
                Err(e) => {
                    self.gpu_context.free(allocation);
                    device.destroy_image(image, None);
                    Err(engine_err!(self.ctx, "strata::vulkan", "Failed to create image view for '{}': {:?}", label, e))
                }
            }
        }
    }

    /// Copy `data` into `image` and leave it in SHADER_READ_ONLY_OPTIMAL
    ///
    /// With no data the image is only transitioned.
    fn upload_texture(&self, image: vk::Image, desc: &TextureDesc) -> Result<()> {
        let staging = match &desc.data {
            Some(data) => {
                let staging = self.create_host_buffer(
                    data.len() as u64,
                    vk::BufferUsageFlags::TRANSFER_SRC,
                    "texture_staging",
                )?;
                RenderBuffer::update(&staging, 0, data)?;
                Some(staging)
            }
            None => None,
        };

        let device = self.device();
        let range = vk::ImageSubresourceRange {
            aspect_mask: aspect_of(desc.format),
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        };

        self.gpu_context.submit_one_shot(|command_buffer| unsafe {
            let old_layout = if staging.is_some() {
                let to_transfer = vk::ImageMemoryBarrier::default()
                    .old_layout(vk::ImageLayout::UNDEFINED)
                    .new_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                    .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .image(image)
                    .subresource_range(range)
                    .src_access_mask(vk::AccessFlags::empty())
                    .dst_access_mask(vk::AccessFlags::TRANSFER_WRITE);
                device.cmd_pipeline_barrier(
                    command_buffer,
                    vk::PipelineStageFlags::TOP_OF_PIPE,
                    vk::PipelineStageFlags::TRANSFER,
                    vk::DependencyFlags::empty(),
                    &[], &[], &[to_transfer],
                );
                vk::ImageLayout::TRANSFER_DST_OPTIMAL
            } else {
                vk::ImageLayout::UNDEFINED
            };

            if let Some(staging) = &staging {
                let region = vk::BufferImageCopy::default()
                    .buffer_offset(0)
                    .buffer_row_length(0)
                    .buffer_image_height(0)
                    .image_subresource(vk::ImageSubresourceLayers {
                        aspect_mask: range.aspect_mask,
                        mip_level: 0,
                        base_array_layer: 0,
                        layer_count: 1,
                    })
                    .image_offset(vk::Offset3D { x: 0, y: 0, z: 0 })
                    .image_extent(vk::Extent3D { width: desc.width, height: desc.height, depth: 1 });
                device.cmd_copy_buffer_to_image(
                    command_buffer,
                    staging.buffer,
                    image,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    &[region],
                );
            }

            let to_shader = vk::ImageMemoryBarrier::default()
                .old_layout(old_layout)
                .new_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(image)
                .subresource_range(range)
                .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
                .dst_access_mask(vk::AccessFlags::SHADER_READ);
            device.cmd_pipeline_barrier(
                command_buffer,
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::FRAGMENT_SHADER,
                vk::DependencyFlags::empty(),
                &[], &[], &[to_shader],
            );
        })
    }
}

impl GraphicsDevice for VulkanGraphicsDevice {
    fn min_uniform_buffer_offset_alignment(&self) -> u64 {
        self.min_ubo_alignment
    }

    fn create_buffer(&self, desc: BufferDesc) -> Result<Arc<dyn RenderBuffer>> {
        let mut usage = buffer_usage_to_vk(desc.usage);
        if desc.usage != BufferUsage::Staging {
            usage |= vk::BufferUsageFlags::TRANSFER_DST;
        }
        let buffer = self.create_host_buffer(desc.size, usage, &desc.label)?;
        engine_debug!(self.ctx, "strata::vulkan", "Buffer '{}' created ({} bytes, {:?})",
            desc.label, desc.size, desc.usage);
        Ok(Arc::new(buffer))
    }

    fn create_texture(&self, desc: TextureDesc) -> Result<Arc<dyn RenderTexture>> {
        if desc.width == 0 || desc.height == 0 {
            return Err(Error::InvalidResource(format!(
                "Texture '{}' has zero extent ({}x{})", desc.label, desc.width, desc.height
            )));
        }
        if let Some(data) = &desc.data {
            if data.len() as u64 != desc.expected_data_len() {
                return Err(Error::InvalidResource(format!(
                    "Texture '{}' data is {} bytes, expected {}",
                    desc.label, data.len(), desc.expected_data_len()
                )));
            }
        }

        let usage = match desc.usage {
            TextureUsage::Sampled => vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST,
            TextureUsage::RenderTarget => vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::SAMPLED,
            TextureUsage::DepthStencil => vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
        };
        if desc.usage == TextureUsage::DepthStencil && !desc.format.is_depth() {
            return Err(Error::InvalidResource(format!(
                "Texture '{}': {:?} is not a depth format", desc.label, desc.format
            )));
        }

        let (image, view, allocation) = self.create_image(desc.width, desc.height, desc.format, usage, &desc.label)?;
        let texture = Texture::new(
            Arc::clone(&self.gpu_context),
            image,
            view,
            allocation,
            TextureInfo {
                width: desc.width,
                height: desc.height,
                format: desc.format,
                usage: desc.usage,
            },
        );

        if desc.usage == TextureUsage::Sampled {
            self.upload_texture(image, &desc)?;
        }

        engine_debug!(self.ctx, "strata::vulkan", "Texture '{}' created ({}x{} {:?})",
            desc.label, desc.width, desc.height, desc.format);
        Ok(Arc::new(texture))
    }

    fn create_shader(&self, desc: ShaderDesc) -> Result<Arc<dyn RenderShader>> {
        if desc.code.is_empty() || desc.code.len() % 4 != 0 {
            return Err(Error::ShaderLoadFailed(format!(
                "SPIR-V size must be a non-zero multiple of 4 (got {} bytes)", desc.code.len()
            )));
        }

        let code = ash::util::read_spv(&mut std::io::Cursor::new(desc.code))
            .map_err(|e| Error::ShaderLoadFailed(format!("Invalid SPIR-V: {}", e)))?;
        let push_constant_size = reflect_push_constant_size(&code)
            .map_err(Error::ShaderLoadFailed)?;

        let create_info = vk::ShaderModuleCreateInfo::default().code(&code);
        let module = unsafe { self.device().create_shader_module(&create_info, None) }
            .map_err(|e| engine_err!(self.ctx, "strata::vulkan", "Failed to create shader module: {:?}", e))?;

        Ok(Arc::new(Shader {
            module,
            stage: desc.stage,
            entry_point: desc.entry_point,
            push_constant_size,
            device: self.device().clone(),
        }))
    }

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn RenderRenderPass>> {
        let mut attachments = Vec::new();
        let mut color_attachment_refs = Vec::new();
        let mut depth_attachment_ref: Option<vk::AttachmentReference> = None;

        for (i, color_attachment) in desc.color_attachments.iter().enumerate() {
            attachments.push(vk::AttachmentDescription::default()
                .format(texture_format_to_vk(color_attachment.format))
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(load_op_to_vk(color_attachment.load_op))
                .store_op(store_op_to_vk(color_attachment.store_op))
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(image_layout_to_vk(color_attachment.initial_layout))
                .final_layout(image_layout_to_vk(color_attachment.final_layout)));

            color_attachment_refs.push(vk::AttachmentReference::default()
                .attachment(i as u32)
                .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL));
        }

        if let Some(depth_attachment) = &desc.depth_attachment {
            let depth_index = attachments.len() as u32;
            let stencil_load = if depth_attachment.format.has_stencil() {
                load_op_to_vk(depth_attachment.load_op)
            } else {
                vk::AttachmentLoadOp::DONT_CARE
            };
            attachments.push(vk::AttachmentDescription::default()
                .format(texture_format_to_vk(depth_attachment.format))
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(load_op_to_vk(depth_attachment.load_op))
                .store_op(store_op_to_vk(depth_attachment.store_op))
                .stencil_load_op(stencil_load)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(image_layout_to_vk(depth_attachment.initial_layout))
                .final_layout(image_layout_to_vk(depth_attachment.final_layout)));

            depth_attachment_ref = Some(vk::AttachmentReference::default()
                .attachment(depth_index)
                .layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL));
        }

        let mut subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_attachment_refs);
        if let Some(ref depth_ref) = depth_attachment_ref {
            subpass = subpass.depth_stencil_attachment(depth_ref);
        }

        // Include depth stages when a depth attachment is present
        let (stage_mask, access_mask) = if depth_attachment_ref.is_some() {
            (
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                    | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS
                    | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS,
                vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                    | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            )
        } else {
            (
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
            )
        };

        // Loaded attachments are read before the pass writes them
        let load_access = if depth_attachment_ref.is_some() {
            vk::AccessFlags::COLOR_ATTACHMENT_READ | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ
        } else {
            vk::AccessFlags::COLOR_ATTACHMENT_READ
        };

        // Successive passes over the same image must not overlap
        let dependency = vk::SubpassDependency::default()
            .src_subpass(vk::SUBPASS_EXTERNAL)
            .dst_subpass(0)
            .src_stage_mask(stage_mask)
            .src_access_mask(access_mask)
            .dst_stage_mask(stage_mask)
            .dst_access_mask(access_mask | load_access);

        let render_pass_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(std::slice::from_ref(&subpass))
            .dependencies(std::slice::from_ref(&dependency));

        let render_pass = unsafe { self.device().create_render_pass(&render_pass_info, None) }
            .map_err(|e| engine_err!(self.ctx, "strata::vulkan", "Failed to create render pass: {:?}", e))?;

        Ok(Arc::new(RenderPass {
            render_pass,
            attachment_count: attachments.len(),
            device: self.device().clone(),
        }))
    }

    fn create_pipeline(&self, desc: PipelineDesc) -> Result<Arc<dyn RenderPipeline>> {
        if desc.vertex_shader.stage() != ShaderStage::Vertex || desc.fragment_shader.stage() != ShaderStage::Fragment {
            engine_bail!(self.ctx, "strata::vulkan",
                "Pipeline '{}': shader stages do not match their slots", desc.label);
        }

        // Backend objects always come from this device
        let vertex_shader = unsafe {
            &*(desc.vertex_shader.as_ref() as *const dyn RenderShader as *const Shader)
        };
        let fragment_shader = unsafe {
            &*(desc.fragment_shader.as_ref() as *const dyn RenderShader as *const Shader)
        };
        let vk_render_pass = unsafe {
            &*(desc.render_pass.as_ref() as *const dyn RenderRenderPass as *const RenderPass)
        };

        // Every push-constant block a shader declares must fit in a declared range
        for shader in [vertex_shader, fragment_shader] {
            if let Some(size) = shader.push_constant_size {
                let covered = desc.push_constant_ranges
                    .iter()
                    .filter(|range| range.stages.contains(&shader.stage))
                    .map(|range| range.offset + range.size)
                    .max()
                    .unwrap_or(0);
                if size > covered {
                    engine_bail!(self.ctx, "strata::vulkan",
                        "Pipeline '{}': {:?} shader declares {} bytes of push constants, layout covers {}",
                        desc.label, shader.stage, size, covered);
                }
            }
        }

        let vertex_entry = CString::new(vertex_shader.entry_point.as_str())
            .map_err(|_| Error::ShaderLoadFailed("Entry point contains a NUL byte".to_string()))?;
        let fragment_entry = CString::new(fragment_shader.entry_point.as_str())
            .map_err(|_| Error::ShaderLoadFailed("Entry point contains a NUL byte".to_string()))?;

        let shader_stages = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(shader_stage_to_vk(ShaderStage::Vertex))
                .module(vertex_shader.module)
                .name(&vertex_entry),
            vk::PipelineShaderStageCreateInfo::default()
                .stage(shader_stage_to_vk(ShaderStage::Fragment))
                .module(fragment_shader.module)
                .name(&fragment_entry),
        ];

        let vertex_bindings: Vec<vk::VertexInputBindingDescription> = desc.vertex_layout.bindings
            .iter()
            .map(|binding| vk::VertexInputBindingDescription {
                binding: binding.binding,
                stride: binding.stride,
                input_rate: input_rate_to_vk(binding.input_rate),
            })
            .collect();

        let vertex_attributes: Vec<vk::VertexInputAttributeDescription> = desc.vertex_layout.attributes
            .iter()
            .map(|attribute| vk::VertexInputAttributeDescription {
                location: attribute.location,
                binding: attribute.binding,
                format: buffer_format_to_vk(attribute.format),
                offset: attribute.offset,
            })
            .collect();

        let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&vertex_bindings)
            .vertex_attribute_descriptions(&vertex_attributes);

        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(topology_to_vk(desc.topology))
            .primitive_restart_enable(false);

        // Viewport and scissor are dynamic
        let viewports = [vk::Viewport::default()];
        let scissors = [vk::Rect2D::default()];
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewports(&viewports)
            .scissors(&scissors);

        let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(polygon_mode_to_vk(desc.polygon_mode))
            .line_width(1.0)
            .cull_mode(cull_mode_to_vk(desc.cull_mode))
            .front_face(front_face_to_vk(desc.front_face))
            .depth_bias_enable(false);

        let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(desc.depth_test)
            .depth_write_enable(desc.depth_write)
            .depth_compare_op(vk::CompareOp::LESS_OR_EQUAL)
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let color_blend_attachment = blend_state_to_vk(desc.blend);
        let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(std::slice::from_ref(&color_blend_attachment));

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state = vk::PipelineDynamicStateCreateInfo::default()
            .dynamic_states(&dynamic_states);

        let push_constant_ranges: Vec<vk::PushConstantRange> = desc.push_constant_ranges
            .iter()
            .map(|range| vk::PushConstantRange {
                stage_flags: shader_stages_to_vk(&range.stages),
                offset: range.offset,
                size: range.size,
            })
            .collect();

        let set_layouts = desc.binding_group_layouts
            .iter()
            .map(|layout| self.set_layout(layout))
            .collect::<Result<Vec<_>>>()?;

        let layout_create_info = vk::PipelineLayoutCreateInfo::default()
            .set_layouts(&set_layouts)
            .push_constant_ranges(&push_constant_ranges);

        let device = self.device();
        let layout = unsafe { device.create_pipeline_layout(&layout_create_info, None) }
            .map_err(|e| engine_err!(self.ctx, "strata::vulkan", "Failed to create pipeline layout: {:?}", e))?;

        let pipeline_create_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .depth_stencil_state(&depth_stencil_state)
            .multisample_state(&multisample_state)
            .color_blend_state(&color_blend_state)
            .dynamic_state(&dynamic_state)
            .layout(layout)
            .render_pass(vk_render_pass.render_pass)
            .subpass(0);

        let pipelines = unsafe {
            device.create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_create_info], None)
        };
        let pipeline = match pipelines {
            Ok(pipelines) => pipelines[0],
            Err((_, e)) => {
                unsafe { device.destroy_pipeline_layout(layout, None); }
                engine_bail!(self.ctx, "strata::vulkan",
                    "Failed to create graphics pipeline '{}': {:?}", desc.label, e);
            }
        };

        engine_debug!(self.ctx, "strata::vulkan", "Pipeline '{}' created ({} sets, {} push ranges)",
            desc.label, set_layouts.len(), push_constant_ranges.len());

        Ok(Arc::new(Pipeline {
            pipeline,
            pipeline_layout: layout,
            set_layout_count: set_layouts.len() as u32,
            device: device.clone(),
        }))
    }

    fn create_depth_target(&self, width: u32, height: u32, format: TextureFormat) -> Result<Arc<dyn RenderRenderTarget>> {
        if !format.is_depth() {
            return Err(Error::InvalidResource(format!("{:?} is not a depth format", format)));
        }
        if width == 0 || height == 0 {
            return Err(Error::InvalidResource(format!("Depth target has zero extent ({}x{})", width, height)));
        }

        let (image, view, allocation) = self.create_image(
            width,
            height,
            format,
            vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
            "depth_target",
        )?;

        Ok(Arc::new(RenderTarget::new_owned_target(
            Arc::clone(&self.gpu_context),
            width,
            height,
            format,
            image,
            view,
            allocation,
        )))
    }

    fn create_framebuffer(&self, desc: &FramebufferDesc) -> Result<Arc<dyn RenderFramebuffer>> {
        let vk_render_pass = unsafe {
            &*(desc.render_pass.as_ref() as *const dyn RenderRenderPass as *const RenderPass)
        };

        let mut targets: Vec<Arc<dyn RenderRenderTarget>> = desc.color_attachments.clone();
        if let Some(depth) = &desc.depth_attachment {
            targets.push(Arc::clone(depth));
        }
        if targets.len() != vk_render_pass.attachment_count {
            engine_bail!(self.ctx, "strata::vulkan",
                "Framebuffer has {} attachments, render pass expects {}",
                targets.len(), vk_render_pass.attachment_count);
        }

        let views: Vec<vk::ImageView> = targets
            .iter()
            .map(|target| unsafe {
                (*(target.as_ref() as *const dyn RenderRenderTarget as *const RenderTarget)).image_view
            })
            .collect();

        let framebuffer_info = vk::FramebufferCreateInfo::default()
            .render_pass(vk_render_pass.render_pass)
            .attachments(&views)
            .width(desc.width)
            .height(desc.height)
            .layers(1);

        let framebuffer = unsafe { self.device().create_framebuffer(&framebuffer_info, None) }
            .map_err(|e| engine_err!(self.ctx, "strata::vulkan", "Failed to create framebuffer: {:?}", e))?;

        Ok(Arc::new(Framebuffer::new(
            framebuffer,
            desc.width,
            desc.height,
            targets,
            self.device().clone(),
        )))
    }

    fn create_binding_group(
        &self,
        layout: &BindingGroupLayoutDesc,
        set_index: u32,
        resources: &[BindingResource],
    ) -> Result<Arc<dyn RenderBindingGroup>> {
        if resources.len() != layout.entries.len() {
            return Err(Error::InvalidResource(format!(
                "Binding group for set {} has {} resources, layout declares {}",
                set_index, resources.len(), layout.entries.len()
            )));
        }

        // Resolve every descriptor first so the write structs can point at stable storage
        let mut buffer_infos: Vec<vk::DescriptorBufferInfo> = Vec::new();
        let mut image_infos: Vec<vk::DescriptorImageInfo> = Vec::new();
        for (entry, resource) in layout.entries.iter().zip(resources) {
            match (entry.binding_type, resource) {
                (BindingType::UniformBuffer, BindingResource::UniformBuffer(buffer)) => {
                    let vk_buffer = unsafe { &*(*buffer as *const dyn RenderBuffer as *const Buffer) };
                    buffer_infos.push(vk::DescriptorBufferInfo::default()
                        .buffer(vk_buffer.buffer)
                        .offset(0)
                        .range(vk::WHOLE_SIZE));
                }
                (BindingType::UniformBufferDynamic, BindingResource::DynamicUniformBuffer(buffer, range)) => {
                    if *range == 0 || *range > buffer.size() {
                        return Err(Error::InvalidResource(format!(
                            "Dynamic range {} invalid for a {}-byte buffer", range, buffer.size()
                        )));
                    }
                    let vk_buffer = unsafe { &*(*buffer as *const dyn RenderBuffer as *const Buffer) };
                    buffer_infos.push(vk::DescriptorBufferInfo::default()
                        .buffer(vk_buffer.buffer)
                        .offset(0)
                        .range(*range));
                }
                (BindingType::CombinedImageSampler, BindingResource::SampledTexture(texture, sampler_type)) => {
                    let vk_texture = unsafe { &*(*texture as *const dyn RenderTexture as *const Texture) };
                    let sampler = self.sampler_cache.lock()
                        .map_err(|_| engine_err!(self.ctx, "strata::vulkan", "Sampler cache mutex poisoned"))?
                        .get(*sampler_type)?;
                    image_infos.push(vk::DescriptorImageInfo::default()
                        .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
                        .image_view(vk_texture.view)
                        .sampler(sampler));
                }
                (expected, _) => {
                    return Err(Error::InvalidResource(format!(
                        "Binding {} of set {} expects {:?}", entry.binding, set_index, expected
                    )));
                }
            }
        }

        let set_layout = self.set_layout(layout)?;
        let descriptor_set = self.allocate_descriptor_set(set_layout)?;

        let mut writes: Vec<vk::WriteDescriptorSet> = Vec::with_capacity(resources.len());
        let mut buffer_idx = 0usize;
        let mut image_idx = 0usize;
        for entry in &layout.entries {
            let write = vk::WriteDescriptorSet::default()
                .dst_set(descriptor_set)
                .dst_binding(entry.binding)
                .dst_array_element(0)
                .descriptor_type(binding_type_to_vk(entry.binding_type));
            let write = match entry.binding_type {
                BindingType::UniformBuffer | BindingType::UniformBufferDynamic => {
                    buffer_idx += 1;
                    write.buffer_info(std::slice::from_ref(&buffer_infos[buffer_idx - 1]))
                }
                BindingType::CombinedImageSampler => {
                    image_idx += 1;
                    write.image_info(std::slice::from_ref(&image_infos[image_idx - 1]))
                }
            };
            writes.push(write);
        }

        unsafe {
            self.device().update_descriptor_sets(&writes, &[]);
        }

        Ok(Arc::new(BindingGroup {
            descriptor_set,
            set_index,
            dynamic_offset_count: layout.dynamic_offset_count(),
        }))
    }

    fn create_command_list(&self) -> Result<Box<dyn RenderCommandList>> {
        let command_list = CommandList::new(
            self.device().clone(),
            self.gpu_context.graphics_queue_family,
        )
        .map_err(|e| {
            engine_error!(self.ctx, "strata::vulkan", "{}", e);
            e
        })?;
        Ok(Box::new(command_list))
    }

    fn create_fence(&self, signaled: bool) -> Result<Box<dyn RenderFence>> {
        Ok(Box::new(Fence::new(Arc::clone(&self.gpu_context), signaled)?))
    }

    fn create_semaphore(&self) -> Result<Box<dyn RenderSemaphore>> {
        Ok(Box::new(Semaphore::new(Arc::clone(&self.gpu_context))?))
    }

    fn submit(&self, submission: &Submission) -> Result<()> {
        let vk_command_list = unsafe {
            &*(submission.command_list as *const dyn RenderCommandList as *const CommandList)
        };
        let command_buffers = [vk_command_list.command_buffer];
        let wait_semaphores: Vec<vk::Semaphore> = submission.wait_semaphore.map(vk_semaphore).into_iter().collect();
        let wait_stages: Vec<vk::PipelineStageFlags> = wait_semaphores
            .iter()
            .map(|_| vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
            .collect();
        let signal_semaphores: Vec<vk::Semaphore> = submission.signal_semaphore.map(vk_semaphore).into_iter().collect();
        let fence = submission.fence.map(vk_fence).unwrap_or(vk::Fence::null());

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        let _queue = self.gpu_context.queue_lock.lock()
            .map_err(|_| engine_err!(self.ctx, "strata::vulkan", "Queue mutex poisoned"))?;
        match unsafe { self.device().queue_submit(self.gpu_context.graphics_queue, &[submit_info], fence) } {
            Ok(()) => Ok(()),
            Err(vk::Result::ERROR_DEVICE_LOST) => {
                engine_error!(self.ctx, "strata::vulkan", "Device lost during submit");
                Err(Error::DeviceLost)
            }
            Err(e) => Err(engine_err!(self.ctx, "strata::vulkan", "Failed to submit commands to GPU queue: {:?}", e)),
        }
    }

    fn wait_idle(&self) -> Result<()> {
        let _queue = self.gpu_context.queue_lock.lock()
            .map_err(|_| engine_err!(self.ctx, "strata::vulkan", "Queue mutex poisoned"))?;
        unsafe { self.device().device_wait_idle() }
            .map_err(|e| engine_err!(self.ctx, "strata::vulkan", "Failed to wait idle: {:?}", e))
    }
}

impl Drop for VulkanGraphicsDevice {
    fn drop(&mut self) {
        unsafe {
            let device = self.gpu_context.device.clone();
            device.device_wait_idle().ok();

            // 1. Samplers first: releases the cache's Arc<GpuContext>
            if let Ok(cache) = self.sampler_cache.get_mut() {
                cache.shutdown();
            }

            // 2. Device-owned Vulkan objects
            if let Ok(layouts) = self.set_layouts.get_mut() {
                for (_, layout) in layouts.drain() {
                    device.destroy_descriptor_set_layout(layout, None);
                }
            }
            if let Ok(pools) = self.descriptor_pools.get_mut() {
                for pool in pools.drain(..) {
                    device.destroy_descriptor_pool(pool, None);
                }
            }
            if let Ok(mut pool) = self.gpu_context.upload_command_pool.lock() {
                if *pool != vk::CommandPool::null() {
                    device.destroy_command_pool(*pool, None);
                    *pool = vk::CommandPool::null();
                }
            }

            // 3. Allocator: free VkDeviceMemory pages BEFORE destroying the device
            match Arc::get_mut(&mut self.gpu_context) {
                Some(gpu_context) => ManuallyDrop::drop(&mut gpu_context.allocator),
                None => engine_warn!(self.ctx, "strata::vulkan",
                    "GPU resources outlive the device; their memory is leaked"),
            }

            // 4. Messenger before the instance
            drop(self.debug.take());

            // 5. Surface, device, instance
            self.surface_loader.destroy_surface(self.surface, None);
            device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}
