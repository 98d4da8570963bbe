/// CommandList - Vulkan implementation of the CommandList trait

use strata_engine::strata::{Result, Error};
use strata_engine::strata::render::{
    CommandList as RenderCommandList,
    RenderPass as RenderRenderPass,
    Framebuffer as RenderFramebuffer,
    Pipeline as RenderPipeline,
    Buffer as RenderBuffer,
    BindingGroup as RenderBindingGroup,
    IndexType, ShaderStage, Viewport, Rect2D, ClearValue,
};
use ash::vk;

use crate::vulkan_binding_group::BindingGroup;
use crate::vulkan_buffer::Buffer;
use crate::vulkan_format::{index_type_to_vk, shader_stages_to_vk};
use crate::vulkan_frame_buffer::Framebuffer;
use crate::vulkan_pipeline::Pipeline;
use crate::vulkan_render_pass::RenderPass;

/// Vulkan command list implementation
///
/// Owns one command pool and one primary command buffer. The buffer is
/// reset by `begin`, so a frame slot reuses the same list every cycle.
pub struct CommandList {
    /// Vulkan device
    device: ash::Device,
    /// Command pool for allocating command buffers
    command_pool: vk::CommandPool,
    /// Command buffer for recording
    pub(crate) command_buffer: vk::CommandBuffer,
    /// Whether the command list is currently recording
    is_recording: bool,
    /// Whether we're inside a render pass
    in_render_pass: bool,
    /// Currently bound pipeline layout (for push constants)
    bound_pipeline_layout: Option<vk::PipelineLayout>,
}

impl CommandList {
    /// Create a new command list
    ///
    /// # Arguments
    ///
    /// * `device` - Vulkan logical device
    /// * `graphics_queue_family` - Graphics queue family index
    pub(crate) fn new(device: ash::Device, graphics_queue_family: u32) -> Result<Self> {
        unsafe {
            let command_pool_create_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(graphics_queue_family)
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

            let command_pool = device.create_command_pool(&command_pool_create_info, None)
                .map_err(|e| Error::BackendError(format!("Failed to create command pool: {:?}", e)))?;

            let command_buffer_allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);

            let command_buffers = match device.allocate_command_buffers(&command_buffer_allocate_info) {
                Ok(buffers) => buffers,
                Err(e) => {
                    device.destroy_command_pool(command_pool, None);
                    return Err(Error::BackendError(format!("Failed to allocate command buffer: {:?}", e)));
                }
            };

            Ok(Self {
                device,
                command_pool,
                command_buffer: command_buffers[0],
                is_recording: false,
                in_render_pass: false,
                bound_pipeline_layout: None,
            })
        }
    }

    fn ensure_recording(&self) -> Result<()> {
        if !self.is_recording {
            return Err(Error::BackendError("Command list not recording".to_string()));
        }
        Ok(())
    }
}

impl RenderCommandList for CommandList {
    fn begin(&mut self) -> Result<()> {
        if self.is_recording {
            return Err(Error::BackendError("Command list already recording".to_string()));
        }

        unsafe {
            self.device
                .reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| Error::BackendError(format!("Failed to reset command buffer: {:?}", e)))?;

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

            self.device
                .begin_command_buffer(self.command_buffer, &begin_info)
                .map_err(|e| Error::BackendError(format!("Failed to begin command buffer: {:?}", e)))?;
        }

        self.is_recording = true;
        self.in_render_pass = false;
        self.bound_pipeline_layout = None;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.ensure_recording()?;
        if self.in_render_pass {
            return Err(Error::BackendError("Render pass not ended before ending command list".to_string()));
        }

        unsafe {
            self.device
                .end_command_buffer(self.command_buffer)
                .map_err(|e| Error::BackendError(format!("Failed to end command buffer: {:?}", e)))?;
        }

        self.is_recording = false;
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        render_pass: &dyn RenderRenderPass,
        framebuffer: &dyn RenderFramebuffer,
        render_area: Rect2D,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        self.ensure_recording()?;
        if self.in_render_pass {
            return Err(Error::BackendError("Already inside a render pass".to_string()));
        }

        // Backend objects always come from this device
        let vk_render_pass = unsafe {
            &*(render_pass as *const dyn RenderRenderPass as *const RenderPass)
        };
        let vk_framebuffer = unsafe {
            &*(framebuffer as *const dyn RenderFramebuffer as *const Framebuffer)
        };

        let vk_clear_values: Vec<vk::ClearValue> = clear_values
            .iter()
            .map(|clear| match clear {
                ClearValue::Color(color) => vk::ClearValue {
                    color: vk::ClearColorValue { float32: *color },
                },
                ClearValue::DepthStencil { depth, stencil } => vk::ClearValue {
                    depth_stencil: vk::ClearDepthStencilValue { depth: *depth, stencil: *stencil },
                },
            })
            .collect();

        let render_pass_begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(vk_render_pass.render_pass)
            .framebuffer(vk_framebuffer.framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: render_area.x, y: render_area.y },
                extent: vk::Extent2D { width: render_area.width, height: render_area.height },
            })
            .clear_values(&vk_clear_values);

        unsafe {
            self.device.cmd_begin_render_pass(
                self.command_buffer,
                &render_pass_begin_info,
                vk::SubpassContents::INLINE,
            );
        }

        self.in_render_pass = true;
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.ensure_recording()?;
        if !self.in_render_pass {
            return Err(Error::BackendError("Not inside a render pass".to_string()));
        }

        unsafe {
            self.device.cmd_end_render_pass(self.command_buffer);
        }

        self.in_render_pass = false;
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.ensure_recording()?;

        let vk_viewport = vk::Viewport {
            x: viewport.x,
            y: viewport.y,
            width: viewport.width,
            height: viewport.height,
            min_depth: viewport.min_depth,
            max_depth: viewport.max_depth,
        };

        unsafe {
            self.device.cmd_set_viewport(self.command_buffer, 0, &[vk_viewport]);
        }
        Ok(())
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.ensure_recording()?;

        let vk_scissor = vk::Rect2D {
            offset: vk::Offset2D { x: scissor.x, y: scissor.y },
            extent: vk::Extent2D { width: scissor.width, height: scissor.height },
        };

        unsafe {
            self.device.cmd_set_scissor(self.command_buffer, 0, &[vk_scissor]);
        }
        Ok(())
    }

    fn bind_pipeline(&mut self, pipeline: &dyn RenderPipeline) -> Result<()> {
        self.ensure_recording()?;

        let vk_pipeline = unsafe {
            &*(pipeline as *const dyn RenderPipeline as *const Pipeline)
        };

        unsafe {
            self.device.cmd_bind_pipeline(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                vk_pipeline.pipeline,
            );
        }

        self.bound_pipeline_layout = Some(vk_pipeline.pipeline_layout);
        Ok(())
    }

    fn bind_binding_group(
        &mut self,
        pipeline: &dyn RenderPipeline,
        set_index: u32,
        group: &dyn RenderBindingGroup,
        dynamic_offsets: &[u32],
    ) -> Result<()> {
        self.ensure_recording()?;

        let vk_pipeline = unsafe {
            &*(pipeline as *const dyn RenderPipeline as *const Pipeline)
        };
        let vk_group = unsafe {
            &*(group as *const dyn RenderBindingGroup as *const BindingGroup)
        };

        if set_index >= vk_pipeline.set_layout_count {
            return Err(Error::BackendError(format!(
                "Set index {} out of range (pipeline declares {} sets)",
                set_index, vk_pipeline.set_layout_count
            )));
        }
        if dynamic_offsets.len() != vk_group.dynamic_offset_count {
            return Err(Error::BackendError(format!(
                "Binding group expects {} dynamic offsets, got {}",
                vk_group.dynamic_offset_count,
                dynamic_offsets.len()
            )));
        }

        unsafe {
            self.device.cmd_bind_descriptor_sets(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                vk_pipeline.pipeline_layout,
                set_index,
                &[vk_group.descriptor_set],
                dynamic_offsets,
            );
        }
        Ok(())
    }

    fn push_constants(&mut self, stages: &[ShaderStage], offset: u32, data: &[u8]) -> Result<()> {
        self.ensure_recording()?;

        let layout = self.bound_pipeline_layout.ok_or_else(|| {
            Error::BackendError("No pipeline bound for push constants".to_string())
        })?;

        unsafe {
            self.device.cmd_push_constants(
                self.command_buffer,
                layout,
                shader_stages_to_vk(stages),
                offset,
                data,
            );
        }
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: &dyn RenderBuffer, offset: u64) -> Result<()> {
        self.ensure_recording()?;

        let vk_buffer = unsafe {
            &*(buffer as *const dyn RenderBuffer as *const Buffer)
        };

        unsafe {
            self.device.cmd_bind_vertex_buffers(
                self.command_buffer,
                0,
                &[vk_buffer.buffer],
                &[offset],
            );
        }
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: &dyn RenderBuffer, offset: u64, index_type: IndexType) -> Result<()> {
        self.ensure_recording()?;

        let vk_buffer = unsafe {
            &*(buffer as *const dyn RenderBuffer as *const Buffer)
        };

        unsafe {
            self.device.cmd_bind_index_buffer(
                self.command_buffer,
                vk_buffer.buffer,
                offset,
                index_type_to_vk(index_type),
            );
        }
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        self.ensure_recording()?;
        if !self.in_render_pass {
            return Err(Error::BackendError("Draw outside of a render pass".to_string()));
        }

        unsafe {
            self.device.cmd_draw(self.command_buffer, vertex_count, 1, first_vertex, 0);
        }
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()> {
        self.ensure_recording()?;
        if !self.in_render_pass {
            return Err(Error::BackendError("Draw outside of a render pass".to_string()));
        }

        unsafe {
            self.device.cmd_draw_indexed(self.command_buffer, index_count, 1, first_index, vertex_offset, 0);
        }
        Ok(())
    }
}

impl Drop for CommandList {
    fn drop(&mut self) {
        unsafe {
            // Destroying the pool frees its command buffer
            self.device.destroy_command_pool(self.command_pool, None);
        }
    }
}
