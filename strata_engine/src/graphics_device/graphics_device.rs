/// GraphicsDevice trait - factory for every device object the engine uses

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{
    Buffer, BufferDesc, Texture, TextureDesc, TextureFormat, Shader, ShaderDesc,
    RenderPass, RenderPassDesc, Pipeline, PipelineDesc, RenderTarget,
    Framebuffer, FramebufferDesc, BindingGroup, BindingGroupLayoutDesc, BindingResource,
    CommandList, Fence, Semaphore,
};

/// One queue submission
///
/// The command list waits on `wait_semaphore` at the color-output stage,
/// then signals `signal_semaphore` and `fence` when the device finishes it.
pub struct Submission<'a> {
    /// Recorded command list
    pub command_list: &'a dyn CommandList,
    /// Semaphore waited on before color output
    pub wait_semaphore: Option<&'a dyn Semaphore>,
    /// Semaphore signaled on completion
    pub signal_semaphore: Option<&'a dyn Semaphore>,
    /// Fence signaled on completion
    pub fence: Option<&'a dyn Fence>,
}

/// Device context: creates resources and submits work
///
/// Implemented by backend-specific devices (e.g., VulkanGraphicsDevice).
/// All methods take `&self`; backends synchronize internally.
pub trait GraphicsDevice: Send + Sync {
    /// Minimum alignment, in bytes, of a dynamic uniform buffer offset
    fn min_uniform_buffer_offset_alignment(&self) -> u64;

    /// Create a host-visible buffer
    fn create_buffer(&self, desc: BufferDesc) -> Result<Arc<dyn Buffer>>;

    /// Create a texture, uploading `desc.data` when present
    fn create_texture(&self, desc: TextureDesc) -> Result<Arc<dyn Texture>>;

    /// Create a shader module from bytecode
    fn create_shader(&self, desc: ShaderDesc) -> Result<Arc<dyn Shader>>;

    /// Create a render pass
    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn RenderPass>>;

    /// Create a graphics pipeline compatible with `desc.render_pass`
    fn create_pipeline(&self, desc: PipelineDesc) -> Result<Arc<dyn Pipeline>>;

    /// Create a depth attachment of the given size
    fn create_depth_target(&self, width: u32, height: u32, format: TextureFormat) -> Result<Arc<dyn RenderTarget>>;

    /// Create a framebuffer from render targets
    fn create_framebuffer(&self, desc: &FramebufferDesc) -> Result<Arc<dyn Framebuffer>>;

    /// Create an immutable binding group
    ///
    /// `resources[i]` is written to binding `layout.entries[i].binding`.
    fn create_binding_group(
        &self,
        layout: &BindingGroupLayoutDesc,
        set_index: u32,
        resources: &[BindingResource],
    ) -> Result<Arc<dyn BindingGroup>>;

    /// Create a command list
    fn create_command_list(&self) -> Result<Box<dyn CommandList>>;

    /// Create a fence, optionally already signaled
    fn create_fence(&self, signaled: bool) -> Result<Box<dyn Fence>>;

    /// Create a device-side semaphore
    fn create_semaphore(&self) -> Result<Box<dyn Semaphore>>;

    /// Submit one command list to the graphics queue
    fn submit(&self, submission: &Submission) -> Result<()>;

    /// Block until the device is idle
    fn wait_idle(&self) -> Result<()>;
}
