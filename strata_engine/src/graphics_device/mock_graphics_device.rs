/// Mock graphics device for unit tests (no GPU required)
///
/// Every device object shares one ordered event log, so tests can assert on
/// the exact sequence of waits, resets, binds, draws, submits and presents.
/// Submission signals its fence immediately.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::graphics_device::{
    check_range, BindingGroup, BindingGroupLayoutDesc, BindingResource, Buffer, BufferDesc,
    ClearValue, CommandList, Fence, Framebuffer, FramebufferDesc, GraphicsDevice, IndexType,
    LoadOp, Pipeline, PipelineDesc, PresentStatus, Rect2D, RenderPass, RenderPassDesc,
    RenderTarget, Semaphore, Shader, ShaderDesc, ShaderStage, Submission, Swapchain, Texture,
    TextureDesc, TextureFormat, TextureInfo, TextureUsage, Viewport,
};

/// Shared, ordered event log
pub type EventLog = Arc<Mutex<Vec<String>>>;

fn push(events: &EventLog, event: String) {
    if let Ok(mut log) = events.lock() {
        log.push(event);
    }
}

// ============================================================================
// Mock Buffer
// ============================================================================

pub struct MockBuffer {
    pub label: String,
    data: Mutex<Vec<u8>>,
    events: EventLog,
}

impl MockBuffer {
    pub fn new(size: u64, label: String, events: EventLog) -> Self {
        Self { label, data: Mutex::new(vec![0; size as usize]), events }
    }
}

impl Buffer for MockBuffer {
    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        let mut contents = self.data.lock().map_err(|_| Error::BackendError("poisoned".into()))?;
        check_range(offset, data.len() as u64, contents.len() as u64)?;
        let start = offset as usize;
        contents[start..start + data.len()].copy_from_slice(data);
        push(&self.events, format!("buffer_update:{}:{}:{}", self.label, offset, data.len()));
        Ok(())
    }

    fn read(&self, offset: u64, len: u64) -> Result<Vec<u8>> {
        let contents = self.data.lock().map_err(|_| Error::BackendError("poisoned".into()))?;
        check_range(offset, len, contents.len() as u64)?;
        Ok(contents[offset as usize..(offset + len) as usize].to_vec())
    }

    fn size(&self) -> u64 {
        self.data.lock().map(|d| d.len() as u64).unwrap_or(0)
    }
}

// ============================================================================
// Mock Texture / Shader / Pipeline / RenderPass / RenderTarget / Framebuffer
// ============================================================================

pub struct MockTexture {
    pub info: TextureInfo,
    pub label: String,
}

impl Texture for MockTexture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }
}

pub struct MockShader {
    pub stage: ShaderStage,
}

impl Shader for MockShader {
    fn stage(&self) -> ShaderStage {
        self.stage
    }
}

pub struct MockPipeline {
    pub label: String,
    pub layout_count: u32,
}

impl Pipeline for MockPipeline {
    fn binding_group_layout_count(&self) -> u32 {
        self.layout_count
    }
}

/// Render pass labelled after its color load operation ("Clear" or "Load"),
/// with "+Depth" when it also loads depth
pub struct MockRenderPass {
    pub label: String,
}

impl RenderPass for MockRenderPass {}

pub struct MockRenderTarget {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

impl RenderTarget for MockRenderTarget {
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

pub struct MockFramebuffer {
    pub width: u32,
    pub height: u32,
    pub has_depth: bool,
    events: EventLog,
}

impl Drop for MockFramebuffer {
    fn drop(&mut self) {
        push(&self.events, "destroy_framebuffer".to_string());
    }
}

impl Framebuffer for MockFramebuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

pub struct MockBindingGroup {
    pub label: String,
    pub set_index: u32,
}

impl BindingGroup for MockBindingGroup {
    fn set_index(&self) -> u32 {
        self.set_index
    }
}

// ============================================================================
// Mock sync objects
// ============================================================================

pub struct MockFence {
    pub id: usize,
    signaled: AtomicBool,
    events: EventLog,
}

impl MockFence {
    fn signal(&self) {
        self.signaled.store(true, Ordering::SeqCst);
    }
}

impl Fence for MockFence {
    fn wait(&self, _timeout_ns: u64) -> Result<()> {
        push(&self.events, format!("wait_fence:fence{}", self.id));
        if self.signaled.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::BackendError(format!("fence{} would never signal", self.id)))
        }
    }

    fn reset(&self) -> Result<()> {
        push(&self.events, format!("reset_fence:fence{}", self.id));
        self.signaled.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_signaled(&self) -> Result<bool> {
        Ok(self.signaled.load(Ordering::SeqCst))
    }
}

pub struct MockSemaphore {
    pub id: usize,
}

impl Semaphore for MockSemaphore {}

// ============================================================================
// Mock CommandList
// ============================================================================

pub struct MockCommandList {
    events: EventLog,
}

impl MockCommandList {
    pub fn new(events: EventLog) -> Self {
        Self { events }
    }

    fn record(&self, event: impl Into<String>) -> Result<()> {
        push(&self.events, event.into());
        Ok(())
    }
}

impl CommandList for MockCommandList {
    fn begin(&mut self) -> Result<()> {
        self.record("begin")
    }

    fn end(&mut self) -> Result<()> {
        self.record("end")
    }

    fn begin_render_pass(
        &mut self,
        render_pass: &dyn RenderPass,
        _framebuffer: &dyn Framebuffer,
        _render_area: Rect2D,
        _clear_values: &[ClearValue],
    ) -> Result<()> {
        // Every render pass handed to a mock command list comes from MockGraphicsDevice
        let render_pass = unsafe { &*(render_pass as *const dyn RenderPass as *const MockRenderPass) };
        self.record(format!("begin_render_pass:{}", render_pass.label))
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.record("end_render_pass")
    }

    fn set_viewport(&mut self, _viewport: Viewport) -> Result<()> {
        self.record("set_viewport")
    }

    fn set_scissor(&mut self, _scissor: Rect2D) -> Result<()> {
        self.record("set_scissor")
    }

    fn bind_pipeline(&mut self, pipeline: &dyn Pipeline) -> Result<()> {
        let pipeline = unsafe { &*(pipeline as *const dyn Pipeline as *const MockPipeline) };
        self.record(format!("bind_pipeline:{}", pipeline.label))
    }

    fn bind_binding_group(
        &mut self,
        _pipeline: &dyn Pipeline,
        set_index: u32,
        group: &dyn BindingGroup,
        dynamic_offsets: &[u32],
    ) -> Result<()> {
        let group = unsafe { &*(group as *const dyn BindingGroup as *const MockBindingGroup) };
        self.record(format!("bind_binding_group:{}:{}:{:?}", group.label, set_index, dynamic_offsets))
    }

    fn push_constants(&mut self, _stages: &[ShaderStage], _offset: u32, data: &[u8]) -> Result<()> {
        self.record(format!("push_constants:{}", data.len()))
    }

    fn bind_vertex_buffer(&mut self, _buffer: &dyn Buffer, _offset: u64) -> Result<()> {
        self.record("bind_vertex_buffer")
    }

    fn bind_index_buffer(&mut self, _buffer: &dyn Buffer, _offset: u64, _index_type: IndexType) -> Result<()> {
        self.record("bind_index_buffer")
    }

    fn draw(&mut self, vertex_count: u32, _first_vertex: u32) -> Result<()> {
        self.record(format!("draw:{}", vertex_count))
    }

    fn draw_indexed(&mut self, index_count: u32, _first_index: u32, _vertex_offset: i32) -> Result<()> {
        self.record(format!("draw_indexed:{}", index_count))
    }
}

// ============================================================================
// Mock Swapchain
// ============================================================================

pub struct MockSwapchain {
    pub image_count: u32,
    pub width: u32,
    pub height: u32,
    next_image: u32,
    /// Next acquire returns `Error::SurfaceOutOfDate`
    pub fail_next_acquire: Arc<AtomicBool>,
    /// Next present returns `PresentStatus::Suboptimal`
    pub suboptimal_next_present: Arc<AtomicBool>,
    /// Number of `recreate` calls
    pub recreate_count: Arc<AtomicU32>,
    /// Id of the semaphore handed to each successful acquire
    pub acquire_semaphores: Arc<Mutex<Vec<usize>>>,
    events: EventLog,
}

impl MockSwapchain {
    pub fn new(image_count: u32, width: u32, height: u32, events: EventLog) -> Self {
        Self {
            image_count,
            width,
            height,
            next_image: 0,
            fail_next_acquire: Arc::new(AtomicBool::new(false)),
            suboptimal_next_present: Arc::new(AtomicBool::new(false)),
            recreate_count: Arc::new(AtomicU32::new(0)),
            acquire_semaphores: Arc::new(Mutex::new(Vec::new())),
            events,
        }
    }
}

impl Swapchain for MockSwapchain {
    fn acquire_next_image(&mut self, signal: &dyn Semaphore) -> Result<u32> {
        if self.fail_next_acquire.swap(false, Ordering::SeqCst) {
            push(&self.events, "acquire:out_of_date".to_string());
            return Err(Error::SurfaceOutOfDate);
        }
        let image = self.next_image;
        self.next_image = (self.next_image + 1) % self.image_count;
        push(&self.events, format!("acquire:{}", image));
        let signal = unsafe { &*(signal as *const dyn Semaphore as *const MockSemaphore) };
        if let Ok(mut ids) = self.acquire_semaphores.lock() {
            ids.push(signal.id);
        }
        Ok(image)
    }

    fn present(&mut self, image_index: u32, _wait: &dyn Semaphore) -> Result<PresentStatus> {
        push(&self.events, format!("present:{}", image_index));
        if self.suboptimal_next_present.swap(false, Ordering::SeqCst) {
            Ok(PresentStatus::Suboptimal)
        } else {
            Ok(PresentStatus::Optimal)
        }
    }

    fn recreate(&mut self, width: u32, height: u32) -> Result<()> {
        self.width = width;
        self.height = height;
        self.next_image = 0;
        self.recreate_count.fetch_add(1, Ordering::SeqCst);
        push(&self.events, format!("recreate:{}x{}", width, height));
        Ok(())
    }

    fn image_count(&self) -> usize {
        self.image_count as usize
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn format(&self) -> TextureFormat {
        TextureFormat::B8G8R8A8_SRGB
    }

    fn color_target(&self, image_index: u32) -> Result<Arc<dyn RenderTarget>> {
        if image_index >= self.image_count {
            return Err(Error::InvalidResource(format!("no surface image {}", image_index)));
        }
        Ok(Arc::new(MockRenderTarget { width: self.width, height: self.height, format: self.format() }))
    }
}

// ============================================================================
// Mock GraphicsDevice
// ============================================================================

pub struct MockGraphicsDevice {
    pub alignment: u64,
    pub events: EventLog,
    pub pipelines_created: AtomicUsize,
    pub render_passes_created: AtomicUsize,
    pub shaders_created: AtomicUsize,
    pub buffers_created: AtomicUsize,
    /// Make every `create_pipeline` call fail
    pub fail_pipeline_creation: AtomicBool,
    next_id: AtomicUsize,
}

impl MockGraphicsDevice {
    /// Device reporting a 256-byte uniform offset alignment
    pub fn new() -> Self {
        Self::with_alignment(256)
    }

    pub fn with_alignment(alignment: u64) -> Self {
        Self {
            alignment,
            events: Arc::new(Mutex::new(Vec::new())),
            pipelines_created: AtomicUsize::new(0),
            render_passes_created: AtomicUsize::new(0),
            shaders_created: AtomicUsize::new(0),
            buffers_created: AtomicUsize::new(0),
            fail_pipeline_creation: AtomicBool::new(false),
            next_id: AtomicUsize::new(0),
        }
    }

    /// Swapchain sharing this device's event log
    pub fn swapchain(&self, image_count: u32, width: u32, height: u32) -> MockSwapchain {
        MockSwapchain::new(image_count, width, height, self.events.clone())
    }

    /// Snapshot of the event log
    pub fn events(&self) -> Vec<String> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn clear_events(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }

    fn next_id(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn min_uniform_buffer_offset_alignment(&self) -> u64 {
        self.alignment
    }

    fn create_buffer(&self, desc: BufferDesc) -> Result<Arc<dyn Buffer>> {
        self.buffers_created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockBuffer::new(desc.size, desc.label, self.events.clone())))
    }

    fn create_texture(&self, desc: TextureDesc) -> Result<Arc<dyn Texture>> {
        if let Some(data) = &desc.data {
            if data.len() as u64 != desc.expected_data_len() {
                return Err(Error::InvalidResource(format!("texture '{}' data size mismatch", desc.label)));
            }
        }
        Ok(Arc::new(MockTexture {
            info: TextureInfo { width: desc.width, height: desc.height, format: desc.format, usage: desc.usage },
            label: desc.label,
        }))
    }

    fn create_shader(&self, desc: ShaderDesc) -> Result<Arc<dyn Shader>> {
        self.shaders_created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockShader { stage: desc.stage }))
    }

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn RenderPass>> {
        self.render_passes_created.fetch_add(1, Ordering::SeqCst);
        let mut label = match desc.color_attachments.first().map(|a| a.load_op) {
            Some(LoadOp::Load) => "Load".to_string(),
            _ => "Clear".to_string(),
        };
        if desc.depth_attachment.as_ref().map(|d| d.load_op) == Some(LoadOp::Load) {
            label.push_str("+Depth");
        }
        Ok(Arc::new(MockRenderPass { label }))
    }

    fn create_pipeline(&self, desc: PipelineDesc) -> Result<Arc<dyn Pipeline>> {
        if self.fail_pipeline_creation.load(Ordering::SeqCst) {
            return Err(Error::BackendError(format!("pipeline '{}' rejected", desc.label)));
        }
        self.pipelines_created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockPipeline {
            label: desc.label,
            layout_count: desc.binding_group_layouts.len() as u32,
        }))
    }

    fn create_depth_target(&self, width: u32, height: u32, format: TextureFormat) -> Result<Arc<dyn RenderTarget>> {
        if !format.is_depth() {
            return Err(Error::InvalidResource(format!("{:?} is not a depth format", format)));
        }
        Ok(Arc::new(MockRenderTarget { width, height, format }))
    }

    fn create_framebuffer(&self, desc: &FramebufferDesc) -> Result<Arc<dyn Framebuffer>> {
        Ok(Arc::new(MockFramebuffer {
            width: desc.width,
            height: desc.height,
            has_depth: desc.depth_attachment.is_some(),
            events: self.events.clone(),
        }))
    }

    fn create_binding_group(
        &self,
        layout: &BindingGroupLayoutDesc,
        set_index: u32,
        resources: &[BindingResource],
    ) -> Result<Arc<dyn BindingGroup>> {
        if layout.entries.len() != resources.len() {
            return Err(Error::InvalidResource(format!(
                "binding group expects {} resources, got {}",
                layout.entries.len(),
                resources.len()
            )));
        }
        Ok(Arc::new(MockBindingGroup { label: format!("group{}", self.next_id()), set_index }))
    }

    fn create_command_list(&self) -> Result<Box<dyn CommandList>> {
        Ok(Box::new(MockCommandList::new(self.events.clone())))
    }

    fn create_fence(&self, signaled: bool) -> Result<Box<dyn Fence>> {
        Ok(Box::new(MockFence {
            id: self.next_id(),
            signaled: AtomicBool::new(signaled),
            events: self.events.clone(),
        }))
    }

    fn create_semaphore(&self) -> Result<Box<dyn Semaphore>> {
        Ok(Box::new(MockSemaphore { id: self.next_id() }))
    }

    fn submit(&self, submission: &Submission) -> Result<()> {
        push(&self.events, "submit".to_string());
        if let Some(fence) = submission.fence {
            let fence = unsafe { &*(fence as *const dyn Fence as *const MockFence) };
            fence.signal();
        }
        Ok(())
    }

    fn wait_idle(&self) -> Result<()> {
        push(&self.events, "wait_idle".to_string());
        Ok(())
    }
}

// ============================================================================
// Mock ShaderLoader
// ============================================================================

/// Returns a minimal SPIR-V header for every name except the listed missing ones
#[derive(Default)]
pub struct MockShaderLoader {
    pub missing: Vec<String>,
}

impl MockShaderLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn missing(names: &[&str]) -> Self {
        Self { missing: names.iter().map(|n| n.to_string()).collect() }
    }
}

impl crate::pipeline::ShaderLoader for MockShaderLoader {
    fn load(&self, name: &str) -> Result<Vec<u8>> {
        if self.missing.iter().any(|m| m == name) {
            return Err(Error::ShaderLoadFailed(format!("{}: not found", name)));
        }
        Ok([crate::pipeline::SPIRV_MAGIC, 0x0001_0000].iter().flat_map(|w| w.to_le_bytes()).collect())
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
