/// RenderPass trait and render pass descriptor

use crate::graphics_device::TextureFormat;

/// Render pass trait (destroyed when dropped)
pub trait RenderPass: Send + Sync {}

/// Descriptor for creating a render pass
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPassDesc {
    /// Color attachments
    pub color_attachments: Vec<AttachmentDesc>,
    /// Optional depth attachment
    pub depth_attachment: Option<AttachmentDesc>,
}

/// Descriptor for a single attachment in a render pass
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentDesc {
    /// Pixel format
    pub format: TextureFormat,
    /// Load operation (what to do with existing content)
    pub load_op: LoadOp,
    /// Store operation (what to do with rendered content)
    pub store_op: StoreOp,
    /// Layout the attachment is in when the pass begins
    pub initial_layout: ImageLayout,
    /// Layout the attachment is left in when the pass ends
    pub final_layout: ImageLayout,
}

/// Load operation for an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOp {
    /// Load existing content
    Load,
    /// Clear the content
    Clear,
    /// Don't care about existing content
    DontCare,
}

/// Store operation for an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    /// Store the rendered content
    Store,
    /// Don't care about storing the content
    DontCare,
}

/// Image layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageLayout {
    /// Undefined layout (contents discarded)
    Undefined,
    /// Layout for color attachment
    ColorAttachment,
    /// Layout for depth/stencil attachment
    DepthStencilAttachment,
    /// Layout for presenting to the surface
    PresentSrc,
}
