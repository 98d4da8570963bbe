/// RenderTarget trait - an attachable image view

use crate::graphics_device::TextureFormat;

/// Render target trait
///
/// Either a presentable surface image or an engine-owned attachment (depth).
pub trait RenderTarget: Send + Sync {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn format(&self) -> TextureFormat;
}
