/// Overlay renderer collaborator
///
/// An overlay (debug UI, HUD text) draws its own content inside the first
/// scene's render pass, after that scene's objects.

use crate::error::Result;
use crate::graphics_device::{CommandList, RenderPass};

pub trait OverlayRenderer {
    /// Record overlay draws into `cmd`
    ///
    /// `render_pass` is the pass currently begun on `cmd`; `extent` is the
    /// surface size in pixels.
    fn draw(&mut self, cmd: &mut dyn CommandList, render_pass: &dyn RenderPass, extent: (u32, u32)) -> Result<()>;
}
