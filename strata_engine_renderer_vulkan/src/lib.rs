/*!
# Strata Engine - Vulkan Backend

Vulkan implementation of the Strata engine's graphics device.

This crate implements the `strata_engine` device traits using Ash for
Vulkan bindings and gpu-allocator for memory management. Create a
[`strata::VulkanGraphicsDevice`] for a window, ask it for a
[`strata::VulkanSwapchain`], and hand both to `strata_engine::strata::Engine`.

```no_run
use std::sync::Arc;
use strata_engine::strata::{Engine, EngineConfig, EngineContext};
use strata_engine_renderer_vulkan::strata::VulkanGraphicsDevice;
# fn run(window: &winit::window::Window) -> strata_engine::strata::Result<()> {
let ctx = EngineContext::with_default_logger();
let config = EngineConfig::default();
let device = VulkanGraphicsDevice::new(window, &config, Arc::clone(&ctx))?;
let size = window.inner_size();
let swapchain = device.create_swapchain(size.width, size.height, config.vsync)?;
let engine = Engine::new(ctx, config, Arc::new(device), Box::new(swapchain))?;
# Ok(())
# }
```
*/

mod vulkan;
mod vulkan_context;
mod vulkan_format;
mod vulkan_buffer;
mod vulkan_texture;
mod vulkan_shader;
mod vulkan_pipeline;
mod vulkan_render_pass;
mod vulkan_render_target;
mod vulkan_frame_buffer;
mod vulkan_binding_group;
mod vulkan_command_list;
mod vulkan_sampler;
mod vulkan_swapchain;
mod vulkan_sync;
mod debug;

/// Public API of the Vulkan backend
pub mod strata {
    pub use crate::vulkan::VulkanGraphicsDevice;
    pub use crate::vulkan_swapchain::VulkanSwapchain;
    pub use crate::debug::{print_validation_report, ValidationStats, VALIDATION_SOURCE};
}
