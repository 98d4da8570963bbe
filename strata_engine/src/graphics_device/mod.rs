/// Graphics device module - every device-facing trait and descriptor the core consumes

pub mod graphics_device;
pub mod buffer;
pub mod texture;
pub mod shader;
pub mod pipeline;
pub mod command_list;
pub mod render_target;
pub mod render_pass;
pub mod swapchain;
pub mod binding_group;
pub mod frame_buffer;
pub mod sync;

pub use graphics_device::*;
pub use buffer::*;
pub use texture::*;
pub use shader::*;
pub use pipeline::*;
pub use command_list::*;
pub use render_target::*;
pub use render_pass::*;
pub use swapchain::*;
pub use binding_group::*;
pub use frame_buffer::*;
pub use sync::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
