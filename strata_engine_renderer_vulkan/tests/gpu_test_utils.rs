#![allow(dead_code)]
//! GPU test utilities - one Vulkan device shared by every test of a binary
//!
//! ash-window refuses to create a second surface for the same window on
//! some platforms, and a surface may only have one live swapchain. Sharing
//! a single device per test process avoids both.

use std::sync::{Arc, OnceLock};
use strata_engine::strata::{EngineConfig, EngineContext};
use strata_engine_renderer_vulkan::strata::VulkanGraphicsDevice;
use winit::event_loop::{EventLoop, EventLoopBuilder};
use winit::window::Window;

#[cfg(target_os = "windows")]
use winit::platform::windows::EventLoopBuilderExtWindows;

pub const TEST_WIDTH: u32 = 800;
pub const TEST_HEIGHT: u32 = 600;

static GPU_DEVICE: OnceLock<Arc<VulkanGraphicsDevice>> = OnceLock::new();

/// Kept alive for the device's surface; the event loop is leaked
static GPU_WINDOW: OnceLock<Window> = OnceLock::new();

/// Shared device, created on first use
pub fn get_test_device() -> Arc<VulkanGraphicsDevice> {
    GPU_DEVICE
        .get_or_init(|| {
            let (window, event_loop) = create_test_window();

            let config = EngineConfig {
                app_name: "Strata GPU Tests".to_string(),
                enable_validation: true,
                ..EngineConfig::default()
            };
            let device = VulkanGraphicsDevice::new(&window, &config, EngineContext::with_default_logger())
                .expect("Failed to create VulkanGraphicsDevice for tests");

            // EventLoop is not Sync and cannot live in a static
            std::mem::forget(event_loop);
            GPU_WINDOW.set(window).ok();

            Arc::new(device)
        })
        .clone()
}

/// Hidden 800x600 window; any-thread event loop on Windows so `cargo test` threads can create it
#[allow(deprecated)]
pub fn create_test_window() -> (Window, EventLoop<()>) {
    let event_loop = {
        #[cfg(target_os = "windows")]
        {
            EventLoopBuilder::new()
                .with_any_thread(true)
                .build()
                .unwrap()
        }
        #[cfg(not(target_os = "windows"))]
        {
            EventLoopBuilder::new().build().unwrap()
        }
    };

    let window_attrs = Window::default_attributes()
        .with_title("Strata GPU Test Window")
        .with_inner_size(winit::dpi::LogicalSize::new(TEST_WIDTH, TEST_HEIGHT))
        .with_visible(false);

    let window = event_loop.create_window(window_attrs).unwrap();
    (window, event_loop)
}
