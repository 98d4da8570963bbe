//! Integration tests for the Vulkan device
//!
//! Require a GPU and a windowing system, so every test is #[ignore].
//!
//! Run with: cargo test --test vulkan_device_tests -- --ignored

mod gpu_test_utils;

use gpu_test_utils::{get_test_device, TEST_HEIGHT, TEST_WIDTH};
use serial_test::serial;
use strata_engine::strata::render::{
    BindingGroupLayoutDesc, BindingResource, BindingSlotDesc, BindingType, BufferDesc, BufferUsage,
    GraphicsDevice, SamplerType, ShaderDesc, ShaderStage, ShaderStageFlags, Submission, Swapchain,
    TextureDesc, TextureFormat, TextureUsage, WAIT_FOREVER,
};
use strata_engine::strata::Error;

fn uniform_buffer(device: &dyn GraphicsDevice, size: u64) -> std::sync::Arc<dyn strata_engine::strata::render::Buffer> {
    device
        .create_buffer(BufferDesc { size, usage: BufferUsage::Uniform, label: "test_ubo".to_string() })
        .unwrap()
}

fn dynamic_layout() -> BindingGroupLayoutDesc {
    BindingGroupLayoutDesc {
        entries: vec![BindingSlotDesc {
            binding: 0,
            binding_type: BindingType::UniformBufferDynamic,
            stages: ShaderStageFlags::VERTEX,
        }],
    }
}

// ============================================================================
// DEVICE
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_device_reports_power_of_two_alignment() {
    let device = get_test_device();
    let alignment = device.min_uniform_buffer_offset_alignment();

    assert!(alignment >= 1);
    assert!(alignment.is_power_of_two());
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_device_wait_idle() {
    let device = get_test_device();
    device.wait_idle().unwrap();
}

// ============================================================================
// BUFFERS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_buffer_update_then_read() {
    let device = get_test_device();
    let buffer = uniform_buffer(device.as_ref(), 512);

    assert_eq!(buffer.size(), 512);
    buffer.update(256, &[1, 2, 3, 4]).unwrap();
    assert_eq!(buffer.read(256, 4).unwrap(), vec![1, 2, 3, 4]);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_buffer_write_past_end_is_rejected() {
    let device = get_test_device();
    let buffer = uniform_buffer(device.as_ref(), 64);

    let result = buffer.update(60, &[0u8; 8]);
    assert!(matches!(result, Err(Error::OffsetOutOfBounds { offset: 60, size: 8, buffer_size: 64 })));
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_zero_sized_buffer_is_rejected() {
    let device = get_test_device();
    let result = device.create_buffer(BufferDesc {
        size: 0,
        usage: BufferUsage::Vertex,
        label: "empty".to_string(),
    });

    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

// ============================================================================
// TEXTURES AND TARGETS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_texture_upload() {
    let device = get_test_device();
    let texture = device
        .create_texture(TextureDesc {
            width: 4,
            height: 4,
            format: TextureFormat::R8G8B8A8_UNORM,
            usage: TextureUsage::Sampled,
            data: Some(vec![255u8; 4 * 4 * 4]),
            label: "white".to_string(),
        })
        .unwrap();

    assert_eq!(texture.info().width, 4);
    assert_eq!(texture.info().format, TextureFormat::R8G8B8A8_UNORM);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_texture_data_length_mismatch() {
    let device = get_test_device();
    let result = device.create_texture(TextureDesc {
        width: 4,
        height: 4,
        format: TextureFormat::R8G8B8A8_UNORM,
        usage: TextureUsage::Sampled,
        data: Some(vec![0u8; 10]),
        label: "short".to_string(),
    });

    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_depth_target_creation() {
    let device = get_test_device();
    let target = device.create_depth_target(TEST_WIDTH, TEST_HEIGHT, TextureFormat::D32_FLOAT).unwrap();

    assert_eq!(target.width(), TEST_WIDTH);
    assert_eq!(target.height(), TEST_HEIGHT);
    assert_eq!(target.format(), TextureFormat::D32_FLOAT);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_depth_target_rejects_color_format() {
    let device = get_test_device();
    let result = device.create_depth_target(64, 64, TextureFormat::R8G8B8A8_UNORM);

    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

// ============================================================================
// SHADERS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_shader_rejects_misaligned_bytecode() {
    let device = get_test_device();
    let result = device.create_shader(ShaderDesc {
        code: &[0x03, 0x02, 0x23],
        stage: ShaderStage::Vertex,
        entry_point: "main".to_string(),
    });

    assert!(matches!(result, Err(Error::ShaderLoadFailed(_))));
}

// ============================================================================
// BINDING GROUPS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_dynamic_binding_group() {
    let device = get_test_device();
    let alignment = device.min_uniform_buffer_offset_alignment();
    let buffer = uniform_buffer(device.as_ref(), alignment * 8);

    let group = device
        .create_binding_group(&dynamic_layout(), 2, &[BindingResource::DynamicUniformBuffer(buffer.as_ref(), 64)])
        .unwrap();

    assert_eq!(group.set_index(), 2);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_binding_group_resource_count_mismatch() {
    let device = get_test_device();
    let result = device.create_binding_group(&dynamic_layout(), 2, &[]);

    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_binding_group_range_larger_than_buffer() {
    let device = get_test_device();
    let buffer = uniform_buffer(device.as_ref(), 64);
    let result = device.create_binding_group(
        &dynamic_layout(),
        2,
        &[BindingResource::DynamicUniformBuffer(buffer.as_ref(), 128)],
    );

    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_binding_group_resource_type_mismatch() {
    let device = get_test_device();
    let texture = device
        .create_texture(TextureDesc {
            width: 1,
            height: 1,
            format: TextureFormat::R8G8B8A8_UNORM,
            usage: TextureUsage::Sampled,
            data: Some(vec![0u8; 4]),
            label: "pixel".to_string(),
        })
        .unwrap();

    let result = device.create_binding_group(
        &dynamic_layout(),
        2,
        &[BindingResource::SampledTexture(texture.as_ref(), SamplerType::LinearClamp)],
    );

    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

// ============================================================================
// SYNCHRONIZATION AND SUBMISSION
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_fence_signaled_state() {
    let device = get_test_device();

    let signaled = device.create_fence(true).unwrap();
    assert!(signaled.is_signaled().unwrap());
    signaled.wait(WAIT_FOREVER).unwrap();
    signaled.reset().unwrap();
    assert!(!signaled.is_signaled().unwrap());

    let unsignaled = device.create_fence(false).unwrap();
    assert!(!unsignaled.is_signaled().unwrap());
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_unsignaled_fence_wait_times_out() {
    let device = get_test_device();
    let fence = device.create_fence(false).unwrap();

    assert!(fence.wait(1_000).is_err());
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_submit_empty_command_list_signals_fence() {
    let device = get_test_device();
    let mut command_list = device.create_command_list().unwrap();
    let fence = device.create_fence(false).unwrap();
    let semaphore = device.create_semaphore().unwrap();

    command_list.begin().unwrap();
    command_list.end().unwrap();

    device
        .submit(&Submission {
            command_list: command_list.as_ref(),
            wait_semaphore: None,
            signal_semaphore: Some(semaphore.as_ref()),
            fence: Some(fence.as_ref()),
        })
        .unwrap();

    fence.wait(WAIT_FOREVER).unwrap();
    assert!(fence.is_signaled().unwrap());
    device.wait_idle().unwrap();
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_command_list_requires_recording() {
    let device = get_test_device();
    let mut command_list = device.create_command_list().unwrap();

    assert!(command_list.end().is_err());
    assert!(command_list.draw(3, 0).is_err());
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_draw_outside_render_pass_is_rejected() {
    let device = get_test_device();
    let mut command_list = device.create_command_list().unwrap();

    command_list.begin().unwrap();
    assert!(command_list.draw(3, 0).is_err());
    assert!(command_list.end_render_pass().is_err());
    command_list.end().unwrap();
}

// ============================================================================
// SWAPCHAIN
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_swapchain_create_and_recreate() {
    let device = get_test_device();
    let mut swapchain = device.create_swapchain(TEST_WIDTH, TEST_HEIGHT, true).unwrap();

    assert!(swapchain.image_count() >= 1);
    assert!(swapchain.width() > 0 && swapchain.height() > 0);
    assert!(!swapchain.format().is_depth());

    for index in 0..swapchain.image_count() as u32 {
        let target = swapchain.color_target(index).unwrap();
        assert_eq!(target.format(), swapchain.format());
        assert_eq!(target.width(), swapchain.width());
    }
    assert!(swapchain.color_target(swapchain.image_count() as u32).is_err());

    swapchain.recreate(TEST_WIDTH / 2, TEST_HEIGHT / 2).unwrap();
    assert!(swapchain.image_count() >= 1);
    assert!(swapchain.color_target(0).is_ok());
}
