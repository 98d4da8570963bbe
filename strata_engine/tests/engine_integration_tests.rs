//! Integration tests for the Engine over the Vulkan backend
//!
//! Tests requiring GPU are marked with #[ignore].
//!
//! Run with: cargo test --test engine_integration_tests -- --ignored


use glam::{Vec3, Vec4};
use gpu_test_utils::{create_test_engine, test_config};
use serial_test::serial;
use strata_engine::strata::frame::FrameOutcome;
use strata_engine::strata::render::{SamplerType, TextureDesc, TextureFormat, TextureUsage};
use strata_engine::strata::scene::{Mesh, ObjectDesc, PanelRect};
use strata_engine::strata::{EngineConfig, Error};

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_integration_engine_lifecycle() {
    let engine = create_test_engine(test_config()).unwrap();

    assert_eq!(engine.frame_counter(), 0);
    assert!(engine.pipelines().is_empty());
    assert!(engine.scenes().is_empty());
    assert_eq!(engine.stats().frames_presented, 0);

    drop(engine);

    // The surface accepts a new swapchain once the previous engine is gone
    let engine = create_test_engine(test_config()).unwrap();
    assert_eq!(engine.frame_counter(), 0);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_integration_layout_matches_device_alignment() {
    let engine = create_test_engine(test_config()).unwrap();
    let alignment = engine.device().min_uniform_buffer_offset_alignment();
    let layout = *engine.layout();

    assert_eq!(layout.alignment(), alignment);
    assert_eq!(layout.stride() % alignment, 0);
    assert!(layout.stride() >= layout.block_size());
    assert_eq!(layout.capacity(), 64);
    assert_eq!(layout.offset_of(3).unwrap(), 3 * layout.stride());
    assert!(matches!(layout.offset_of(64), Err(Error::CapacityExceeded { position: 64, capacity: 64 })));
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_integration_invalid_config_is_rejected() {
    let config = EngineConfig { frames_in_flight: 0, ..test_config() };
    let result = create_test_engine(config);

    assert!(matches!(result, Err(Error::InitializationFailed(_))));
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_integration_scene_resources_per_frame_slot() {
    let mut engine = create_test_engine(test_config()).unwrap();
    let world = engine.create_scene("world").unwrap();
    let ui = engine.create_ui_scene("hud").unwrap();

    assert_eq!(engine.scenes().len(), 2);
    let names: Vec<&str> = engine.scenes().iter().map(|(_, scene)| scene.name()).collect();
    assert_eq!(names, vec!["world", "hud"]);

    let scene = engine.scene(world).unwrap();
    let frames_in_flight = engine.config().frames_in_flight;
    for slot in 0..frames_in_flight {
        let resources = scene.frame_resources(slot).unwrap();
        assert_eq!(resources.dynamic_buffer.size(), engine.layout().buffer_size());
        assert_eq!(resources.binding_group.set_index(), 0);
    }
    assert!(scene.frame_resources(frames_in_flight).is_err());

    // A UI scene is readable as a scene but not mutable as a world scene
    assert!(engine.scene(ui).is_some());
    assert!(engine.scene_mut(ui).is_none());
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_integration_remove_scene() {
    let mut engine = create_test_engine(test_config()).unwrap();
    let first = engine.create_scene("first").unwrap();
    let second = engine.create_scene("second").unwrap();

    engine.remove_scene(first).unwrap();

    assert_eq!(engine.scenes().len(), 1);
    assert!(engine.scene(first).is_none());
    assert!(engine.scene(second).is_some());
    assert!(matches!(engine.remove_scene(first), Err(Error::InvalidResource(_))));
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_integration_objects_require_known_pipeline() {
    let mut engine = create_test_engine(test_config()).unwrap();
    let world = engine.create_scene("world").unwrap();
    let ui = engine.create_ui_scene("hud").unwrap();

    let cube = ObjectDesc::new("cube", Mesh::cube(Vec4::ONE), 0);
    assert!(matches!(engine.add_object(world, cube), Err(Error::InvalidResource(_))));

    let panel = engine.add_panel(ui, PanelRect::new(0.0, 0.0, 0.5, 0.5), Vec4::new(0.2, 0.2, 0.2, 0.8), 0);
    assert!(matches!(panel, Err(Error::InvalidResource(_))));

    assert!(matches!(engine.set_visible(world, 0, false), Err(Error::InvalidResource(_))));
    assert!(engine.scene(world).unwrap().is_empty());
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_integration_scene_texture() {
    let mut engine = create_test_engine(test_config()).unwrap();
    let world = engine.create_scene("world").unwrap();

    let checker: Vec<u8> = (0..16u32)
        .flat_map(|i| if (i + i / 4) % 2 == 0 { [255, 255, 255, 255] } else { [0, 0, 0, 255] })
        .collect();
    let index = engine
        .add_texture(
            world,
            TextureDesc {
                width: 4,
                height: 4,
                format: TextureFormat::R8G8B8A8_SRGB,
                usage: TextureUsage::Sampled,
                data: Some(checker),
                label: "checker".to_string(),
            },
            SamplerType::NearestClamp,
        )
        .unwrap();

    assert_eq!(index, 0);
    let textures = engine.scene(world).unwrap().texture_sets();
    assert_eq!(textures.len(), 1);
    assert_eq!(textures[0].binding_group.set_index(), 1);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_integration_camera_update() {
    let mut engine = create_test_engine(test_config()).unwrap();
    let world = engine.create_scene("world").unwrap();

    let camera = engine.scene_mut(world).unwrap().camera_mut();
    camera.look_at(Vec3::new(0.0, 2.0, 5.0), Vec3::ZERO, Vec3::Y);
    camera.set_aspect(16.0 / 9.0);

    let view = engine.scene(world).unwrap().camera().view();
    let eye = view.inverse().transform_point3(Vec3::ZERO);
    assert!((eye - Vec3::new(0.0, 2.0, 5.0)).length() < 1e-4);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_integration_minimized_surface_skips_frame() {
    let mut engine = create_test_engine(test_config()).unwrap();
    engine.create_scene("world").unwrap();

    engine.resize(0, 0);
    let outcome = engine.draw_frame().unwrap();

    assert_eq!(outcome, FrameOutcome::NeedsRebuild);
    assert_eq!(engine.frame_counter(), 0);
    assert_eq!(engine.stats().surface_rebuilds, 0);
}
