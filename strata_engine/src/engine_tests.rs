//! Unit tests for engine.rs, driven through the mock device

use super::*;
use crate::graphics_device::mock_graphics_device::{MockGraphicsDevice, MockShaderLoader};
use crate::graphics_device::TextureUsage;
use crate::scene::Mesh;
use std::sync::atomic::{AtomicU32, Ordering};

struct Setup {
    device: Arc<MockGraphicsDevice>,
    recreate_count: Arc<AtomicU32>,
    fail_next_acquire: Arc<std::sync::atomic::AtomicBool>,
    engine: Engine,
}

fn setup(config: EngineConfig) -> Setup {
    let device = Arc::new(MockGraphicsDevice::new());
    let swapchain = device.swapchain(3, 800, 600);
    let recreate_count = swapchain.recreate_count.clone();
    let fail_next_acquire = swapchain.fail_next_acquire.clone();
    let engine = Engine::new(
        EngineContext::with_default_logger(),
        config,
        device.clone(),
        Box::new(swapchain),
    )
    .unwrap();
    Setup { device, recreate_count, fail_next_acquire, engine }
}

fn with_world(setup: &mut Setup, objects: usize) -> SceneKey {
    let attachments = setup.engine.surface_attachments(Some(TextureFormat::D32_FLOAT));
    let pipeline = setup
        .engine
        .add_pipeline(&MockShaderLoader::new(), PipelineSpec::new("mesh", "mesh.vert", "mesh.frag", attachments))
        .unwrap();
    let world = setup.engine.create_scene("world").unwrap();
    for i in 0..objects {
        setup
            .engine
            .add_object(world, ObjectDesc::new(format!("cube{}", i), Mesh::cube(Vec4::ONE), pipeline))
            .unwrap();
    }
    world
}

#[test]
fn test_invalid_config_creates_nothing() {
    let device = Arc::new(MockGraphicsDevice::new());
    let config = EngineConfig { frames_in_flight: 0, ..EngineConfig::default() };
    let result = Engine::new(
        EngineContext::with_default_logger(),
        config,
        device.clone(),
        Box::new(device.swapchain(2, 64, 64)),
    );
    assert!(matches!(result, Err(Error::InitializationFailed(_))));
    assert!(device.events().is_empty());
}

#[test]
fn test_bad_device_alignment_is_fatal() {
    let device = Arc::new(MockGraphicsDevice::with_alignment(48));
    let result = Engine::new(
        EngineContext::with_default_logger(),
        EngineConfig::default(),
        device.clone(),
        Box::new(device.swapchain(2, 64, 64)),
    );
    assert!(matches!(result, Err(Error::AlignmentMisconfigured(_))));
}

#[test]
fn test_layout_follows_device_alignment() {
    let setup = setup(EngineConfig { max_objects_per_scene: 10, ..EngineConfig::default() });
    assert_eq!(setup.engine.layout().stride(), 256);
    assert_eq!(setup.engine.layout().buffer_size(), 2560);
}

#[test]
fn test_draw_frame_presents_and_records_stats() {
    let mut setup = setup(EngineConfig::default());
    let world = with_world(&mut setup, 3);
    setup.engine.set_visible(world, 2, false).unwrap();

    let outcome = setup.engine.draw_frame().unwrap();
    match outcome {
        FrameOutcome::Presented { image_index, stats, suboptimal } => {
            assert_eq!(image_index, 0);
            assert!(!suboptimal);
            assert_eq!(stats.draw_calls, 2);
            assert_eq!(stats.triangles, 24);
            assert_eq!(stats.hidden_skipped, 1);
        }
        FrameOutcome::NeedsRebuild => panic!("frame was not presented"),
    }
    let stats = setup.engine.stats();
    assert_eq!(stats.frames_presented, 1);
    assert_eq!(stats.draw_calls, 2);
    assert_eq!(setup.engine.frame_counter(), 1);
}

#[test]
fn test_many_frames_cycle_slots() {
    let mut setup = setup(EngineConfig { frames_in_flight: 3, ..EngineConfig::default() });
    with_world(&mut setup, 1);
    for _ in 0..10 {
        assert!(matches!(setup.engine.draw_frame().unwrap(), FrameOutcome::Presented { .. }));
    }
    assert_eq!(setup.engine.stats().frames_presented, 10);
    let submits = setup.device.events().iter().filter(|e| *e == "submit").count();
    assert_eq!(submits, 10);
}

#[test]
fn test_stale_surface_is_rebuilt_at_next_frame() {
    let mut setup = setup(EngineConfig::default());
    with_world(&mut setup, 1);
    setup.engine.draw_frame().unwrap();

    setup.fail_next_acquire.store(true, Ordering::SeqCst);
    assert_eq!(setup.engine.draw_frame().unwrap(), FrameOutcome::NeedsRebuild);
    assert_eq!(setup.recreate_count.load(Ordering::SeqCst), 0);

    assert!(matches!(setup.engine.draw_frame().unwrap(), FrameOutcome::Presented { .. }));
    assert_eq!(setup.recreate_count.load(Ordering::SeqCst), 1);
    let stats = setup.engine.stats();
    assert_eq!(stats.frames_abandoned, 1);
    assert_eq!(stats.surface_rebuilds, 1);
    assert_eq!(stats.frames_presented, 2);
}

#[test]
fn test_resize_rebuilds_and_minimized_surface_skips_frames() {
    let mut setup = setup(EngineConfig::default());
    with_world(&mut setup, 1);

    setup.engine.resize(0, 0);
    setup.device.clear_events();
    assert_eq!(setup.engine.draw_frame().unwrap(), FrameOutcome::NeedsRebuild);
    assert!(setup.device.events().is_empty());

    setup.engine.resize(1024, 768);
    assert!(matches!(setup.engine.draw_frame().unwrap(), FrameOutcome::Presented { .. }));
    assert!(setup.device.events().contains(&"recreate:1024x768".to_string()));
    assert_eq!(setup.recreate_count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_add_object_checks_pipeline_index() {
    let mut setup = setup(EngineConfig::default());
    let world = with_world(&mut setup, 0);
    let err = setup
        .engine
        .add_object(world, ObjectDesc::new("orphan", Mesh::quad(Vec4::ONE), 5))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidResource(_)));
}

#[test]
fn test_capacity_is_per_scene() {
    let mut setup = setup(EngineConfig { max_objects_per_scene: 2, ..EngineConfig::default() });
    let world = with_world(&mut setup, 2);
    let err = setup
        .engine
        .add_object(world, ObjectDesc::new("extra", Mesh::quad(Vec4::ONE), 0))
        .unwrap_err();
    assert!(matches!(err, Error::CapacityExceeded { position: 2, capacity: 2 }));

    let other = setup.engine.create_scene("other").unwrap();
    assert_eq!(setup.engine.add_object(other, ObjectDesc::new("a", Mesh::quad(Vec4::ONE), 0)).unwrap(), 0);
}

#[test]
fn test_ui_scene_panels() {
    let mut setup = setup(EngineConfig::default());
    with_world(&mut setup, 1);
    let attachments = setup.engine.surface_attachments(None);
    let ui_pipeline = setup
        .engine
        .add_pipeline(&MockShaderLoader::new(), PipelineSpec::new("ui", "ui.vert", "ui.frag", attachments))
        .unwrap();
    let hud = setup.engine.create_ui_scene("hud").unwrap();
    let panel = setup
        .engine
        .add_panel(hud, PanelRect::new(0.0, 0.0, 0.25, 0.1), Vec4::ONE, ui_pipeline)
        .unwrap();
    assert!(setup.engine.scene_mut(hud).is_none());
    assert!(setup.engine.add_object(hud, ObjectDesc::new("x", Mesh::quad(Vec4::ONE), 0)).is_err());

    setup.engine.set_panel_visible(hud, panel, false).unwrap();
    match setup.engine.draw_frame().unwrap() {
        FrameOutcome::Presented { stats, .. } => {
            assert_eq!(stats.draw_calls, 1);
            assert_eq!(stats.hidden_skipped, 1);
            assert_eq!(stats.render_passes, 1);
        }
        other => panic!("unexpected {:?}", other),
    }

    setup.engine.set_panel_visible(hud, panel, true).unwrap();
    match setup.engine.draw_frame().unwrap() {
        FrameOutcome::Presented { stats, .. } => assert_eq!(stats.render_passes, 2),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_textures_are_registered_per_scene() {
    let mut setup = setup(EngineConfig::default());
    let world = with_world(&mut setup, 0);
    let desc = TextureDesc {
        width: 2,
        height: 2,
        format: TextureFormat::R8G8B8A8_SRGB,
        usage: TextureUsage::Sampled,
        data: Some(vec![128; 16]),
        label: "grey".to_string(),
    };
    assert_eq!(setup.engine.add_texture(world, desc, SamplerType::NearestClamp).unwrap(), 0);
    assert_eq!(setup.engine.scene(world).unwrap().texture_sets().len(), 1);
}

#[test]
fn test_remove_scene_drains_first() {
    let mut setup = setup(EngineConfig::default());
    let world = with_world(&mut setup, 1);
    setup.engine.draw_frame().unwrap();
    setup.device.clear_events();

    setup.engine.remove_scene(world).unwrap();
    assert!(setup.device.events().iter().any(|e| e.starts_with("wait_fence")));
    assert!(setup.engine.scene(world).is_none());
    assert!(setup.engine.remove_scene(world).is_err());
}

#[test]
fn test_adding_pipeline_after_first_frame_rebuilds_targets() {
    let mut setup = setup(EngineConfig::default());
    with_world(&mut setup, 1);
    setup.engine.draw_frame().unwrap();

    let attachments = setup.engine.surface_attachments(None);
    setup
        .engine
        .add_pipeline(&MockShaderLoader::new(), PipelineSpec::new("flat", "f.vert", "f.frag", attachments))
        .unwrap();
    let hud = setup.engine.create_scene("hud").unwrap();
    setup.engine.add_object(hud, ObjectDesc::new("q", Mesh::quad(Vec4::ONE), 1)).unwrap();

    match setup.engine.draw_frame().unwrap() {
        FrameOutcome::Presented { stats, .. } => assert_eq!(stats.render_passes, 2),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_drop_drains_and_waits_idle() {
    let mut setup = setup(EngineConfig::default());
    with_world(&mut setup, 1);
    setup.engine.draw_frame().unwrap();
    let device = setup.device.clone();
    device.clear_events();

    drop(setup);
    let events = device.events();
    assert!(events.iter().any(|e| e.starts_with("wait_fence")));
    assert!(events.contains(&"wait_idle".to_string()));
}

#[test]
fn test_adding_pipeline_drains_before_releasing_targets() {
    let mut setup = setup(EngineConfig::default());
    with_world(&mut setup, 1);
    setup.engine.draw_frame().unwrap();
    setup.device.clear_events();

    let attachments = setup.engine.surface_attachments(None);
    setup
        .engine
        .add_pipeline(&MockShaderLoader::new(), PipelineSpec::new("flat", "f.vert", "f.frag", attachments))
        .unwrap();

    let events = setup.device.events();
    let first_wait = events.iter().position(|e| e.starts_with("wait_fence")).unwrap();
    let first_release = events.iter().position(|e| e == "destroy_framebuffer").unwrap();
    assert!(first_wait < first_release, "framebuffers released before the frame using them finished");
}

#[test]
fn test_textured_pipeline_requires_texture_on_add() {
    let mut setup = setup(EngineConfig::default());
    let attachments = setup.engine.surface_attachments(Some(TextureFormat::D32_FLOAT));
    let textured = setup
        .engine
        .add_pipeline(&MockShaderLoader::new(), PipelineSpec::new("tex", "t.vert", "t.frag", attachments).textured())
        .unwrap();
    let world = setup.engine.create_scene("world").unwrap();

    let err = setup
        .engine
        .add_object(world, ObjectDesc::new("bare", Mesh::cube(Vec4::ONE), textured))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidResource(_)));
    assert!(setup.engine.scene(world).unwrap().is_empty());

    let desc = TextureDesc {
        width: 1,
        height: 1,
        format: TextureFormat::R8G8B8A8_SRGB,
        usage: TextureUsage::Sampled,
        data: Some(vec![255; 4]),
        label: "white".to_string(),
    };
    let texture = setup.engine.add_texture(world, desc, SamplerType::LinearRepeat).unwrap();
    let desc = ObjectDesc::new("crate", Mesh::cube(Vec4::ONE), textured).with_texture(texture);
    assert_eq!(setup.engine.add_object(world, desc).unwrap(), 0);
    assert!(matches!(setup.engine.draw_frame().unwrap(), FrameOutcome::Presented { .. }));
}

#[test]
fn test_failed_frame_rebuilds_surface_before_next_frame() {
    let mut setup = setup(EngineConfig::default());
    let attachments = setup.engine.surface_attachments(Some(TextureFormat::D32_FLOAT));
    let textured = setup
        .engine
        .add_pipeline(&MockShaderLoader::new(), PipelineSpec::new("tex", "t.vert", "t.frag", attachments).textured())
        .unwrap();
    let world = setup.engine.create_scene("world").unwrap();
    // Straight into the scene, so the failure only shows up while recording
    let device = setup.device.clone();
    setup
        .engine
        .scene_mut(world)
        .unwrap()
        .add_object(device.as_ref(), ObjectDesc::new("bare", Mesh::cube(Vec4::ONE), textured))
        .unwrap();

    assert!(matches!(setup.engine.draw_frame(), Err(Error::InvalidResource(_))));
    assert_eq!(setup.engine.frame_counter(), 0);
    assert_eq!(setup.recreate_count.load(Ordering::SeqCst), 0);

    // The image acquired by the failed frame comes back with the rebuilt surface
    setup.engine.remove_scene(world).unwrap();
    assert!(matches!(setup.engine.draw_frame().unwrap(), FrameOutcome::Presented { .. }));
    assert_eq!(setup.recreate_count.load(Ordering::SeqCst), 1);
    assert_eq!(setup.engine.stats().surface_rebuilds, 1);
}
