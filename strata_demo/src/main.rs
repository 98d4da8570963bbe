//! Strata demo - spinning cubes under a translucent HUD
//!
//! Shaders are loaded as compiled SPIR-V from `strata_demo/shaders`
//! (see the README there). Space toggles the HUD, Escape quits.
//!
//! Run with: RUST_LOG=info cargo run -p strata_demo

use std::sync::Arc;
use std::time::Instant;

use glam::{Mat4, Quat, Vec3, Vec4};
use log::{error, info, warn};
use strata_engine::strata::frame::FrameOutcome;
use strata_engine::strata::log::LogFacadeLogger;
use strata_engine::strata::pipeline::{FileShaderLoader, OutputRegion, PipelineSpec};
use strata_engine::strata::render::{BlendMode, CullMode, TextureFormat};
use strata_engine::strata::scene::{Mesh, ObjectDesc, PanelId, PanelRect, SceneKey};
use strata_engine::strata::{Engine, EngineConfig, EngineContext, Result};
use strata_engine_renderer_vulkan::strata::{print_validation_report, VulkanGraphicsDevice};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

const CUBES_PER_ROW: usize = 5;
const DEPTH_FORMAT: TextureFormat = TextureFormat::D32_FLOAT;

/// Scenes and handles the demo animates
struct DemoScene {
    world: SceneKey,
    hud: SceneKey,
    hud_panels: Vec<PanelId>,
    hud_visible: bool,
}

/// Field order is drop order: the engine releases its swapchain before the
/// device goes away, and the window outlives the surface.
struct App {
    engine: Option<Engine>,
    scene: Option<DemoScene>,
    device: Option<Arc<VulkanGraphicsDevice>>,
    window: Option<Window>,
    start: Instant,
    frames: u64,
}

impl App {
    fn new() -> Self {
        Self {
            engine: None,
            scene: None,
            device: None,
            window: None,
            start: Instant::now(),
            frames: 0,
        }
    }

    fn init(&mut self, window: Window) -> Result<()> {
        let ctx = EngineContext::new(Arc::new(LogFacadeLogger));
        let config = EngineConfig {
            app_name: "Strata Demo".to_string(),
            ..EngineConfig::default()
        };

        let size = window.inner_size();
        let device = Arc::new(VulkanGraphicsDevice::new(&window, &config, Arc::clone(&ctx))?);
        let swapchain = device.create_swapchain(size.width, size.height, config.vsync)?;
        let mut engine = Engine::new(ctx, config, device.clone(), Box::new(swapchain))?;

        let scene = build_scene(&mut engine, size.width as f32 / size.height.max(1) as f32)?;

        self.engine = Some(engine);
        self.scene = Some(scene);
        self.device = Some(device);
        self.window = Some(window);
        Ok(())
    }

    fn animate(&mut self) {
        let (Some(engine), Some(scene)) = (self.engine.as_mut(), self.scene.as_ref()) else {
            return;
        };
        let t = self.start.elapsed().as_secs_f32();
        if let Some(world) = engine.scene_mut(scene.world) {
            for position in 0..world.len() {
                let base = cube_position(position);
                let spin = Quat::from_rotation_y(t + position as f32 * 0.4) * Quat::from_rotation_x(t * 0.5);
                let bob = Vec3::new(0.0, (t * 2.0 + position as f32).sin() * 0.15, 0.0);
                if let Some(object) = world.object_mut(position) {
                    object.set_transform(Mat4::from_rotation_translation(spin, base + bob) * Mat4::from_scale(Vec3::splat(0.6)));
                }
            }
        }
    }

    fn toggle_hud(&mut self) -> Result<()> {
        let (Some(engine), Some(scene)) = (self.engine.as_mut(), self.scene.as_mut()) else {
            return Ok(());
        };
        scene.hud_visible = !scene.hud_visible;
        for panel in &scene.hud_panels {
            engine.set_panel_visible(scene.hud, *panel, scene.hud_visible)?;
        }
        info!("HUD {}", if scene.hud_visible { "shown" } else { "hidden" });
        Ok(())
    }

    /// Draw one frame; errors other than a stale surface end the run
    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        self.animate();
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        match engine.draw_frame() {
            Ok(FrameOutcome::Presented { stats, .. }) => {
                self.frames += 1;
                if self.frames % 600 == 0 {
                    info!("Frame {}: {} draws, {} triangles, {} passes",
                        engine.frame_counter(), stats.draw_calls, stats.triangles, stats.render_passes);
                }
            }
            Ok(FrameOutcome::NeedsRebuild) => {}
            Err(e) => {
                error!("Frame failed, shutting down: {}", e);
                event_loop.exit();
            }
        }
    }

    fn shutdown(&mut self) {
        let stats = self.engine.as_ref().map(|engine| engine.stats());
        self.scene = None;
        self.engine = None;
        if let Some(stats) = stats {
            info!("Presented {} frames ({} abandoned, {} surface rebuilds)",
                stats.frames_presented, stats.frames_abandoned, stats.surface_rebuilds);
        }
        if let Some(report) = self.device.as_ref().and_then(|device| device.validation_stats()) {
            print_validation_report(&report);
        }
        self.device = None;
    }
}

fn shader_loader() -> FileShaderLoader {
    let in_workspace = std::path::Path::new("strata_demo/shaders");
    if in_workspace.is_dir() {
        FileShaderLoader::new(in_workspace)
    } else {
        FileShaderLoader::new("shaders")
    }
}

fn cube_position(position: usize) -> Vec3 {
    let column = (position % CUBES_PER_ROW) as f32 - (CUBES_PER_ROW as f32 - 1.0) * 0.5;
    let row = (position / CUBES_PER_ROW) as f32;
    Vec3::new(column * 1.5, 0.0, -row * 1.5)
}

fn build_scene(engine: &mut Engine, aspect: f32) -> Result<DemoScene> {
    let loader = shader_loader();
    info!("Loading shaders from {}", loader.root().display());

    let mesh_pipeline = engine.add_pipeline(
        &loader,
        PipelineSpec::new("mesh", "mesh.vert.spv", "mesh.frag.spv", engine.surface_attachments(Some(DEPTH_FORMAT))),
    )?;
    let ui_pipeline = engine.add_pipeline(
        &loader,
        PipelineSpec::new("ui", "ui.vert.spv", "ui.frag.spv", engine.surface_attachments(None))
            .with_cull_mode(CullMode::None)
            .with_blend(BlendMode::AlphaBlend),
    )?;
    // Same shaders drawn into the top-right quarter of the surface
    let minimap_pipeline = engine.add_pipeline(
        &loader,
        PipelineSpec::new("minimap", "ui.vert.spv", "ui.frag.spv", engine.surface_attachments(None))
            .with_cull_mode(CullMode::None)
            .with_region(OutputRegion::Fraction { x: 0.75, y: 0.0, width: 0.25, height: 0.25 }),
    )?;

    let world = engine.create_scene("world")?;
    if let Some(scene) = engine.scene_mut(world) {
        let camera = scene.camera_mut();
        camera.look_at(Vec3::new(0.0, 3.0, 6.0), Vec3::new(0.0, 0.0, -2.0), Vec3::Y);
        camera.set_aspect(aspect);
    }
    for position in 0..CUBES_PER_ROW * 3 {
        let hue = position as f32 / (CUBES_PER_ROW * 3) as f32;
        let color = Vec4::new(0.3 + 0.7 * hue, 0.5, 1.0 - 0.7 * hue, 1.0);
        let desc = ObjectDesc::new(format!("cube{}", position), Mesh::cube(color), mesh_pipeline)
            .with_transform(Mat4::from_translation(cube_position(position)));
        engine.add_object(world, desc)?;
    }

    let hud = engine.create_ui_scene("hud")?;
    let hud_panels = vec![
        engine.add_panel(hud, PanelRect::new(0.02, 0.02, 0.30, 0.08), Vec4::new(0.1, 0.1, 0.1, 0.7), ui_pipeline)?,
        engine.add_panel(hud, PanelRect::new(0.02, 0.90, 0.96, 0.08), Vec4::new(0.1, 0.3, 0.5, 0.6), ui_pipeline)?,
        engine.add_panel(hud, PanelRect::new(0.0, 0.0, 1.0, 1.0), Vec4::new(0.05, 0.25, 0.1, 1.0), minimap_pipeline)?,
    ];

    info!("Scene ready: {} cubes, {} HUD panels", CUBES_PER_ROW * 3, hud_panels.len());
    Ok(DemoScene { world, hud, hud_panels, hud_visible: true })
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attributes = Window::default_attributes()
            .with_title("Strata Demo")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => window,
            Err(e) => {
                error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };
        match self.init(window) {
            Ok(()) => {
                info!("Initialization complete, entering main loop");
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            Err(e) => {
                error!("Failed to initialize: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let (Some(engine), Some(scene)) = (self.engine.as_mut(), self.scene.as_ref()) {
                    engine.resize(size.width, size.height);
                    if size.height > 0 {
                        if let Some(world) = engine.scene_mut(scene.world) {
                            world.camera_mut().set_aspect(size.width as f32 / size.height as f32);
                        }
                    }
                }
            }
            WindowEvent::KeyboardInput {
                event: KeyEvent { physical_key: PhysicalKey::Code(code), state: ElementState::Pressed, repeat: false, .. },
                ..
            } => match code {
                KeyCode::Escape => event_loop.exit(),
                KeyCode::Space => {
                    if let Err(e) = self.toggle_hud() {
                        warn!("Cannot toggle HUD: {}", e);
                    }
                }
                _ => {}
            },
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if event_loop.exiting() {
                    return;
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            error!("Failed to create event loop: {}", e);
            return;
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    if let Err(e) = event_loop.run_app(&mut app) {
        error!("Event loop error: {}", e);
    }
}
