/// UiScene — a scene of flat, screen-space panels
///
/// Owns a generic [`Scene`] with an orthographic camera spanning the unit
/// square (origin top-left, y down) and exposes only panel operations.

use glam::{Mat4, Vec3, Vec4};
use crate::error::Result;
use crate::frame::DynamicBlockLayout;
use crate::graphics_device::GraphicsDevice;
use super::camera::Camera;
use super::mesh::Mesh;
use super::render_object::ObjectDesc;
use super::scene::Scene;

/// Panel rectangle in unit-square coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PanelRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Model matrix placing the unit quad over this rectangle
    pub fn transform(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(self.x + self.width * 0.5, self.y + self.height * 0.5, 0.0))
            * Mat4::from_scale(Vec3::new(self.width, self.height, 1.0))
    }
}

/// Handle to a panel (its position in the underlying scene)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PanelId(usize);

pub struct UiScene {
    scene: Scene,
}

impl UiScene {
    pub fn new(
        device: &dyn GraphicsDevice,
        name: impl Into<String>,
        layout: DynamicBlockLayout,
        frames_in_flight: usize,
    ) -> Result<Self> {
        let mut scene = Scene::new(device, name, layout, frames_in_flight)?;
        // Bottom/top swapped so y grows downward once the upload flip is applied
        *scene.camera_mut() = Camera::orthographic(0.0, 1.0, 1.0, 0.0, -1.0, 1.0);
        Ok(Self { scene })
    }

    /// Add a solid-color panel drawn with `pipeline`
    pub fn add_panel(
        &mut self,
        device: &dyn GraphicsDevice,
        rect: PanelRect,
        color: Vec4,
        pipeline: usize,
    ) -> Result<PanelId> {
        let label = format!("panel{}", self.scene.len());
        let desc = ObjectDesc::new(label, Mesh::quad(color), pipeline).with_transform(rect.transform());
        self.scene.add_object(device, desc).map(PanelId)
    }

    pub fn set_panel_visible(&mut self, panel: PanelId, visible: bool) -> Result<()> {
        self.scene.set_visible(panel.0, visible)
    }

    pub fn panel_count(&self) -> usize {
        self.scene.len()
    }

    pub(crate) fn scene(&self) -> &Scene {
        &self.scene
    }
}

#[cfg(test)]
#[path = "ui_scene_tests.rs"]
mod tests;
