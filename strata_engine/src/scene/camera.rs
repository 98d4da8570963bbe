/// Camera — view and projection shared by every object of a scene
///
/// Matrices follow the right-handed, zero-to-one depth convention. The
/// clip-space Y flip needed by the presentation backend is applied only when
/// the camera is turned into a [`CameraBlock`] for upload.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Projection parameters kept so the aspect ratio can follow the surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Perspective { fov_y: f32, aspect: f32, near: f32, far: f32 },
    Orthographic { left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32 },
}

impl Projection {
    pub fn matrix(&self) -> Mat4 {
        match *self {
            Projection::Perspective { fov_y, aspect, near, far } => {
                Mat4::perspective_rh(fov_y, aspect, near, far)
            }
            Projection::Orthographic { left, right, bottom, top, near, far } => {
                Mat4::orthographic_rh(left, right, bottom, top, near, far)
            }
        }
    }
}

/// Uniform block read by the vertex shader at set 0, binding 0
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraBlock {
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    view: Mat4,
    projection: Projection,
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(std::f32::consts::FRAC_PI_4, 16.0 / 9.0, 0.1, 100.0)
    }
}

impl Camera {
    /// Perspective camera at the origin looking down -Z
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Projection::Perspective { fov_y, aspect, near, far },
        }
    }

    /// Orthographic camera with an identity view
    pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Projection::Orthographic { left, right, bottom, top, near, far },
        }
    }

    pub fn look_at(&mut self, eye: Vec3, target: Vec3, up: Vec3) {
        self.view = Mat4::look_at_rh(eye, target, up);
    }

    pub fn set_view(&mut self, view: Mat4) {
        self.view = view;
    }

    pub fn set_projection(&mut self, projection: Projection) {
        self.projection = projection;
    }

    /// Follow a new surface aspect ratio (perspective only)
    pub fn set_aspect(&mut self, new_aspect: f32) {
        if let Projection::Perspective { aspect, .. } = &mut self.projection {
            *aspect = new_aspect;
        }
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Block as uploaded to the device, with the clip-space Y axis flipped
    pub fn to_block(&self) -> CameraBlock {
        let mut projection = self.projection.matrix();
        projection.y_axis.y *= -1.0;
        CameraBlock {
            model: Mat4::IDENTITY,
            view: self.view,
            projection,
        }
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
