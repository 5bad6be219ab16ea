use super::SurfaceSize;
use crate::scene::Axis;
use glam::{Mat4, Vec3};

/// Perspective camera looking down -Z from `position`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PerspectiveCamera {
    pub fov_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            fov_deg: 35.0,
            aspect: 1.0,
            near: 0.1,
            far: 1000.0,
            position: Vec3::new(0.0, 0.0, 407.0),
        }
    }
}

impl PerspectiveCamera {
    pub fn set_aspect(&mut self, size: SurfaceSize) {
        self.aspect = size.aspect();
    }

    pub fn set_position_axis(&mut self, axis: Axis, value: f32) {
        self.position[axis.index()] = value;
    }

    pub fn position_axis(&self, axis: Axis) -> f32 {
        self.position[axis.index()]
    }

    pub fn projection(&self) -> Mat4 {
        let aspect = if self.aspect.is_finite() && self.aspect > 0.0 {
            self.aspect
        } else {
            1.0
        };
        Mat4::perspective_rh(self.fov_deg.to_radians(), aspect, self.near, self.far)
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, Vec3::NEG_Z, Vec3::Y)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }
}
