//! Scene-side state types shared with the front-end.
//!
//! These types avoid platform-specific APIs. The native front-end builds its
//! view/projection from [`Camera`] and the field maps normalized hand
//! coordinates into world space through [`Viewport`].

use crate::constants::{CAMERA_FOVY_DEG, CAMERA_Z};
use glam::{Mat4, Vec2, Vec3};

/// Simple right-handed camera description with perspective projection.
#[derive(Clone, Debug)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub aspect: f32,
    pub fovy_radians: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, CAMERA_Z),
            target: Vec3::ZERO,
            up: Vec3::Y,
            aspect: 16.0 / 9.0,
            fovy_radians: CAMERA_FOVY_DEG.to_radians(),
            znear: 0.1,
            zfar: 100.0,
        }
    }
}

impl Camera {
    /// Compute the clip-space projection matrix.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy_radians, self.aspect, self.znear, self.zfar)
    }
    /// Compute the view matrix that transforms world to view space.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// World-space size of the view frustum slice through `target`.
    pub fn viewport(&self) -> Viewport {
        let distance = self.eye.distance(self.target);
        let height = 2.0 * distance * (self.fovy_radians * 0.5).tan();
        Viewport {
            width: height * self.aspect,
            height,
        }
    }
}

/// Visible world extent at the focal plane (z = 0).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    /// Map a normalized screen position (origin top-left, y down) to world space.
    #[inline]
    pub fn to_world(&self, normalized: Vec2) -> Vec2 {
        Vec2::new(
            (normalized.x - 0.5) * self.width,
            -(normalized.y - 0.5) * self.height,
        )
    }
}
