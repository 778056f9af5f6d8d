//! Fly-through camera described by a position and two Euler angles.

use glam::{Mat4, Vec3};

/// Pitch is kept just short of straight up/down.
const MAX_PITCH: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// Camera with pitch (`x_rotation`) and yaw (`y_rotation`) in radians.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub x_rotation: f32,
    pub y_rotation: f32,
}

/// Perspective projection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width / height.
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(position: Vec3, x_rotation: f32, y_rotation: f32) -> Self {
        Self {
            position,
            x_rotation: x_rotation.clamp(-MAX_PITCH, MAX_PITCH),
            y_rotation,
        }
    }

    /// Rotation that takes world-space offsets into camera space.
    pub fn view_rotation(&self) -> Mat4 {
        Mat4::from_rotation_x(-self.x_rotation) * Mat4::from_rotation_y(-self.y_rotation)
    }

    /// Full view matrix (rotation after translation to the camera).
    pub fn view_matrix(&self) -> Mat4 {
        self.view_rotation() * Mat4::from_translation(-self.position)
    }

    /// Direction the camera looks along (-Z in camera space).
    pub fn forward(&self) -> Vec3 {
        self.view_rotation().inverse().transform_vector3(Vec3::NEG_Z)
    }

    /// Apply a pitch/yaw delta, clamping pitch.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.x_rotation = (self.x_rotation + dx).clamp(-MAX_PITCH, MAX_PITCH);
        self.y_rotation = (self.y_rotation + dy).rem_euclid(std::f32::consts::TAU);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 0.0, 0.0)
    }
}

impl Projection {
    /// Reverse-Z perspective matrix: `near` maps to 1 and `far` to 0.
    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect_ratio, self.far, self.near)
    }

    pub fn set_aspect_ratio(&mut self, width: u32, height: u32) {
        self.aspect_ratio = width.max(1) as f32 / height.max(1) as f32;
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_y: 60f32.to_radians(),
            aspect_ratio: 16.0 / 9.0,
            near: 0.1,
            far: 200.0,
        }
    }
}
