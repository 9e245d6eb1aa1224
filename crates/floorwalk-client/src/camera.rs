use glam::{Mat4, Vec2, Vec3};

use crate::config::CameraConfig;

/// Orthographic camera looking at `target`.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical extent of the view volume at zoom 1.0.
    pub frustum_size: f32,
    pub aspect: f32,
    pub zoom: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            position: Vec3::from(config.position),
            target: Vec3::from(config.target),
            up: Vec3::Y,
            frustum_size: config.frustum_size,
            aspect: 1.0,
            zoom: 1.0,
            near: config.near,
            far: config.far,
        }
    }

    /// Unit look direction.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    /// Look direction flattened onto the ground plane. Falls back to -Z when
    /// the camera looks straight down.
    pub fn ground_forward(&self) -> Vec3 {
        let f = self.forward();
        let flat = Vec3::new(f.x, 0.0, f.z).normalize_or_zero();
        if flat == Vec3::ZERO {
            Vec3::NEG_Z
        } else {
            flat
        }
    }

    /// Screen-right on the ground plane.
    pub fn ground_right(&self) -> Vec3 {
        self.ground_forward().cross(Vec3::Y).normalize_or_zero()
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection(&self) -> Mat4 {
        let zoom = if self.zoom > 0.0 { self.zoom } else { 1.0 };
        let half_h = self.frustum_size / 2.0 / zoom;
        let half_w = half_h * self.aspect;
        Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Ray through a normalized-device point: origin on the near plane and a
    /// unit direction toward the far plane.
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Option<(Vec3, Vec3, f32)> {
        let inv = self.view_projection().inverse();
        if !inv.is_finite() {
            return None;
        }
        let near = inv.project_point3(Vec3::new(ndc.x, ndc.y, 0.0));
        let far = inv.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        let span = far - near;
        let length = span.length();
        if length <= f32::EPSILON || !length.is_finite() {
            return None;
        }
        Some((near, span / length, length))
    }

    /// Project a world point to normalized device coordinates.
    pub fn world_to_ndc(&self, point: Vec3) -> Vec2 {
        let p = self.view_projection().project_point3(point);
        Vec2::new(p.x, p.y)
    }
}

/// Damped orbit controls state. Only the parts the engine reads.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub enabled: bool,
}

impl OrbitControls {
    pub fn new() -> Self {
        Self { enabled: true }
    }

    /// A joystick drag disables orbiting until the pointer is released.
    pub fn begin_drag(&mut self) {
        self.enabled = false;
    }

    pub fn end_drag(&mut self) {
        self.enabled = true;
    }
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new()
    }
}
