//! Scene host: render surface rectangle, camera and orbit controls.

use glam::{Vec2, Vec3};

use floorwalk_core::floor::Color;

use crate::camera::{Camera, OrbitControls};
use crate::config::{CameraConfig, ColorConfig};

/// Render surface rectangle in client pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn is_measured(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }
}

pub struct SceneHost {
    pub camera: Camera,
    pub controls: OrbitControls,
    viewport: Viewport,
    follow_offset: Vec3,
    ground: Color,
}

impl SceneHost {
    pub fn new(camera: &CameraConfig, colors: &ColorConfig) -> Self {
        Self {
            camera: Camera::from_config(camera),
            controls: OrbitControls::new(),
            viewport: Viewport::default(),
            follow_offset: Vec3::from(camera.follow_offset),
            ground: colors.ground,
        }
    }

    /// Apply a new surface size. A non-positive dimension leaves the
    /// projection untouched and returns false.
    pub fn resize(&mut self, width: f32, height: f32) -> bool {
        if !(width > 0.0 && height > 0.0) {
            tracing::debug!("Ignoring resize to {}x{}", width, height);
            return false;
        }
        self.viewport.width = width;
        self.viewport.height = height;
        self.camera.aspect = width / height;
        true
    }

    /// Move the surface within the client area.
    pub fn set_origin(&mut self, left: f32, top: f32) {
        self.viewport.left = left;
        self.viewport.top = top;
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Client pixel to normalized device coordinates. `None` until measured.
    pub fn screen_to_ndc(&self, x: f32, y: f32) -> Option<Vec2> {
        if !self.viewport.is_measured() {
            return None;
        }
        let vp = self.viewport;
        Some(Vec2::new(
            (x - vp.left) / vp.width * 2.0 - 1.0,
            -((y - vp.top) / vp.height) * 2.0 + 1.0,
        ))
    }

    /// Ease the camera toward `look_at` plus the follow offset.
    pub fn follow(&mut self, look_at: Vec3, alpha: f32) {
        let alpha = alpha.clamp(0.0, 1.0);
        let desired = look_at + self.follow_offset;
        self.camera.position = self.camera.position.lerp(desired, alpha);
        self.camera.target = self.camera.target.lerp(look_at, alpha);
    }

    /// Jump the camera straight onto `look_at`.
    pub fn snap_to(&mut self, look_at: Vec3) {
        self.camera.position = look_at + self.follow_offset;
        self.camera.target = look_at;
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.camera.zoom = zoom;
    }

    pub fn set_ground_color(&mut self, color: Color) {
        self.ground = color;
    }

    pub fn ground_color(&self) -> Color {
        self.ground
    }
}
