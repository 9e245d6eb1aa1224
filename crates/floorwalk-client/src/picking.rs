use glam::Vec3;

use floorwalk_core::components::Tag;

use crate::builder::GeometryBuilder;
use crate::host::SceneHost;

/// A resolved pick.
#[derive(Debug, Clone)]
pub struct PickHit {
    pub tag: Tag,
    pub entity: hecs::Entity,
    pub distance: f32,
    pub point: Vec3,
}

/// Why a click produced no hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickSkip {
    DetailOpen,
    ControlsDisabled,
    ViewportUnmeasured,
    Miss,
}

/// Screen click to tagged entity, via a ray against floor quads, doors and
/// objects. Walls are never candidates.
pub struct PickingController;

impl PickingController {
    pub fn new() -> Self {
        Self
    }

    pub fn handle_click(
        &self,
        screen_x: f32,
        screen_y: f32,
        host: &SceneHost,
        builder: &GeometryBuilder,
        detail_open: bool,
    ) -> Result<PickHit, PickSkip> {
        if detail_open {
            return Err(PickSkip::DetailOpen);
        }
        if !host.controls.enabled {
            return Err(PickSkip::ControlsDisabled);
        }
        let ndc = host
            .screen_to_ndc(screen_x, screen_y)
            .ok_or(PickSkip::ViewportUnmeasured)?;
        let (origin, direction, reach) = host
            .camera
            .ray_from_ndc(ndc)
            .ok_or(PickSkip::ViewportUnmeasured)?;

        let scene = &builder.scene;
        let hit = builder
            .index
            .cast_ray(origin, direction, reach, |entity| !scene.is_wall(entity))
            .ok_or(PickSkip::Miss)?;
        let tag = scene.tag(hit.entity).ok_or(PickSkip::Miss)?;

        tracing::debug!(
            "Picked {} '{}' at distance {:.2}",
            tag.kind().as_str(),
            tag.id(),
            hit.toi
        );
        Ok(PickHit {
            tag,
            entity: hit.entity,
            distance: hit.toi,
            point: hit.point,
        })
    }
}

impl Default for PickingController {
    fn default() -> Self {
        Self::new()
    }
}
