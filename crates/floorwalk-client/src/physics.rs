use std::collections::HashMap;

use glam::{Quat, Vec3};
use rapier3d::prelude::*;

/// World-space axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Overlap test. Touching faces count as intersecting.
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    fn from_aabb(aabb: &rapier3d::parry::bounding_volume::Aabb) -> Self {
        Self {
            min: Vec3::new(aabb.mins.x, aabb.mins.y, aabb.mins.z),
            max: Vec3::new(aabb.maxs.x, aabb.maxs.y, aabb.maxs.z),
        }
    }
}

/// A ray hit resolved back to its entity.
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    pub entity: hecs::Entity,
    pub toi: f32,
    pub point: Vec3,
}

/// Explicitly owned spatial index over the built floor.
///
/// Every primitive is a static cuboid collider. Ray queries go through the
/// rapier query pipeline; overlap tests use world AABBs computed once at
/// insertion, since nothing in the index ever moves.
pub struct SpatialIndex {
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub query_pipeline: QueryPipeline,

    pub collider_to_entity: HashMap<ColliderHandle, hecs::Entity>,
    bounds: HashMap<hecs::Entity, Bounds>,
    dirty: bool,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            query_pipeline: QueryPipeline::new(),
            collider_to_entity: HashMap::new(),
            bounds: HashMap::new(),
            dirty: false,
        }
    }

    /// Insert a static box (full extents `size`) for `entity`.
    pub fn add_static_box(
        &mut self,
        entity: hecs::Entity,
        position: Vec3,
        rotation: Quat,
        size: Vec3,
    ) -> ColliderHandle {
        let half = (size * 0.5).max(Vec3::ZERO);
        let collider = ColliderBuilder::cuboid(half.x, half.y, half.z)
            .translation(vector![position.x, position.y, position.z])
            .rotation(quat_to_angvector(rotation))
            .build();
        let aabb = collider.compute_aabb();
        let handle = self.collider_set.insert(collider);

        self.collider_to_entity.insert(handle, entity);
        self.bounds.insert(entity, Bounds::from_aabb(&aabb));
        self.dirty = true;
        handle
    }

    /// Cached world box of an entity's collider.
    pub fn bounds(&self, entity: hecs::Entity) -> Option<&Bounds> {
        self.bounds.get(&entity)
    }

    pub fn len(&self) -> usize {
        self.collider_set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collider_set.is_empty()
    }

    /// Refresh the query pipeline after insertions.
    pub fn update(&mut self) {
        if self.dirty {
            self.query_pipeline.update(&self.collider_set);
            self.dirty = false;
        }
    }

    /// Nearest hit along the ray among entities accepted by `accept`.
    pub fn cast_ray<F>(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        accept: F,
    ) -> Option<RayHit>
    where
        F: Fn(hecs::Entity) -> bool,
    {
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO {
            return None;
        }
        let ray = Ray::new(
            point![origin.x, origin.y, origin.z],
            vector![dir.x, dir.y, dir.z],
        );

        let predicate = |handle: ColliderHandle, _collider: &Collider| {
            self.collider_to_entity
                .get(&handle)
                .map_or(false, |&entity| accept(entity))
        };
        let filter = QueryFilter::default().predicate(&predicate);

        let (handle, toi) = self.query_pipeline.cast_ray(
            &self.rigid_body_set,
            &self.collider_set,
            &ray,
            max_distance,
            true,
            filter,
        )?;
        let entity = *self.collider_to_entity.get(&handle)?;
        Some(RayHit {
            entity,
            toi,
            point: origin + dir * toi,
        })
    }

    /// First entity in `candidates` whose box overlaps `query`.
    pub fn first_overlap<'a, I>(&self, query: &Bounds, candidates: I) -> Option<hecs::Entity>
    where
        I: IntoIterator<Item = &'a hecs::Entity>,
    {
        candidates
            .into_iter()
            .find(|entity| {
                self.bounds
                    .get(entity)
                    .map_or(false, |b| b.intersects(query))
            })
            .copied()
    }

    /// Drop every collider.
    pub fn clear(&mut self) {
        self.collider_set = ColliderSet::new();
        self.rigid_body_set = RigidBodySet::new();
        self.query_pipeline = QueryPipeline::new();
        self.collider_to_entity.clear();
        self.bounds.clear();
        self.dirty = false;
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn quat_to_angvector(q: Quat) -> rapier3d::na::Vector3<f32> {
    let (axis, angle) = q.to_axis_angle();
    vector![axis.x * angle, axis.y * angle, axis.z * angle]
}
