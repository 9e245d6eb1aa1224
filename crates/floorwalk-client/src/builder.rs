//! Floor geometry builder.
//!
//! Turns a `Floor` into tagged primitives in a [`FloorScene`], mirrors each
//! one into the [`SpatialIndex`], and owns their teardown.

use glam::{Quat, Vec3};

use floorwalk_core::components::{
    DoorState, GeometryHandle, MaterialHandle, PlanEntity, Primitive, Shape, Tag, Transform,
};
use floorwalk_core::events::PrimitiveCounts;
use floorwalk_core::floor::{Area, Boundary, Door, Floor, FloorObject, Room, Wall};

use crate::config::{ColorConfig, GeometryConfig};
use crate::material::MaterialCache;
use crate::mesh::GeometryCache;
use crate::permissions::AllowList;
use crate::physics::SpatialIndex;
use crate::world::{FloorScene, Layer};

/// Collider thickness given to flat floor quads so rays can hit them.
const QUAD_THICKNESS: f32 = 0.005;

pub struct GeometryBuilder {
    pub scene: FloorScene,
    pub index: SpatialIndex,
    geometries: GeometryCache,
    materials: MaterialCache,
    config: GeometryConfig,
    floor: Option<i32>,
}

impl GeometryBuilder {
    pub fn new(config: GeometryConfig, colors: &ColorConfig) -> Self {
        Self {
            scene: FloorScene::new(),
            index: SpatialIndex::new(),
            geometries: GeometryCache::new(),
            materials: MaterialCache::new(colors),
            config,
            floor: None,
        }
    }

    /// Build every primitive for `floor`. Zone extents are derived and
    /// written back into the floor record first. Doors start locked.
    pub fn build(&mut self, floor: &mut Floor) -> PrimitiveCounts {
        if self.scene.primitive_count() > 0 {
            tracing::warn!(
                "build() called with floor {:?} still loaded; clearing first",
                self.floor
            );
            self.clear();
        }

        for zone in floor.zones.iter_mut() {
            if zone.derive_extent().is_none() {
                tracing::debug!("Zone '{}' has no bounded members", zone.id);
            }
        }

        let number = floor.floor;
        for (i, wall) in floor.walls.iter().enumerate() {
            self.build_wall(i, wall);
        }
        for zone in &floor.zones {
            for area in &zone.areas {
                self.build_area(number, area);
            }
            for room in &zone.rooms {
                self.build_room(number, room);
            }
            for object in &zone.objects {
                self.build_object(number, object);
            }
        }

        self.index.update();
        self.floor = Some(number);

        let counts = self.counts();
        tracing::info!(
            "Built floor {} ({}): {} walls, {} floors, {} doors, {} objects",
            number,
            floor.display_name(),
            counts.walls,
            counts.floors,
            counts.doors,
            counts.objects
        );
        counts
    }

    fn build_wall(&mut self, i: usize, wall: &Wall) {
        let length = wall.length();
        if !length.is_finite() || length < self.config.min_wall_length {
            tracing::warn!(
                "Skipping wall {}: length {:.3} below minimum {}",
                i,
                length,
                self.config.min_wall_length
            );
            return;
        }
        let height = self.config.wall_height;
        let size = Vec3::new(length, height, self.config.wall_thickness);
        let transform = Transform {
            position: wall.midpoint().to_world(height / 2.0),
            // Local +x runs along the segment.
            rotation: Quat::from_rotation_y(-wall.heading()),
            scale: Vec3::ONE,
        };
        let primitive = self.primitive(Shape::Box { size }, self.materials.wall);
        let entity = self.scene.spawn_wall(transform.clone(), primitive);
        self.index
            .add_static_box(entity, transform.position, transform.rotation, size);
    }

    fn build_area(&mut self, floor: i32, area: &Area) {
        let Some(boundary) = area.boundary else {
            tracing::warn!("Area '{}' has no boundary, no floor quad built", area.id);
            return;
        };
        let material = self.materials.region(area.color);
        let tag = Tag::new(floor, PlanEntity::Area(area.clone()));
        self.spawn_quad(boundary, self.config.area_lift, material, tag);
    }

    fn build_room(&mut self, floor: i32, room: &Room) {
        match room.boundary {
            Some(boundary) => {
                let material = self.materials.region(room.color);
                let tag = Tag::new(floor, PlanEntity::Room(room.clone()));
                self.spawn_quad(boundary, self.config.room_lift, material, tag);
            }
            None => {
                tracing::warn!("Room '{}' has no boundary, building doors only", room.id)
            }
        }
        for door in &room.doors {
            self.build_door(floor, door);
        }
    }

    fn build_door(&mut self, floor: i32, door: &Door) {
        let height = self.config.wall_height;
        let size = Vec3::new(door.size.width, height, door.size.depth);
        if size.x <= 0.0 || size.z <= 0.0 {
            tracing::warn!("Door '{}' has a degenerate size {:?}", door.id, door.size);
        }
        let transform = Transform::from_position(door.center.to_world(height / 2.0));
        let primitive = self.primitive(Shape::Box { size }, self.materials.door(DoorState::Locked));
        let tag = Tag::new(floor, PlanEntity::Door(door.clone()));
        let entity = self
            .scene
            .spawn_door(transform.clone(), primitive, tag);
        self.index
            .add_static_box(entity, transform.position, transform.rotation, size);
    }

    fn build_object(&mut self, floor: i32, object: &FloorObject) {
        let Some(boundary) = object.boundary else {
            tracing::warn!("Object '{}' has no boundary, skipped", object.id);
            return;
        };
        let height = self.config.wall_height;
        let size = Vec3::new(boundary.width(), height, boundary.depth());
        let transform = Transform::from_position(boundary.center().to_world(height / 2.0));
        let primitive = self.primitive(Shape::Box { size }, self.materials.object);
        let tag = Tag::new(floor, PlanEntity::Object(object.clone()));
        let entity = self
            .scene
            .spawn_tagged(Layer::Object, transform.clone(), primitive, tag);
        self.index
            .add_static_box(entity, transform.position, transform.rotation, size);
    }

    fn spawn_quad(&mut self, boundary: Boundary, lift: f32, material: MaterialHandle, tag: Tag) {
        let width = boundary.width();
        let depth = boundary.depth();
        let transform = Transform::from_position(boundary.center().to_world(lift));
        let primitive = self.primitive(Shape::Quad { width, depth }, material);
        let entity = self
            .scene
            .spawn_tagged(Layer::Floor, transform.clone(), primitive, tag);
        self.index.add_static_box(
            entity,
            transform.position,
            transform.rotation,
            Vec3::new(width, QUAD_THICKNESS, depth),
        );
    }

    fn primitive(&mut self, shape: Shape, material: MaterialHandle) -> Primitive {
        Primitive {
            geometry: self.geometries.allocate(shape),
            material,
            shape,
        }
    }

    /// Dispose all geometry and empty the per-type collections. Materials
    /// are shared and survive.
    pub fn clear(&mut self) {
        let handles: Vec<GeometryHandle> = self
            .scene
            .world
            .query::<&Primitive>()
            .iter()
            .map(|(_, p)| p.geometry)
            .collect();
        for handle in &handles {
            self.geometries.dispose(*handle);
        }
        self.scene.clear();
        self.index.clear();
        self.geometries.compact();
        if let Some(floor) = self.floor.take() {
            tracing::info!("Cleared floor {} ({} primitives)", floor, handles.len());
        }
    }

    /// Set each door to unlocked iff its id is on the allow-list. Returns
    /// the number of unlocked doors.
    pub fn update_door_materials(&mut self, allow: &AllowList) -> usize {
        let mut unlocked = 0;
        for &entity in &self.scene.doors {
            let Ok((tag, primitive, state)) = self
                .scene
                .world
                .query_one_mut::<(&Tag, &mut Primitive, &mut DoorState)>(entity)
            else {
                continue;
            };
            *state = if allow.permits(tag.id()) {
                unlocked += 1;
                DoorState::Unlocked
            } else {
                DoorState::Locked
            };
            primitive.material = self.materials.door(*state);
        }
        tracing::debug!(
            "Door materials updated: {}/{} unlocked",
            unlocked,
            self.scene.doors.len()
        );
        unlocked
    }

    pub fn door_state(&self, id: &str) -> Option<DoorState> {
        let entity = self.scene.door_entity(id)?;
        self.scene.world.get::<&DoorState>(entity).ok().map(|s| *s)
    }

    /// Material currently applied to a door.
    pub fn door_material(&self, id: &str) -> Option<MaterialHandle> {
        let entity = self.scene.door_entity(id)?;
        self.scene
            .world
            .get::<&Primitive>(entity)
            .ok()
            .map(|p| p.material)
    }

    pub fn counts(&self) -> PrimitiveCounts {
        PrimitiveCounts {
            walls: self.scene.walls.len(),
            floors: self.scene.floors.len(),
            doors: self.scene.doors.len(),
            objects: self.scene.objects.len(),
        }
    }

    pub fn current_floor(&self) -> Option<i32> {
        self.floor
    }

    pub fn geometries(&self) -> &GeometryCache {
        &self.geometries
    }

    pub fn materials(&self) -> &MaterialCache {
        &self.materials
    }

    pub fn config(&self) -> &GeometryConfig {
        &self.config
    }
}
