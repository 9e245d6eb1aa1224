use std::collections::HashMap;

use hecs::{Entity, World};

use floorwalk_core::components::{DoorState, EntityKind, Primitive, Tag, Transform, WallMarker};

/// Per-type collection for [`FloorScene::spawn_tagged`]. Walls and doors
/// have their own spawn functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// Area and room floor quads.
    Floor,
    Object,
}

/// Central scene state for one built floor: the ECS world plus per-type
/// collections kept for iteration, and a door-id registry.
pub struct FloorScene {
    pub world: World,
    pub walls: Vec<Entity>,
    pub floors: Vec<Entity>,
    pub doors: Vec<Entity>,
    pub objects: Vec<Entity>,
    door_registry: HashMap<String, Entity>,
}

impl FloorScene {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            walls: Vec::new(),
            floors: Vec::new(),
            doors: Vec::new(),
            objects: Vec::new(),
            door_registry: HashMap::new(),
        }
    }

    /// Spawn an untagged structural wall.
    pub fn spawn_wall(&mut self, transform: Transform, primitive: Primitive) -> Entity {
        let entity = self.world.spawn((transform, primitive, WallMarker));
        self.walls.push(entity);
        entity
    }

    /// Spawn a pickable primitive carrying its semantic tag.
    pub fn spawn_tagged(
        &mut self,
        layer: Layer,
        transform: Transform,
        primitive: Primitive,
        tag: Tag,
    ) -> Entity {
        let entity = self.world.spawn((transform, primitive, tag));
        match layer {
            Layer::Floor => self.floors.push(entity),
            Layer::Object => self.objects.push(entity),
        }
        entity
    }

    /// Spawn a door, locked, and register it by id.
    pub fn spawn_door(&mut self, transform: Transform, primitive: Primitive, tag: Tag) -> Entity {
        let id = tag.id().to_string();
        let entity = self
            .world
            .spawn((transform, primitive, tag, DoorState::Locked));
        self.doors.push(entity);
        if self.door_registry.insert(id.clone(), entity).is_some() {
            tracing::warn!("Duplicate door id '{}', last one wins for lookup", id);
        }
        entity
    }

    pub fn tag(&self, entity: Entity) -> Option<Tag> {
        self.world.get::<&Tag>(entity).ok().map(|t| (*t).clone())
    }

    pub fn is_wall(&self, entity: Entity) -> bool {
        self.world.get::<&WallMarker>(entity).is_ok()
    }

    pub fn door_entity(&self, id: &str) -> Option<Entity> {
        self.door_registry.get(id).copied()
    }

    pub fn door_id(&self, entity: Entity) -> Option<String> {
        let tag = self.world.get::<&Tag>(entity).ok()?;
        (tag.kind() == EntityKind::Door).then(|| tag.id().to_string())
    }

    pub fn primitive_count(&self) -> usize {
        self.walls.len() + self.floors.len() + self.doors.len() + self.objects.len()
    }

    /// Despawn everything and empty the collections.
    pub fn clear(&mut self) {
        self.world.clear();
        self.walls.clear();
        self.floors.clear();
        self.doors.clear();
        self.objects.clear();
        self.door_registry.clear();
    }
}

impl Default for FloorScene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorwalk_core::components::{GeometryHandle, MaterialHandle, PlanEntity, Shape};
    use floorwalk_core::floor::{Door, DoorSize, PlanPoint};
    use glam::Vec3;

    fn prim() -> Primitive {
        Primitive {
            geometry: GeometryHandle(0),
            material: MaterialHandle(0),
            shape: Shape::Box { size: Vec3::ONE },
        }
    }

    fn door(id: &str) -> Tag {
        Tag::new(
            1,
            PlanEntity::Door(Door {
                id: id.into(),
                name: None,
                center: PlanPoint::new(0.0, 0.0),
                size: DoorSize { width: 1.0, depth: 0.2 },
                access_level: None,
                requires_allow_list: true,
            }),
        )
    }

    #[test]
    fn test_spawn_door_starts_locked() {
        let mut scene = FloorScene::new();
        let e = scene.spawn_door(Transform::default(), prim(), door("d1"));
        assert_eq!(scene.door_entity("d1"), Some(e));
        assert_eq!(scene.door_id(e).as_deref(), Some("d1"));
        assert_eq!(*scene.world.get::<&DoorState>(e).unwrap(), DoorState::Locked);
        assert!(!scene.is_wall(e));
    }

    #[test]
    fn test_clear_empties_collections() {
        let mut scene = FloorScene::new();
        let wall = scene.spawn_wall(Transform::default(), prim());
        scene.spawn_door(Transform::default(), prim(), door("d1"));
        assert!(scene.is_wall(wall));
        assert_eq!(scene.primitive_count(), 2);

        scene.clear();
        assert_eq!(scene.primitive_count(), 0);
        assert!(scene.door_entity("d1").is_none());
        assert_eq!(scene.world.len(), 0);
    }
}
