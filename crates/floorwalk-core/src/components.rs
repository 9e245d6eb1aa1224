use glam::{Quat, Vec3};
use serde::Serialize;

use crate::floor::{Area, Door, FloorObject, PlanPoint, Room, Zone};

/// Transform component. Present on every primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }
}

/// Newtype handle into the geometry cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryHandle(pub usize);

/// Newtype handle into the material cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialHandle(pub usize);

/// Geometric shape of a primitive, in local space centered on its transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Solid box with full extents `size`.
    Box { size: Vec3 },
    /// Flat horizontal quad.
    Quad { width: f32, depth: f32 },
    /// Upright cylinder (the avatar).
    Cylinder { radius: f32, height: f32 },
}

/// Identifies this entity as a primitive to render.
#[derive(Debug, Clone)]
pub struct Primitive {
    pub geometry: GeometryHandle,
    pub material: MaterialHandle,
    pub shape: Shape,
}

/// Structural wall segment. Blocks movement, never picked.
#[derive(Debug, Clone, Copy)]
pub struct WallMarker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Zone,
    Area,
    Room,
    Door,
    Object,
}

impl EntityKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "zone" => Some(EntityKind::Zone),
            "area" => Some(EntityKind::Area),
            "room" => Some(EntityKind::Room),
            "door" => Some(EntityKind::Door),
            "object" => Some(EntityKind::Object),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Zone => "zone",
            EntityKind::Area => "area",
            EntityKind::Room => "room",
            EntityKind::Door => "door",
            EntityKind::Object => "object",
        }
    }
}

/// Originating record of a tagged primitive or a selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum PlanEntity {
    Zone(Zone),
    Area(Area),
    Room(Room),
    Door(Door),
    Object(FloorObject),
}

impl PlanEntity {
    pub fn kind(&self) -> EntityKind {
        match self {
            PlanEntity::Zone(_) => EntityKind::Zone,
            PlanEntity::Area(_) => EntityKind::Area,
            PlanEntity::Room(_) => EntityKind::Room,
            PlanEntity::Door(_) => EntityKind::Door,
            PlanEntity::Object(_) => EntityKind::Object,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            PlanEntity::Zone(z) => &z.id,
            PlanEntity::Area(a) => &a.id,
            PlanEntity::Room(r) => &r.id,
            PlanEntity::Door(d) => &d.id,
            PlanEntity::Object(o) => &o.id,
        }
    }

    pub fn label(&self) -> String {
        match self {
            PlanEntity::Zone(z) => z.name.clone(),
            PlanEntity::Area(a) => a.name.clone(),
            PlanEntity::Room(r) => r.name.clone(),
            PlanEntity::Door(d) => d.name.clone().unwrap_or_else(|| d.id.clone()),
            PlanEntity::Object(o) => o.name.clone().unwrap_or_else(|| o.kind.clone()),
        }
    }

    /// Camera pan target: the entity's own center when it has one, else the
    /// midpoint of its boundary.
    pub fn focus_point(&self) -> Option<PlanPoint> {
        match self {
            PlanEntity::Zone(z) => z.center.or_else(|| z.boundary.map(|b| b.center())),
            PlanEntity::Door(d) => Some(d.center),
            PlanEntity::Area(a) => a.boundary.map(|b| b.center()),
            PlanEntity::Room(r) => r.boundary.map(|b| b.center()),
            PlanEntity::Object(o) => o.boundary.map(|b| b.center()),
        }
    }
}

/// Semantic tag carried by every pickable primitive: the originating record
/// plus the floor it was built from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tag {
    pub floor: i32,
    #[serde(flatten)]
    pub entity: PlanEntity,
}

impl Tag {
    pub fn new(floor: i32, entity: PlanEntity) -> Self {
        Self { floor, entity }
    }

    pub fn kind(&self) -> EntityKind {
        self.entity.kind()
    }

    pub fn id(&self) -> &str {
        self.entity.id()
    }
}

/// Door render state derived from the allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorState {
    Locked,
    Unlocked,
}

/// The avatar.
#[derive(Debug, Clone)]
pub struct Player {
    /// Diameter of the footprint.
    pub size: f32,
}

impl Default for Player {
    fn default() -> Self {
        Self { size: 0.5 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::floor::{Boundary, DoorSize};

    #[test]
    fn test_focus_prefers_center_over_boundary() {
        let door = PlanEntity::Door(Door {
            id: "d1".into(),
            name: None,
            center: PlanPoint::new(3.0, 4.0),
            size: DoorSize { width: 1.0, depth: 0.2 },
            access_level: None,
            requires_allow_list: true,
        });
        assert_eq!(door.focus_point(), Some(PlanPoint::new(3.0, 4.0)));

        let room = PlanEntity::Room(Room {
            id: "r1".into(),
            name: "Lab".into(),
            color: None,
            boundary: Some(Boundary::new(PlanPoint::new(0.0, 0.0), PlanPoint::new(4.0, 2.0))),
            doors: vec![],
        });
        assert_eq!(room.focus_point(), Some(PlanPoint::new(2.0, 1.0)));
    }

    #[test]
    fn test_tag_serializes_as_type_and_data() {
        let tag = Tag::new(
            2,
            PlanEntity::Area(Area {
                id: "a1".into(),
                name: "Hall".into(),
                color: None,
                boundary: None,
            }),
        );
        let json = serde_json::to_value(&tag).unwrap();
        assert_eq!(json["floor"], 2);
        assert_eq!(json["type"], "area");
        assert_eq!(json["data"]["id"], "a1");
    }

    #[test]
    fn test_entity_kind_parse() {
        assert_eq!(EntityKind::parse("room"), Some(EntityKind::Room));
        assert_eq!(EntityKind::parse("stairs"), None);
        assert_eq!(EntityKind::Door.as_str(), "door");
    }
}
