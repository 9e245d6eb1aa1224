//! Floor-plan data model.
//!
//! Plan coordinates are 2D `{x, y}`; the 3D scene maps plan `x` to world `x`
//! and plan `y` to world `z`.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// A point in floor-plan units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct PlanPoint {
    pub x: f32,
    pub y: f32,
}

impl PlanPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Lift onto the ground plane at height `y`.
    pub fn to_world(self, y: f32) -> Vec3 {
        Vec3::new(self.x, y, self.y)
    }
}

/// Axis-aligned rectangle in plan units. `min <= max` component-wise.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Boundary {
    pub min: PlanPoint,
    pub max: PlanPoint,
}

impl Boundary {
    /// Build a boundary, swapping components so that `min <= max` holds.
    pub fn new(a: PlanPoint, b: PlanPoint) -> Self {
        Self {
            min: PlanPoint::new(a.x.min(b.x), a.y.min(b.y)),
            max: PlanPoint::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn is_normalized(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn depth(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> PlanPoint {
        PlanPoint::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    /// Inclusive containment test.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.min.x && x <= self.max.x && y >= self.min.y && y <= self.max.y
    }

    pub fn union(&self, other: &Boundary) -> Boundary {
        Boundary {
            min: PlanPoint::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: PlanPoint::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// Component-wise min/max over all boundaries. `None` for an empty input.
    pub fn union_all<'a, I>(boundaries: I) -> Option<Boundary>
    where
        I: IntoIterator<Item = &'a Boundary>,
    {
        boundaries
            .into_iter()
            .fold(None, |acc: Option<Boundary>, b| match acc {
                Some(acc) => Some(acc.union(b)),
                None => Some(*b),
            })
    }
}

/// Packed 0xRRGGBB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Color(pub u32);

impl Color {
    pub const WHITE: Color = Color(0xffffff);

    /// Parse `"#rrggbb"`, `"rrggbb"` or `"0xrrggbb"`.
    pub fn parse_hex(s: &str) -> Option<Color> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('#')
            .or_else(|| trimmed.strip_prefix("0x"))
            .unwrap_or(trimmed);
        if digits.len() != 6 {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().map(Color)
    }
}

/// Line segment rendered as an oriented box.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Wall {
    pub start: PlanPoint,
    pub end: PlanPoint,
}

impl Wall {
    pub fn length(&self) -> f32 {
        self.start.to_vec2().distance(self.end.to_vec2())
    }

    pub fn midpoint(&self) -> PlanPoint {
        PlanPoint::new(
            (self.start.x + self.end.x) / 2.0,
            (self.start.y + self.end.y) / 2.0,
        )
    }

    /// 2D heading of the segment, `atan2(dy, dx)` in plan space.
    pub fn heading(&self) -> f32 {
        (self.end.y - self.start.y).atan2(self.end.x - self.start.x)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct DoorSize {
    pub width: f32,
    pub depth: f32,
}

/// A passage owned by a room. `id` is the permission key.
///
/// Passage is decided by allow-list membership alone. `access_level` and
/// `requires_allow_list` are display-only metadata: a door with
/// `requiresAllowList: false` is still locked unless its id is allowed.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Door {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub center: PlanPoint,
    pub size: DoorSize,
    #[serde(default)]
    pub access_level: Option<u32>,
    #[serde(default = "default_true")]
    pub requires_allow_list: bool,
}

fn default_true() -> bool {
    true
}

/// Open, un-walled region.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Area {
    pub id: String,
    pub name: String,
    pub color: Option<Color>,
    pub boundary: Option<Boundary>,
}

/// Walled region owning doors.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub color: Option<Color>,
    pub boundary: Option<Boundary>,
    #[serde(default)]
    pub doors: Vec<Door>,
}

/// Solid asset such as furniture or equipment. No access control.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FloorObject {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub boundary: Option<Boundary>,
}

/// Logical grouping of areas, rooms and objects.
///
/// `boundary` and `center` are derived from the members, never authored.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub areas: Vec<Area>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub objects: Vec<FloorObject>,
    #[serde(default)]
    pub boundary: Option<Boundary>,
    #[serde(default)]
    pub center: Option<PlanPoint>,
}

impl Zone {
    /// Union of every member boundary, without touching the record.
    pub fn member_extent(&self) -> Option<Boundary> {
        let areas = self.areas.iter().filter_map(|a| a.boundary.as_ref());
        let rooms = self.rooms.iter().filter_map(|r| r.boundary.as_ref());
        let objects = self.objects.iter().filter_map(|o| o.boundary.as_ref());
        Boundary::union_all(areas.chain(rooms).chain(objects))
    }

    /// Recompute and store `boundary` and `center`. A zone with no bounded
    /// members ends up with both cleared.
    pub fn derive_extent(&mut self) -> Option<Boundary> {
        let extent = self.member_extent();
        self.boundary = extent;
        self.center = extent.map(|b| b.center());
        extent
    }
}

/// Unit of load/unload for the geometry builder.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Floor {
    pub floor: i32,
    #[serde(default)]
    pub floor_name: Option<String>,
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default)]
    pub walls: Vec<Wall>,
    #[serde(default)]
    pub zones: Vec<Zone>,
}

impl Floor {
    pub fn display_name(&self) -> String {
        self.floor_name
            .clone()
            .unwrap_or_else(|| format!("Floor {}", self.floor))
    }

    pub fn door_count(&self) -> usize {
        self.zones
            .iter()
            .flat_map(|z| z.rooms.iter())
            .map(|r| r.doors.len())
            .sum()
    }

    pub fn find_door(&self, id: &str) -> Option<&Door> {
        self.zones
            .iter()
            .flat_map(|z| z.rooms.iter())
            .flat_map(|r| r.doors.iter())
            .find(|d| d.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    pub building_id: String,
    #[serde(default)]
    pub building_name: Option<String>,
    pub floors: Vec<Floor>,
}

impl Building {
    pub fn floor(&self, number: i32) -> Option<&Floor> {
        self.floors.iter().find(|f| f.floor == number)
    }

    pub fn floor_mut(&mut self, number: i32) -> Option<&mut Floor> {
        self.floors.iter_mut().find(|f| f.floor == number)
    }

    pub fn first_floor(&self) -> Option<i32> {
        self.floors.first().map(|f| f.floor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: f32, y0: f32, x1: f32, y1: f32) -> Boundary {
        Boundary::new(PlanPoint::new(x0, y0), PlanPoint::new(x1, y1))
    }

    #[test]
    fn test_boundary_normalizes_inverted_corners() {
        let b = rect(5.0, 4.0, -1.0, -2.0);
        assert!(b.is_normalized());
        assert_eq!(b.min, PlanPoint::new(-1.0, -2.0));
        assert_eq!(b.max, PlanPoint::new(5.0, 4.0));
    }

    #[test]
    fn test_contains_is_inclusive() {
        let b = rect(-10.0, -10.0, 10.0, 10.0);
        assert!(b.contains(10.0, -10.0));
        assert!(b.contains(0.0, 0.0));
        assert!(!b.contains(10.01, 0.0));
    }

    #[test]
    fn test_union_all_matches_componentwise_extremes() {
        let members = [
            rect(0.0, 0.0, 2.0, 2.0),
            rect(-3.0, 1.0, 1.0, 8.0),
            rect(4.0, -6.0, 5.0, -5.0),
        ];
        let u = Boundary::union_all(members.iter()).unwrap();
        assert_eq!(u.min, PlanPoint::new(-3.0, -6.0));
        assert_eq!(u.max, PlanPoint::new(5.0, 8.0));
        assert!(Boundary::union_all(std::iter::empty()).is_none());
    }

    #[test]
    fn test_zone_derive_extent_writes_back() {
        let mut zone = Zone {
            id: "z1".into(),
            name: "Wing A".into(),
            areas: vec![Area {
                id: "a1".into(),
                name: "Lobby".into(),
                color: None,
                boundary: Some(rect(0.0, 0.0, 4.0, 4.0)),
            }],
            rooms: vec![],
            objects: vec![FloorObject {
                id: "o1".into(),
                name: None,
                kind: "desk".into(),
                boundary: Some(rect(6.0, 6.0, 8.0, 10.0)),
            }],
            boundary: None,
            center: None,
        };
        zone.derive_extent();
        assert_eq!(zone.boundary, Some(rect(0.0, 0.0, 8.0, 10.0)));
        assert_eq!(zone.center, Some(PlanPoint::new(4.0, 5.0)));

        zone.areas.clear();
        zone.objects.clear();
        assert!(zone.derive_extent().is_none());
        assert!(zone.center.is_none());
    }

    #[test]
    fn test_color_parse_hex() {
        assert_eq!(Color::parse_hex("#ff8800"), Some(Color(0xff8800)));
        assert_eq!(Color::parse_hex("0x00ff00"), Some(Color(0x00ff00)));
        assert_eq!(Color::parse_hex("red"), None);
    }

    #[test]
    fn test_wall_heading_and_length() {
        let wall = Wall {
            start: PlanPoint::new(0.0, 0.0),
            end: PlanPoint::new(0.0, 4.0),
        };
        assert!((wall.length() - 4.0).abs() < 1e-6);
        assert!((wall.heading() - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert_eq!(wall.midpoint(), PlanPoint::new(0.0, 2.0));
    }
}
