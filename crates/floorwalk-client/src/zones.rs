use glam::Vec3;

use floorwalk_core::floor::Floor;
use floorwalk_core::watch::Watch;

/// Resolve the most specific region containing plan point `(x, y)`.
///
/// Rooms across all zones are tested first, then areas, then the derived
/// zone extents; data order breaks ties inside each tier.
pub fn resolve_zone(floor: &Floor, x: f32, y: f32) -> Option<&str> {
    let rooms = floor
        .zones
        .iter()
        .flat_map(|z| z.rooms.iter())
        .find(|r| r.boundary.map_or(false, |b| b.contains(x, y)))
        .map(|r| r.id.as_str());
    if rooms.is_some() {
        return rooms;
    }

    let areas = floor
        .zones
        .iter()
        .flat_map(|z| z.areas.iter())
        .find(|a| a.boundary.map_or(false, |b| b.contains(x, y)))
        .map(|a| a.id.as_str());
    if areas.is_some() {
        return areas;
    }

    floor
        .zones
        .iter()
        .find(|z| z.boundary.map_or(false, |b| b.contains(x, y)))
        .map(|z| z.id.as_str())
}

/// Edge-triggered tracker of the region the player occupies.
pub struct ZoneTracker {
    current: Watch<Option<String>>,
}

impl ZoneTracker {
    pub fn new() -> Self {
        Self {
            current: Watch::new(None),
        }
    }

    /// Resolve the player's region. Returns `Some(new_id)` only when the
    /// resolved id differs from the previous one.
    pub fn check(&mut self, position: Vec3, floor: &Floor) -> Option<Option<String>> {
        let resolved = resolve_zone(floor, position.x, position.z).map(str::to_string);
        if self.current.set(resolved) {
            tracing::debug!("Zone changed to {:?}", self.current.get());
            Some(self.current.get().clone())
        } else {
            None
        }
    }

    /// Force the current id to `None`. Returns true if it was set.
    pub fn reset(&mut self) -> bool {
        self.current.set(None)
    }

    pub fn current(&self) -> Option<&str> {
        self.current.get().as_deref()
    }

    pub fn changes(&self) -> u64 {
        self.current.version()
    }
}

impl Default for ZoneTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorwalk_core::floor::{Area, Boundary, PlanPoint, Room, Zone};

    fn rect(x0: f32, y0: f32, x1: f32, y1: f32) -> Option<Boundary> {
        Some(Boundary::new(PlanPoint::new(x0, y0), PlanPoint::new(x1, y1)))
    }

    fn floor() -> Floor {
        let mut west = Zone {
            id: "west".into(),
            name: "West wing".into(),
            areas: vec![Area {
                id: "hall".into(),
                name: "Hall".into(),
                color: None,
                boundary: rect(-10.0, -10.0, 0.0, 10.0),
            }],
            rooms: vec![],
            objects: vec![],
            boundary: None,
            center: None,
        };
        west.areas.push(Area {
            id: "annex".into(),
            name: "Annex".into(),
            color: None,
            boundary: rect(-20.0, 20.0, -18.0, 22.0),
        });
        west.derive_extent();

        let east = Zone {
            id: "east".into(),
            name: "East wing".into(),
            areas: vec![],
            rooms: vec![Room {
                id: "lab".into(),
                name: "Lab".into(),
                color: None,
                boundary: rect(-2.0, -2.0, 2.0, 2.0),
                doors: vec![],
            }],
            objects: vec![],
            boundary: None,
            center: None,
        };

        Floor {
            floor: 1,
            floor_name: None,
            color: None,
            walls: vec![],
            zones: vec![west, east],
        }
    }

    #[test]
    fn test_room_beats_area_across_zones() {
        let f = floor();
        // The lab (second zone) overlaps the hall (first zone).
        assert_eq!(resolve_zone(&f, -1.0, 0.0), Some("lab"));
        assert_eq!(resolve_zone(&f, -5.0, 0.0), Some("hall"));
    }

    #[test]
    fn test_zone_extent_is_last_resort() {
        let f = floor();
        // Inside the derived west extent but in no member.
        assert_eq!(resolve_zone(&f, -15.0, 15.0), Some("west"));
        assert_eq!(resolve_zone(&f, 50.0, 50.0), None);
    }

    #[test]
    fn test_boundary_edges_are_inside() {
        let f = floor();
        assert_eq!(resolve_zone(&f, 2.0, 2.0), Some("lab"));
    }

    #[test]
    fn test_tracker_is_edge_triggered() {
        let f = floor();
        let mut tracker = ZoneTracker::new();
        let a = Vec3::new(-5.0, 0.5, 0.0);
        let b = Vec3::new(1.0, 0.5, 1.0);

        assert_eq!(tracker.check(a, &f), Some(Some("hall".into())));
        assert_eq!(tracker.check(a, &f), None);
        assert_eq!(tracker.check(a, &f), None);
        assert_eq!(tracker.check(b, &f), Some(Some("lab".into())));
        assert_eq!(tracker.check(a, &f), Some(Some("hall".into())));
        assert_eq!(tracker.changes(), 3);

        assert_eq!(tracker.check(Vec3::new(80.0, 0.5, 0.0), &f), Some(None));
        assert!(!tracker.reset());
    }
}
