//! Searchable index over every named entity of a building.

use std::collections::HashMap;

use serde::Serialize;

use floorwalk_core::components::{EntityKind, PlanEntity, Tag};
use floorwalk_core::floor::Building;

use crate::detail::SelectionRequest;

#[derive(Debug, Clone, Serialize)]
pub struct DirectoryEntry {
    /// Unique `floor:kind:id` key.
    pub key: String,
    pub floor: i32,
    pub label: String,
    pub kind: EntityKind,
    /// `floor name / ancestors`, excluding the entry itself.
    pub breadcrumb: String,
    #[serde(skip)]
    pub tag: Tag,
}

pub struct Directory {
    entries: Vec<DirectoryEntry>,
    by_id: HashMap<String, usize>,
}

impl Directory {
    /// Index zones, areas, rooms, doors and objects of every floor. Zone
    /// extents are taken as stored, so build or derive them first.
    pub fn index(building: &Building) -> Self {
        let mut dir = Self {
            entries: Vec::new(),
            by_id: HashMap::new(),
        };
        for floor in &building.floors {
            let floor_name = floor.display_name();
            let n = floor.floor;
            for zone in &floor.zones {
                let mut zone_copy = zone.clone();
                zone_copy.derive_extent();
                dir.push(n, PlanEntity::Zone(zone_copy), &[&floor_name]);

                let zone_trail = [floor_name.as_str(), zone.name.as_str()];
                for area in &zone.areas {
                    dir.push(n, PlanEntity::Area(area.clone()), &zone_trail);
                }
                for room in &zone.rooms {
                    dir.push(n, PlanEntity::Room(room.clone()), &zone_trail);
                    let room_trail = [floor_name.as_str(), zone.name.as_str(), room.name.as_str()];
                    for door in &room.doors {
                        dir.push(n, PlanEntity::Door(door.clone()), &room_trail);
                    }
                }
                for object in &zone.objects {
                    dir.push(n, PlanEntity::Object(object.clone()), &zone_trail);
                }
            }
        }
        tracing::debug!("Directory indexed {} entries", dir.entries.len());
        dir
    }

    fn push(&mut self, floor: i32, entity: PlanEntity, trail: &[&str]) {
        let tag = Tag::new(floor, entity);
        let key = format!("{}:{}:{}", floor, tag.kind().as_str(), tag.id());
        let breadcrumb = trail
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" / ");
        // First occurrence of an id wins for lookup.
        self.by_id
            .entry(tag.id().to_string())
            .or_insert(self.entries.len());
        self.entries.push(DirectoryEntry {
            key,
            floor,
            label: tag.entity.label(),
            kind: tag.kind(),
            breadcrumb,
            tag,
        });
    }

    /// Case-insensitive substring match on labels, sorted by label. An empty
    /// term matches nothing.
    pub fn search(&self, term: &str) -> Vec<&DirectoryEntry> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return Vec::new();
        }
        let mut hits: Vec<&DirectoryEntry> = self
            .entries
            .iter()
            .filter(|e| e.label.to_lowercase().contains(&term))
            .collect();
        hits.sort_by(|a, b| a.label.cmp(&b.label).then_with(|| a.key.cmp(&b.key)));
        hits
    }

    pub fn entry(&self, id: &str) -> Option<&DirectoryEntry> {
        self.by_id.get(id).map(|&i| &self.entries[i])
    }

    /// Resolve an id to a selection request.
    pub fn lookup(&self, id: &str) -> Option<SelectionRequest> {
        self.entry(id).map(|e| SelectionRequest::Tagged(e.tag.clone()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }
}
