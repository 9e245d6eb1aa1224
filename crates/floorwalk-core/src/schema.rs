//! Building JSON load boundary.
//!
//! The whole document must be valid JSON with a floor list. Below that,
//! every wall, zone, area, room, door and object is decoded on its own so a
//! single malformed record is skipped with a warning instead of failing the
//! floor.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

use crate::floor::{
    Area, Boundary, Building, Color, Door, DoorSize, Floor, FloorObject, PlanPoint, Room, Wall,
    Zone,
};

#[derive(Debug)]
pub enum FloorDataError {
    IoError(std::io::Error),
    ParseError(serde_json::Error),
    MissingFloors,
    InvalidFloor(String),
}

impl std::fmt::Display for FloorDataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IoError(e) => write!(f, "IO error: {}", e),
            Self::ParseError(e) => write!(f, "JSON parse error: {}", e),
            Self::MissingFloors => write!(f, "Building data has no usable floors"),
            Self::InvalidFloor(msg) => write!(f, "Invalid floor record: {}", msg),
        }
    }
}

impl std::error::Error for FloorDataError {}

impl From<std::io::Error> for FloorDataError {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e)
    }
}

impl From<serde_json::Error> for FloorDataError {
    fn from(e: serde_json::Error) -> Self {
        Self::ParseError(e)
    }
}

// --- Raw records, as they appear on the wire ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildingDef {
    #[serde(default)]
    building_id: Option<String>,
    #[serde(default)]
    building_name: Option<String>,
    #[serde(default)]
    floors: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FloorDef {
    floor: i32,
    #[serde(default)]
    floor_name: Option<String>,
    #[serde(default)]
    color: Option<Value>,
    #[serde(default)]
    walls: Vec<Value>,
    #[serde(default)]
    zones: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct WallDef {
    start: PlanPoint,
    end: PlanPoint,
}

#[derive(Debug, Deserialize)]
struct ZoneDef {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    areas: Vec<Value>,
    #[serde(default)]
    rooms: Vec<Value>,
    #[serde(default)]
    objects: Vec<Value>,
}

/// Shared shape of areas and rooms; `doors` is only meaningful for rooms.
#[derive(Debug, Deserialize)]
struct RegionDef {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    color: Option<Value>,
    #[serde(default)]
    boundary: Option<Value>,
    #[serde(default)]
    doors: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ObjectDef {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    boundary: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DoorDef {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    center: Option<PlanPoint>,
    #[serde(default)]
    size: Option<DoorSize>,
    #[serde(default)]
    access_level: Option<Value>,
    #[serde(default)]
    requires_allow_list: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct BoundaryDef {
    min: PlanPoint,
    max: PlanPoint,
}

/// Load a building file from disk.
pub fn load_building(path: &Path) -> Result<Building, FloorDataError> {
    let contents = std::fs::read_to_string(path)?;
    let building = parse_building(&contents)?;
    tracing::info!(
        "Loaded building '{}' from {:?}: {} floor(s)",
        building.building_id,
        path,
        building.floors.len()
    );
    Ok(building)
}

/// Parse a building document. A bare floor object is accepted and wrapped
/// in a single-floor building.
pub fn parse_building(json: &str) -> Result<Building, FloorDataError> {
    let root: Value = serde_json::from_str(json)?;

    if root.get("floors").is_none() && root.get("floor").is_some() {
        let floor = floor_from_value(root)?;
        return Ok(Building {
            building_id: "building".to_string(),
            building_name: None,
            floors: vec![floor],
        });
    }

    let def: BuildingDef = serde_json::from_value(root)?;
    let raw_floors = def.floors.ok_or(FloorDataError::MissingFloors)?;

    let mut floors = Vec::with_capacity(raw_floors.len());
    for (index, raw) in raw_floors.into_iter().enumerate() {
        match floor_from_value(raw) {
            Ok(floor) => floors.push(floor),
            Err(e) => tracing::warn!("Skipping floor #{}: {}", index, e),
        }
    }
    if floors.is_empty() {
        return Err(FloorDataError::MissingFloors);
    }

    Ok(Building {
        building_id: def.building_id.unwrap_or_else(|| "building".to_string()),
        building_name: def.building_name,
        floors,
    })
}

fn floor_from_value(raw: Value) -> Result<Floor, FloorDataError> {
    let def: FloorDef =
        serde_json::from_value(raw).map_err(|e| FloorDataError::InvalidFloor(e.to_string()))?;
    let context = format!("floor {}", def.floor);

    let walls: Vec<Wall> = decode_each::<WallDef>(def.walls, &context, "wall")
        .into_iter()
        .map(|w| Wall {
            start: w.start,
            end: w.end,
        })
        .collect();

    let zones: Vec<Zone> = decode_each::<ZoneDef>(def.zones, &context, "zone")
        .into_iter()
        .enumerate()
        .map(|(i, z)| sanitize_zone(z, i, &context))
        .collect();

    Ok(Floor {
        floor: def.floor,
        floor_name: def.floor_name,
        color: def.color.as_ref().and_then(parse_color),
        walls,
        zones,
    })
}

/// Decode every record independently, logging and dropping failures.
fn decode_each<T: DeserializeOwned>(raw: Vec<Value>, context: &str, what: &str) -> Vec<T> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(i, value)| match serde_json::from_value::<T>(value) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("{}: skipping malformed {} #{}: {}", context, what, i, e);
                None
            }
        })
        .collect()
}

fn sanitize_zone(def: ZoneDef, index: usize, context: &str) -> Zone {
    let id = def.id.unwrap_or_else(|| {
        let generated = format!("zone-{}", index + 1);
        tracing::warn!("{}: zone #{} has no id, using '{}'", context, index, generated);
        generated
    });
    let context = format!("{} / zone {}", context, id);

    let areas = decode_each::<RegionDef>(def.areas, &context, "area")
        .into_iter()
        .map(|a| Area {
            boundary: parse_boundary(a.boundary.as_ref(), &context, &a.id),
            color: a.color.as_ref().and_then(parse_color),
            name: a.name.unwrap_or_else(|| a.id.clone()),
            id: a.id,
        })
        .collect();

    let rooms = decode_each::<RegionDef>(def.rooms, &context, "room")
        .into_iter()
        .map(|r| {
            let room_context = format!("{} / room {}", context, r.id);
            Room {
                boundary: parse_boundary(r.boundary.as_ref(), &context, &r.id),
                color: r.color.as_ref().and_then(parse_color),
                name: r.name.unwrap_or_else(|| r.id.clone()),
                doors: decode_each::<DoorDef>(r.doors, &room_context, "door")
                    .into_iter()
                    .filter_map(|d| sanitize_door(d, &room_context))
                    .collect(),
                id: r.id,
            }
        })
        .collect();

    let objects = decode_each::<ObjectDef>(def.objects, &context, "object")
        .into_iter()
        .map(|o| FloorObject {
            boundary: parse_boundary(o.boundary.as_ref(), &context, &o.id),
            kind: o.kind.unwrap_or_else(|| "object".to_string()),
            name: o.name,
            id: o.id,
        })
        .collect();

    Zone {
        name: def.name.unwrap_or_else(|| id.clone()),
        id,
        areas,
        rooms,
        objects,
        boundary: None,
        center: None,
    }
}

fn sanitize_door(def: DoorDef, context: &str) -> Option<Door> {
    let id = match def.id {
        Some(id) if !id.is_empty() => id,
        _ => {
            tracing::warn!("{}: skipping door without id", context);
            return None;
        }
    };
    let center = match def.center {
        Some(c) => c,
        None => {
            tracing::warn!("{}: skipping door '{}' without center", context, id);
            return None;
        }
    };
    let size = def.size.unwrap_or_else(|| {
        tracing::warn!("{}: door '{}' has no size, using zero size", context, id);
        DoorSize::default()
    });
    let access_level = def.access_level.as_ref().and_then(|v| match v {
        Value::Number(n) => n.as_u64().map(|n| n as u32),
        Value::String(s) => s.parse().ok(),
        _ => None,
    });

    Some(Door {
        id,
        name: def.name,
        center,
        size: DoorSize {
            width: size.width.abs(),
            depth: size.depth.abs(),
        },
        access_level,
        requires_allow_list: def.requires_allow_list.unwrap_or(true),
    })
}

fn parse_boundary(raw: Option<&Value>, context: &str, owner: &str) -> Option<Boundary> {
    let raw = match raw {
        Some(Value::Null) | None => {
            tracing::warn!("{}: '{}' has no boundary", context, owner);
            return None;
        }
        Some(v) => v,
    };
    match serde_json::from_value::<BoundaryDef>(raw.clone()) {
        Ok(def) => {
            let boundary = Boundary::new(def.min, def.max);
            if boundary.min != def.min {
                tracing::warn!("{}: '{}' boundary was inverted, normalized", context, owner);
            }
            Some(boundary)
        }
        Err(e) => {
            tracing::warn!("{}: '{}' has a malformed boundary: {}", context, owner, e);
            None
        }
    }
}

fn parse_color(raw: &Value) -> Option<Color> {
    match raw {
        Value::Number(n) => n.as_u64().map(|n| Color(n as u32 & 0xffffff)),
        Value::String(s) => Color::parse_hex(s),
        _ => None,
    }
}
