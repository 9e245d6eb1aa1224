use std::collections::HashMap;

use floorwalk_core::components::{DoorState, MaterialHandle};
use floorwalk_core::floor::Color;

use crate::config::ColorConfig;

/// Flat-shaded surface material.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub color: Color,
    pub opacity: f32,
}

impl Material {
    fn new(name: &str, color: Color, opacity: f32) -> Self {
        Self {
            name: name.to_string(),
            color,
            opacity,
        }
    }
}

/// Shared materials. Unlike geometry these outlive floor rebuilds.
pub struct MaterialCache {
    materials: Vec<Material>,
    region_by_color: HashMap<Color, MaterialHandle>,
    pub wall: MaterialHandle,
    pub object: MaterialHandle,
    pub door_locked: MaterialHandle,
    pub door_unlocked: MaterialHandle,
    pub player: MaterialHandle,
    default_region: Color,
}

impl MaterialCache {
    pub fn new(colors: &ColorConfig) -> Self {
        let mut materials = Vec::new();
        let mut push = |m: Material| {
            let handle = MaterialHandle(materials.len());
            materials.push(m);
            handle
        };
        let wall = push(Material::new("wall", colors.wall, 1.0));
        let object = push(Material::new("object", colors.object, 1.0));
        let door_locked = push(Material::new("door_locked", colors.door_locked, 0.7));
        let door_unlocked = push(Material::new("door_unlocked", colors.door_unlocked, 0.7));
        let player = push(Material::new("player", colors.player, 1.0));

        Self {
            materials,
            region_by_color: HashMap::new(),
            wall,
            object,
            door_locked,
            door_unlocked,
            player,
            default_region: colors.region,
        }
    }

    /// Material for an area or room floor quad, one per distinct color.
    pub fn region(&mut self, color: Option<Color>) -> MaterialHandle {
        let color = color.unwrap_or(self.default_region);
        if let Some(&handle) = self.region_by_color.get(&color) {
            return handle;
        }
        let handle = MaterialHandle(self.materials.len());
        self.materials
            .push(Material::new(&format!("region_{:06x}", color.0), color, 0.5));
        self.region_by_color.insert(color, handle);
        handle
    }

    pub fn door(&self, state: DoorState) -> MaterialHandle {
        match state {
            DoorState::Locked => self.door_locked,
            DoorState::Unlocked => self.door_unlocked,
        }
    }

    pub fn get(&self, handle: MaterialHandle) -> Option<&Material> {
        self.materials.get(handle.0)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_materials_are_shared_per_color() {
        let mut cache = MaterialCache::new(&ColorConfig::default());
        let base = cache.len();
        let a = cache.region(Some(Color(0x336699)));
        let b = cache.region(Some(Color(0x336699)));
        let c = cache.region(None);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(cache.len(), base + 2);
        assert_eq!(cache.get(c).unwrap().color, Color::WHITE);
    }

    #[test]
    fn test_door_state_materials() {
        let cache = MaterialCache::new(&ColorConfig::default());
        let locked = cache.get(cache.door(DoorState::Locked)).unwrap();
        let unlocked = cache.get(cache.door(DoorState::Unlocked)).unwrap();
        assert_eq!(locked.color, Color(0xff0000));
        assert_eq!(unlocked.color, Color(0x00ff00));
    }
}
