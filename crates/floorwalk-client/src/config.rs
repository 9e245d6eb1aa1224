//! floorwalk.yaml project configuration parsing.
//!
//! Every field has a default, so an empty file (or no file at all) yields
//! the stock engine tuning.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use floorwalk_core::floor::Color;

use crate::input::InputBindings;

pub const CONFIG_FILE: &str = "floorwalk.yaml";

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// Building JSON, relative to the config file.
    #[serde(default)]
    pub building: Option<String>,
    #[serde(default)]
    pub default_floor: Option<i32>,
    #[serde(default)]
    pub geometry: GeometryConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub colors: ColorConfig,
    #[serde(default)]
    pub input: InputBindings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            building: None,
            default_floor: None,
            geometry: GeometryConfig::default(),
            player: PlayerConfig::default(),
            camera: CameraConfig::default(),
            colors: ColorConfig::default(),
            input: InputBindings::default(),
        }
    }
}

fn default_name() -> String {
    "floorwalk".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeometryConfig {
    #[serde(default = "default_wall_height")]
    pub wall_height: f32,
    #[serde(default = "default_wall_thickness")]
    pub wall_thickness: f32,
    /// Walls shorter than this are skipped.
    #[serde(default = "default_min_wall_length")]
    pub min_wall_length: f32,
    /// Y offset of area quads.
    #[serde(default = "default_area_lift")]
    pub area_lift: f32,
    /// Y offset of room quads; above areas so rooms win on overlap.
    #[serde(default = "default_room_lift")]
    pub room_lift: f32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            wall_height: default_wall_height(),
            wall_thickness: default_wall_thickness(),
            min_wall_length: default_min_wall_length(),
            area_lift: default_area_lift(),
            room_lift: default_room_lift(),
        }
    }
}

fn default_wall_height() -> f32 {
    3.0
}
fn default_wall_thickness() -> f32 {
    0.2
}
fn default_min_wall_length() -> f32 {
    0.1
}
fn default_area_lift() -> f32 {
    0.01
}
fn default_room_lift() -> f32 {
    0.02
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerConfig {
    /// Footprint diameter; the avatar is twice as tall.
    #[serde(default = "default_player_size")]
    pub size: f32,
    /// Distance moved per tick.
    #[serde(default = "default_player_speed")]
    pub speed: f32,
    /// Plan-space spawn point.
    #[serde(default)]
    pub spawn: [f32; 2],
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            size: default_player_size(),
            speed: default_player_speed(),
            spawn: [0.0, 0.0],
        }
    }
}

fn default_player_size() -> f32 {
    0.5
}
fn default_player_speed() -> f32 {
    0.1
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    /// Vertical extent of the orthographic view at zoom 1.0.
    #[serde(default = "default_frustum_size")]
    pub frustum_size: f32,
    #[serde(default = "default_camera_position")]
    pub position: [f32; 3],
    #[serde(default = "default_camera_target")]
    pub target: [f32; 3],
    /// Camera offset from the look-at point while following the player.
    #[serde(default = "default_follow_offset")]
    pub follow_offset: [f32; 3],
    #[serde(default = "default_follow_lerp")]
    pub follow_lerp: f32,
    #[serde(default = "default_detail_zoom")]
    pub detail_zoom: f32,
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            frustum_size: default_frustum_size(),
            position: default_camera_position(),
            target: default_camera_target(),
            follow_offset: default_follow_offset(),
            follow_lerp: default_follow_lerp(),
            detail_zoom: default_detail_zoom(),
            near: default_near(),
            far: default_far(),
        }
    }
}

fn default_frustum_size() -> f32 {
    60.0
}
fn default_camera_position() -> [f32; 3] {
    [-20.0, 18.0, -25.0]
}
fn default_camera_target() -> [f32; 3] {
    [0.0, 0.0, -6.0]
}
fn default_follow_offset() -> [f32; 3] {
    [-8.0, 7.0, -8.0]
}
fn default_follow_lerp() -> f32 {
    0.05
}
fn default_detail_zoom() -> f32 {
    2.0
}
fn default_near() -> f32 {
    0.1
}
fn default_far() -> f32 {
    1000.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColorConfig {
    #[serde(default = "default_wall_color", deserialize_with = "de_color")]
    pub wall: Color,
    #[serde(default = "default_object_color", deserialize_with = "de_color")]
    pub object: Color,
    #[serde(default = "default_locked_color", deserialize_with = "de_color")]
    pub door_locked: Color,
    #[serde(default = "default_unlocked_color", deserialize_with = "de_color")]
    pub door_unlocked: Color,
    #[serde(default = "default_ground_color", deserialize_with = "de_color")]
    pub ground: Color,
    #[serde(default = "default_region_color", deserialize_with = "de_color")]
    pub region: Color,
    #[serde(default = "default_player_color", deserialize_with = "de_color")]
    pub player: Color,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            wall: default_wall_color(),
            object: default_object_color(),
            door_locked: default_locked_color(),
            door_unlocked: default_unlocked_color(),
            ground: default_ground_color(),
            region: default_region_color(),
            player: default_player_color(),
        }
    }
}

fn default_wall_color() -> Color {
    Color(0x556677)
}
fn default_object_color() -> Color {
    Color(0x445566)
}
fn default_locked_color() -> Color {
    Color(0xff0000)
}
fn default_unlocked_color() -> Color {
    Color(0x00ff00)
}
fn default_ground_color() -> Color {
    Color(0xeeeeee)
}
fn default_region_color() -> Color {
    Color::WHITE
}
fn default_player_color() -> Color {
    Color(0xff4444)
}

/// Accept either an integer or a hex string.
fn de_color<'de, D>(deserializer: D) -> Result<Color, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ColorDef {
        Int(u32),
        Hex(String),
    }

    match ColorDef::deserialize(deserializer)? {
        ColorDef::Int(v) => Ok(Color(v & 0xffffff)),
        ColorDef::Hex(s) => Color::parse_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid color '{}'", s))),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    NotFound,
    Io(std::io::Error),
    Parse(serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound => write!(f, "{} not found", CONFIG_FILE),
            ConfigError::Io(e) => write!(f, "IO error reading {}: {}", CONFIG_FILE, e),
            ConfigError::Parse(e) => write!(f, "Failed to parse {}: {}", CONFIG_FILE, e),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Walk up from `start_dir` looking for `floorwalk.yaml`.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    let mut dir = start_dir.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE);
        if candidate.exists() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Load and parse a `floorwalk.yaml` file.
pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound);
    }
    let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> Result<EngineConfig, ConfigError> {
    // An empty document deserializes as unit; treat it as all defaults.
    if contents.trim().is_empty() {
        return Ok(EngineConfig::default());
    }
    serde_yaml::from_str(contents).map_err(ConfigError::Parse)
}

/// Resolve the configured building path against the config file location.
pub fn building_path(config: &EngineConfig, config_path: &Path) -> Option<PathBuf> {
    let rel = config.building.as_ref()?;
    let root = config_path.parent().unwrap_or_else(|| Path::new("."));
    Some(root.join(rel))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.geometry.wall_height, 3.0);
        assert_eq!(config.player.size, 0.5);
        assert_eq!(config.camera.detail_zoom, 2.0);
        assert_eq!(config.colors.door_locked, Color(0xff0000));
    }

    #[test]
    fn test_partial_config_overrides() {
        let yaml = r##"
name: "E12 visitor"
building: data/e12.json
default_floor: 2
player:
  speed: 0.25
colors:
  door_unlocked: "#00aa00"
  wall: 1193046
"##;
        let config = parse_config(yaml).unwrap();
        assert_eq!(config.name, "E12 visitor");
        assert_eq!(config.default_floor, Some(2));
        assert_eq!(config.player.speed, 0.25);
        assert_eq!(config.player.size, 0.5);
        assert_eq!(config.colors.door_unlocked, Color(0x00aa00));
        assert_eq!(config.colors.wall, Color(0x123456));
        assert_eq!(
            building_path(&config, Path::new("/srv/app/floorwalk.yaml")),
            Some(PathBuf::from("/srv/app/data/e12.json"))
        );
    }

    #[test]
    fn test_bad_color_is_a_parse_error() {
        let yaml = "colors:\n  wall: \"chartreuse\"\n";
        assert!(matches!(parse_config(yaml), Err(ConfigError::Parse(_))));
    }
}
