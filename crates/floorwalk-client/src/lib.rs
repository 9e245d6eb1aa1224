//! floorwalk client: builds floor geometry, moves the player under door
//! permissions, tracks zones, and drives selection and the detail view.

pub mod builder;
pub mod camera;
pub mod config;
pub mod detail;
pub mod directory;
pub mod engine;
pub mod host;
pub mod input;
pub mod material;
pub mod mesh;
pub mod permissions;
pub mod physics;
pub mod picking;
pub mod player;
pub mod session;
pub mod world;
pub mod zones;

pub use engine::FloorplanEngine;
