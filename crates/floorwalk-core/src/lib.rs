//! floorwalk core: floor-plan data model, JSON load boundary, shared
//! components, events and state holders.

pub mod components;
pub mod events;
pub mod floor;
pub mod schema;
pub mod watch;
