//! The floor-plan engine: owns every subsystem and drives them one tick at
//! a time in a fixed order.

use std::path::Path;
use std::sync::Arc;

use glam::Vec3;

use floorwalk_core::components::{DoorState, Primitive, Tag};
use floorwalk_core::events::{EngineEvent, EventBus, EventRecord, PrimitiveCounts};
use floorwalk_core::floor::{Building, Floor};
use floorwalk_core::schema::{self, FloorDataError};

use crate::builder::GeometryBuilder;
use crate::config::EngineConfig;
use crate::detail::{SelectionDetailFlow, SelectionRequest};
use crate::directory::Directory;
use crate::host::SceneHost;
use crate::permissions::{AllowList, PermissionGate};
use crate::picking::{PickSkip, PickingController};
use crate::player::{MoveOutcome, PlayerController};
use crate::zones::ZoneTracker;

const EVENT_LOG_CAPACITY: usize = 1000;

pub struct FloorplanEngine {
    config: EngineConfig,
    building: Building,
    current_floor: Option<i32>,
    pub host: SceneHost,
    builder: GeometryBuilder,
    player: PlayerController,
    gate: PermissionGate,
    zones: ZoneTracker,
    picker: PickingController,
    detail: SelectionDetailFlow,
    directory: Directory,
    pub events: EventBus,
    /// Point the camera eases toward; the player, or the pinned selection.
    look_at: Vec3,
    last_move: MoveOutcome,
    ticks: u64,
}

impl FloorplanEngine {
    /// Create the engine and load the configured (or first) floor.
    pub fn new(config: EngineConfig, building: Building) -> Self {
        let builder = GeometryBuilder::new(config.geometry.clone(), &config.colors);
        let mut player = PlayerController::new(config.player.clone(), &config.input);
        player.initialize(builder.materials().player);
        let look_at = player.spawn_point();

        let mut engine = Self {
            host: SceneHost::new(&config.camera, &config.colors),
            builder,
            player,
            gate: PermissionGate::new(),
            zones: ZoneTracker::new(),
            picker: PickingController::new(),
            detail: SelectionDetailFlow::new(config.camera.detail_zoom),
            directory: Directory::index(&building),
            events: EventBus::new(EVENT_LOG_CAPACITY),
            look_at,
            last_move: MoveOutcome::Idle,
            ticks: 0,
            current_floor: None,
            building,
            config,
        };

        let initial = engine
            .config
            .default_floor
            .filter(|n| engine.building.floor(*n).is_some())
            .or_else(|| engine.building.first_floor());
        match initial {
            Some(n) => {
                engine.select_floor(n);
            }
            None => tracing::warn!(
                "Building '{}' has no floors, nothing to build",
                engine.building.building_id
            ),
        }
        engine
    }

    /// Load the building JSON and create the engine.
    pub fn load(config: EngineConfig, building_path: &Path) -> Result<Self, FloorDataError> {
        let building = schema::load_building(building_path)?;
        Ok(Self::new(config, building))
    }

    /// One simulation step: player, zones, camera, events. In that order.
    pub fn tick(&mut self) -> Vec<EventRecord> {
        // Collision for this whole tick sees the list as of now.
        let allow = self.gate.snapshot();

        self.last_move = self
            .player
            .update(&self.host.camera, &self.builder, &allow);
        let position = self.player_position();

        if let Some(floor) = self.current_floor.and_then(|n| self.building.floor(n)) {
            if let Some(zone_id) = self.zones.check(position, floor) {
                self.events.emit(EngineEvent::ZoneChanged { zone_id });
            }
        }

        match self.detail.pinned_target() {
            Some(target) => self.look_at = target,
            None if !self.detail.is_open() => self.look_at = position,
            None => {}
        }
        self.host.follow(self.look_at, self.config.camera.follow_lerp);

        let records = self.events.flush();
        self.events.advance_tick();
        self.ticks += 1;
        records
    }

    /// Run `count` ticks, returning every event produced.
    pub fn run_ticks(&mut self, count: u64) -> Vec<EventRecord> {
        let mut all = Vec::new();
        for _ in 0..count {
            all.extend(self.tick());
        }
        all
    }

    /// Deliver events queued outside a tick.
    pub fn flush_events(&mut self) -> Vec<EventRecord> {
        self.events.flush()
    }

    // -- input ---------------------------------------------------------------

    pub fn key_input(&mut self, code: &str, pressed: bool) -> bool {
        self.player.set_keyboard_input(code, pressed)
    }

    pub fn joystick_input(&mut self, x: f32, y: f32) -> bool {
        self.player.set_joystick_input(x, y)
    }

    /// Joystick drag start; orbiting and picking pause until release.
    pub fn begin_drag(&mut self) {
        self.host.controls.begin_drag();
    }

    pub fn end_drag(&mut self) {
        self.host.controls.end_drag();
    }

    pub fn resize(&mut self, width: f32, height: f32) -> bool {
        self.host.resize(width, height)
    }

    /// Offset of the render surface within the client area, in pixels.
    /// Clicks are given in client pixels and picked relative to it.
    pub fn set_viewport_origin(&mut self, left: f32, top: f32) {
        self.host.set_origin(left, top);
    }

    // -- selection -----------------------------------------------------------

    /// Pick at a client pixel and open the detail view on a hit.
    pub fn click(&mut self, screen_x: f32, screen_y: f32) -> Option<Tag> {
        match self.picker.handle_click(
            screen_x,
            screen_y,
            &self.host,
            &self.builder,
            self.detail.is_open(),
        ) {
            Ok(hit) => {
                self.open_detail(hit.tag.clone());
                Some(hit.tag)
            }
            Err(PickSkip::Miss) => None,
            Err(reason) => {
                tracing::debug!("Click ignored: {:?}", reason);
                None
            }
        }
    }

    /// Focus an entity requested from outside, switching floor if needed.
    pub fn select(&mut self, request: SelectionRequest) -> bool {
        let tag = match request {
            SelectionRequest::Tagged(tag) => tag,
            SelectionRequest::ById { id } => match self.directory.lookup(&id) {
                Some(SelectionRequest::Tagged(tag)) => tag,
                _ => {
                    tracing::warn!("Selection request for unknown id '{}'", id);
                    return false;
                }
            },
        };
        if Some(tag.floor) != self.current_floor && !self.select_floor(tag.floor) {
            return false;
        }
        self.open_detail(tag);
        true
    }

    fn open_detail(&mut self, tag: Tag) {
        if let Some(target) = self.detail.open(tag.clone(), &mut self.host) {
            self.look_at = target;
        }
        self.events.emit(EngineEvent::DetailOpened { selection: tag });
    }

    /// Close the detail view and re-anchor the camera on the player.
    pub fn close_detail(&mut self) -> bool {
        if !self.detail.close(&mut self.host) {
            return false;
        }
        self.look_at = self.player_position();
        self.events.emit(EngineEvent::DetailClosed);
        true
    }

    // -- permissions ---------------------------------------------------------

    /// Replace the allow-list. Door materials update now; collision sees the
    /// new list from the next tick.
    pub fn set_allow_list<I, S>(&mut self, ids: I) -> Arc<AllowList>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let allow = self.gate.set_allow_list(ids);
        self.builder.update_door_materials(&allow);
        self.events.emit(EngineEvent::PermissionsChanged {
            allowed: allow.len(),
        });
        if let Some((selection, unlocked)) = self.detail.refresh_door(&allow) {
            self.events
                .emit(EngineEvent::DetailRefreshed { selection, unlocked });
        }
        allow
    }

    pub fn allow_list(&self) -> Arc<AllowList> {
        self.gate.snapshot()
    }

    // -- floors --------------------------------------------------------------

    /// Tear down the current floor and build `number` in its place.
    pub fn select_floor(&mut self, number: i32) -> bool {
        if self.building.floor(number).is_none() {
            tracing::warn!("No floor {} in building '{}'", number, self.building.building_id);
            return false;
        }

        self.close_detail();
        if self.zones.reset() {
            self.events.emit(EngineEvent::ZoneChanged { zone_id: None });
        }
        self.builder.clear();

        let Some(floor) = self.building.floor_mut(number) else {
            return false;
        };
        let counts = self.builder.build(floor);
        let ground = floor.color.unwrap_or(self.config.colors.ground);
        self.current_floor = Some(number);

        self.look_at = self.player.respawn();
        self.host.set_ground_color(ground);
        let allow = self.gate.snapshot();
        self.builder.update_door_materials(&allow);

        self.events
            .emit(EngineEvent::FloorLoaded { floor: number, counts });
        true
    }

    /// Swap in freshly loaded building data and rebuild the current floor.
    pub fn reload_building(&mut self, building: Building) {
        let keep = self.current_floor;
        self.building = building;
        self.directory = Directory::index(&self.building);
        let target = keep
            .filter(|n| self.building.floor(*n).is_some())
            .or_else(|| self.building.first_floor());
        match target {
            Some(n) => {
                self.select_floor(n);
            }
            None => {
                self.close_detail();
                if self.zones.reset() {
                    self.events.emit(EngineEvent::ZoneChanged { zone_id: None });
                }
                self.builder.clear();
                self.current_floor = None;
                tracing::warn!("Reloaded building has no floors");
            }
        }
    }

    // -- queries -------------------------------------------------------------

    pub fn player_position(&self) -> Vec3 {
        self.player
            .position()
            .unwrap_or_else(|| self.player.spawn_point())
    }

    pub fn player_display_position(&self) -> String {
        self.player.display_position()
    }

    pub fn avatar(&self) -> Option<&Primitive> {
        self.player.avatar()
    }

    pub fn last_move(&self) -> MoveOutcome {
        self.last_move
    }

    pub fn current_zone(&self) -> Option<&str> {
        self.zones.current()
    }

    pub fn current_floor(&self) -> Option<&Floor> {
        self.current_floor.and_then(|n| self.building.floor(n))
    }

    pub fn current_floor_number(&self) -> Option<i32> {
        self.current_floor
    }

    pub fn is_detail_open(&self) -> bool {
        self.detail.is_open()
    }

    pub fn selection(&self) -> Option<&Tag> {
        self.detail.selection()
    }

    pub fn look_at(&self) -> Vec3 {
        self.look_at
    }

    pub fn zoom(&self) -> f32 {
        self.host.camera.zoom
    }

    pub fn door_state(&self, id: &str) -> Option<DoorState> {
        self.builder.door_state(id)
    }

    pub fn counts(&self) -> PrimitiveCounts {
        self.builder.counts()
    }

    pub fn builder(&self) -> &GeometryBuilder {
        &self.builder
    }

    pub fn building(&self) -> &Building {
        &self.building
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorwalk_core::events::EventKind;
    use floorwalk_core::floor::{Boundary, Door, DoorSize, PlanPoint, Room, Zone};

    fn floor(n: i32, room_id: &str) -> Floor {
        Floor {
            floor: n,
            floor_name: None,
            color: None,
            walls: vec![],
            zones: vec![Zone {
                id: format!("z{}", n),
                name: "Zone".into(),
                areas: vec![],
                rooms: vec![Room {
                    id: room_id.into(),
                    name: "Room".into(),
                    color: None,
                    boundary: Some(Boundary::new(
                        PlanPoint::new(-10.0, -10.0),
                        PlanPoint::new(10.0, 10.0),
                    )),
                    doors: vec![Door {
                        id: format!("d{}", n),
                        name: None,
                        center: PlanPoint::new(5.0, 5.0),
                        size: DoorSize { width: 1.0, depth: 0.2 },
                        access_level: None,
                        requires_allow_list: true,
                    }],
                }],
                objects: vec![],
                boundary: None,
                center: None,
            }],
        }
    }

    fn engine() -> FloorplanEngine {
        let building = Building {
            building_id: "b".into(),
            building_name: None,
            floors: vec![floor(1, "r1"), floor(2, "r2")],
        };
        FloorplanEngine::new(EngineConfig::default(), building)
    }

    #[test]
    fn test_new_loads_first_floor() {
        let mut e = engine();
        assert_eq!(e.current_floor_number(), Some(1));
        assert_eq!(e.counts().doors, 1);
        let events = e.tick();
        assert!(events.iter().any(|r| r.event.kind() == EventKind::FloorLoaded));
        assert!(events
            .iter()
            .any(|r| r.event == EngineEvent::ZoneChanged { zone_id: Some("r1".into()) }));
        assert_eq!(e.current_zone(), Some("r1"));
    }

    #[test]
    fn test_select_floor_resets_state() {
        let mut e = engine();
        e.tick();
        e.set_allow_list(["d2"]);
        e.select(SelectionRequest::ById { id: "r1".into() });
        assert!(e.is_detail_open());

        assert!(e.select_floor(2));
        assert!(!e.is_detail_open());
        assert_eq!(e.current_zone(), None);
        assert_eq!(e.player_position(), Vec3::new(0.0, 0.5, 0.0));
        assert_eq!(e.door_state("d2"), Some(DoorState::Unlocked));
        assert_eq!(e.look_at(), e.player_position());

        e.tick();
        assert_eq!(e.current_zone(), Some("r2"));
        assert!(!e.select_floor(9));
        assert_eq!(e.current_floor_number(), Some(2));
    }

    #[test]
    fn test_select_on_other_floor_switches() {
        let mut e = engine();
        assert!(e.select(SelectionRequest::ById { id: "d2".into() }));
        assert_eq!(e.current_floor_number(), Some(2));
        assert_eq!(e.selection().unwrap().id(), "d2");
        assert_eq!(e.look_at(), Vec3::new(5.0, 0.0, 5.0));
        assert!(!e.select(SelectionRequest::ById { id: "nope".into() }));
    }

    #[test]
    fn test_open_door_detail_is_refreshed_on_permission_change() {
        let mut e = engine();
        e.select(SelectionRequest::ById { id: "d1".into() });
        e.flush_events();
        e.set_allow_list(["d1"]);
        let events = e.flush_events();
        assert!(events.iter().any(|r| matches!(
            &r.event,
            EngineEvent::DetailRefreshed { unlocked: true, .. }
        )));
    }

    #[test]
    fn test_detail_pins_camera_until_closed() {
        let mut e = engine();
        e.select(SelectionRequest::ById { id: "d1".into() });
        e.key_input("ArrowUp", true);
        e.tick();
        assert_eq!(e.look_at(), Vec3::new(5.0, 0.0, 5.0));
        assert_eq!(e.zoom(), 2.0);

        e.close_detail();
        assert_eq!(e.zoom(), 1.0);
        e.tick();
        assert_eq!(e.look_at(), e.player_position());
    }

    fn building(floors: Vec<Floor>) -> Building {
        Building {
            building_id: "b".into(),
            building_name: None,
            floors,
        }
    }

    #[test]
    fn test_avatar_uses_player_material() {
        let e = engine();
        let avatar = e.avatar().unwrap();
        let material = e.builder().materials().get(avatar.material).unwrap();
        assert_eq!(material.color, e.config().colors.player);
    }

    #[test]
    fn test_reload_keeps_floor_and_rebuilds() {
        let mut e = engine();
        e.select_floor(2);
        e.set_allow_list(["d2", "d2b"]);
        e.select(SelectionRequest::ById { id: "r2".into() });
        e.flush_events();

        let mut changed = floor(2, "r2");
        let room = &mut changed.zones[0].rooms[0];
        room.boundary = Some(Boundary::new(
            PlanPoint::new(0.0, 0.0),
            PlanPoint::new(4.0, 4.0),
        ));
        let mut extra = room.doors[0].clone();
        extra.id = "d2b".into();
        extra.center = PlanPoint::new(2.0, 0.0);
        room.doors.push(extra);
        e.reload_building(building(vec![floor(1, "r1"), changed]));

        assert_eq!(e.current_floor_number(), Some(2));
        assert_eq!(e.counts().doors, 2);
        let zone = &e.current_floor().unwrap().zones[0];
        assert_eq!(zone.center, Some(PlanPoint::new(2.0, 2.0)));
        assert!(!e.is_detail_open());

        let unlocked = e.builder().materials().door_unlocked;
        assert_eq!(e.builder().door_material("d2b"), Some(unlocked));
        assert_eq!(e.door_state("d2"), Some(DoorState::Unlocked));

        let events = e.flush_events();
        assert!(events.iter().any(|r| r.event == EngineEvent::DetailClosed));
        assert!(events.iter().any(|r| matches!(
            &r.event,
            EngineEvent::FloorLoaded { floor: 2, counts } if counts.doors == 2
        )));
    }

    #[test]
    fn test_reload_without_current_floor_falls_back() {
        let mut e = engine();
        e.select_floor(2);
        e.tick();
        assert_eq!(e.current_zone(), Some("r2"));

        e.reload_building(building(vec![floor(1, "r1")]));
        assert_eq!(e.current_floor_number(), Some(1));
        assert_eq!(e.door_state("d1"), Some(DoorState::Locked));
        assert!(e.door_state("d2").is_none());
        e.tick();
        assert_eq!(e.current_zone(), Some("r1"));
    }

    #[test]
    fn test_reload_empty_building_clears_zone() {
        let mut e = engine();
        e.tick();
        assert_eq!(e.current_zone(), Some("r1"));

        e.reload_building(building(vec![]));
        let events = e.run_ticks(3);
        assert_eq!(e.current_zone(), None);
        assert_eq!(e.current_floor_number(), None);
        assert_eq!(e.counts().total(), 0);
        assert!(events
            .iter()
            .any(|r| r.event == EngineEvent::ZoneChanged { zone_id: None }));
    }
}
