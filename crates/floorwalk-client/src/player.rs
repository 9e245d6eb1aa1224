use glam::Vec3;

use floorwalk_core::components::{MaterialHandle, Player, Primitive, Shape};

use crate::builder::GeometryBuilder;
use crate::camera::Camera;
use crate::config::PlayerConfig;
use crate::input::{InputBindings, InputState};
use crate::mesh::GeometryCache;
use crate::permissions::AllowList;
use crate::physics::Bounds;

/// Result of one `update` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveOutcome {
    /// No input this tick.
    Idle,
    Moved(Vec3),
    /// Candidate overlapped blocking geometry; position unchanged.
    Blocked(hecs::Entity),
}

/// The avatar: position, input and collision-checked movement.
pub struct PlayerController {
    config: PlayerConfig,
    player: Player,
    input: InputState,
    position: Option<Vec3>,
    /// Avatar render primitive, created by `initialize`. Its geometry lives
    /// outside the floor cache so floor rebuilds never touch it.
    avatar: Option<Primitive>,
    avatar_geometry: GeometryCache,
    moved: u64,
    blocked: u64,
}

impl PlayerController {
    pub fn new(config: PlayerConfig, bindings: &InputBindings) -> Self {
        Self {
            player: Player { size: config.size },
            config,
            input: InputState::new(bindings.clone()),
            position: None,
            avatar: None,
            avatar_geometry: GeometryCache::new(),
            moved: 0,
            blocked: 0,
        }
    }

    /// Create the avatar mesh at the spawn point. Later calls are no-ops.
    pub fn initialize(&mut self, material: MaterialHandle) {
        if self.position.is_some() {
            tracing::warn!("PlayerController already initialized");
            return;
        }
        let shape = Shape::Cylinder {
            radius: self.player.size / 2.0,
            height: self.player.size * 2.0,
        };
        self.avatar = Some(Primitive {
            geometry: self.avatar_geometry.allocate(shape),
            material,
            shape,
        });
        let spawn = self.spawn_point();
        tracing::info!("Player spawned at ({:.2}, {:.2}, {:.2})", spawn.x, spawn.y, spawn.z);
        self.position = Some(spawn);
    }

    pub fn is_initialized(&self) -> bool {
        self.position.is_some()
    }

    /// Spawn position; y sits at half the avatar height.
    pub fn spawn_point(&self) -> Vec3 {
        Vec3::new(self.config.spawn[0], self.player.size, self.config.spawn[1])
    }

    /// Put the existing avatar back at the spawn point.
    pub fn respawn(&mut self) -> Vec3 {
        let spawn = self.spawn_point();
        if self.position.is_some() {
            self.position = Some(spawn);
        }
        self.input.clear();
        spawn
    }

    pub fn set_keyboard_input(&mut self, code: &str, pressed: bool) -> bool {
        self.input.set_key(code, pressed)
    }

    pub fn set_joystick_input(&mut self, x: f32, y: f32) -> bool {
        self.input.set_joystick(x, y)
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// Advance one tick against the given allow-list snapshot.
    ///
    /// # Panics
    ///
    /// Panics if called before [`initialize`](Self::initialize).
    pub fn update(
        &mut self,
        camera: &Camera,
        builder: &GeometryBuilder,
        allow: &AllowList,
    ) -> MoveOutcome {
        let Some(current) = self.position else {
            panic!("PlayerController::update called before initialize");
        };

        let axis = self.input.move_vector();
        let step = camera.ground_forward() * axis.y + camera.ground_right() * axis.x;
        if step.length_squared() <= f32::EPSILON {
            return MoveOutcome::Idle;
        }
        let candidate = current + step.normalize() * self.config.speed;

        if let Some(hit) = self.collides(candidate, builder, allow) {
            self.blocked += 1;
            tracing::trace!("Move to {:?} blocked by {:?}", candidate, hit);
            return MoveOutcome::Blocked(hit);
        }
        self.position = Some(candidate);
        self.moved += 1;
        MoveOutcome::Moved(candidate)
    }

    /// Footprint box at `center`: size wide, twice as tall, size deep.
    pub fn footprint(&self, center: Vec3) -> Bounds {
        let s = self.player.size;
        Bounds::from_center_size(center, Vec3::new(s, s * 2.0, s))
    }

    /// First blocking primitive overlapping the avatar at `candidate`:
    /// walls, then objects, then doors absent from `allow`.
    pub fn collides(
        &self,
        candidate: Vec3,
        builder: &GeometryBuilder,
        allow: &AllowList,
    ) -> Option<hecs::Entity> {
        let query = self.footprint(candidate);
        let scene = &builder.scene;
        let index = &builder.index;

        if let Some(hit) = index.first_overlap(&query, &scene.walls) {
            return Some(hit);
        }
        if let Some(hit) = index.first_overlap(&query, &scene.objects) {
            return Some(hit);
        }
        let locked: Vec<hecs::Entity> = scene
            .doors
            .iter()
            .copied()
            .filter(|&door| {
                scene
                    .door_id(door)
                    .map_or(true, |id| !allow.permits(&id))
            })
            .collect();
        index.first_overlap(&query, &locked)
    }

    pub fn position(&self) -> Option<Vec3> {
        self.position
    }

    /// HUD readout of the plan-space position.
    pub fn display_position(&self) -> String {
        match self.position {
            Some(p) => format!("x: {:.2}, z: {:.2}", p.x, p.z),
            None => "x: -, z: -".to_string(),
        }
    }

    pub fn avatar(&self) -> Option<&Primitive> {
        self.avatar.as_ref()
    }

    pub fn size(&self) -> f32 {
        self.player.size
    }

    /// (committed moves, rejected moves) so far.
    pub fn move_stats(&self) -> (u64, u64) {
        (self.moved, self.blocked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ColorConfig, GeometryConfig};
    use floorwalk_core::floor::{
        Boundary, Door, DoorSize, Floor, FloorObject, PlanPoint, Room, Wall, Zone,
    };

    fn camera() -> Camera {
        let mut camera = Camera::from_config(&Default::default());
        camera.position = Vec3::new(0.0, 10.0, -10.0);
        camera.target = Vec3::ZERO;
        camera
    }

    fn controller() -> PlayerController {
        let bindings = InputBindings::default();
        let mut player = PlayerController::new(PlayerConfig::default(), &bindings);
        player.initialize(MaterialHandle(4));
        player
    }

    fn built(floor: &mut Floor) -> GeometryBuilder {
        let mut builder = GeometryBuilder::new(GeometryConfig::default(), &ColorConfig::default());
        builder.build(floor);
        builder
    }

    fn floor_with(walls: Vec<Wall>, objects: Vec<FloorObject>, doors: Vec<Door>) -> Floor {
        Floor {
            floor: 1,
            floor_name: None,
            color: None,
            walls,
            zones: vec![Zone {
                id: "z".into(),
                name: "Z".into(),
                areas: vec![],
                rooms: vec![Room {
                    id: "r".into(),
                    name: "R".into(),
                    color: None,
                    boundary: Some(Boundary::new(
                        PlanPoint::new(-10.0, -10.0),
                        PlanPoint::new(10.0, 10.0),
                    )),
                    doors,
                }],
                objects,
                boundary: None,
                center: None,
            }],
        }
    }

    #[test]
    #[should_panic(expected = "before initialize")]
    fn test_update_before_initialize_panics() {
        let bindings = InputBindings::default();
        let mut player = PlayerController::new(PlayerConfig::default(), &bindings);
        let builder = GeometryBuilder::new(GeometryConfig::default(), &ColorConfig::default());
        player.update(&camera(), &builder, &AllowList::default());
    }

    #[test]
    fn test_spawn_at_half_height() {
        let player = controller();
        assert_eq!(player.position(), Some(Vec3::new(0.0, 0.5, 0.0)));
        assert_eq!(player.display_position(), "x: 0.00, z: 0.00");
        let avatar = player.avatar().unwrap();
        assert_eq!(avatar.material, MaterialHandle(4));
        assert_eq!(avatar.shape, Shape::Cylinder { radius: 0.25, height: 1.0 });
    }

    #[test]
    fn test_second_initialize_keeps_first_avatar() {
        let mut player = controller();
        player.initialize(MaterialHandle(9));
        assert_eq!(player.avatar().unwrap().material, MaterialHandle(4));
    }

    #[test]
    fn test_forward_moves_along_camera_ground_direction() {
        let mut floor = floor_with(vec![], vec![], vec![]);
        let builder = built(&mut floor);
        let mut player = controller();
        player.set_keyboard_input("ArrowUp", true);
        let outcome = player.update(&camera(), &builder, &AllowList::default());
        assert!(matches!(outcome, MoveOutcome::Moved(_)));
        let p = player.position().unwrap();
        assert!((p.z - 0.1).abs() < 1e-5);
        assert!(p.x.abs() < 1e-5);
        assert_eq!(p.y, 0.5);
    }

    #[test]
    fn test_diagonal_is_normalized() {
        let mut floor = floor_with(vec![], vec![], vec![]);
        let builder = built(&mut floor);
        let mut player = controller();
        player.set_keyboard_input("ArrowUp", true);
        player.set_keyboard_input("ArrowRight", true);
        player.update(&camera(), &builder, &AllowList::default());
        let p = player.position().unwrap();
        assert!((Vec3::new(p.x, 0.0, p.z).length() - 0.1).abs() < 1e-5);
        // Screen-right is -x for this camera.
        assert!(p.x < 0.0);
    }

    #[test]
    fn test_wall_blocks_from_any_side() {
        let wall = Wall {
            start: PlanPoint::new(-2.0, 0.4),
            end: PlanPoint::new(2.0, 0.4),
        };
        let mut floor = floor_with(vec![wall], vec![], vec![]);
        let builder = built(&mut floor);
        let allow = AllowList::default();

        let mut player = controller();
        player.set_keyboard_input("ArrowUp", true);
        assert!(matches!(
            player.update(&camera(), &builder, &allow),
            MoveOutcome::Blocked(_)
        ));
        assert_eq!(player.position(), Some(Vec3::new(0.0, 0.5, 0.0)));

        // Approach from the far side.
        assert!(player
            .collides(Vec3::new(0.0, 0.5, 0.8), &builder, &allow)
            .is_none());
        assert!(player
            .collides(Vec3::new(0.0, 0.5, 0.6), &builder, &allow)
            .is_some());
    }

    #[test]
    fn test_object_blocks() {
        let object = FloorObject {
            id: "o".into(),
            name: None,
            kind: "desk".into(),
            boundary: Some(Boundary::new(PlanPoint::new(-1.0, 0.3), PlanPoint::new(1.0, 1.0))),
        };
        let mut floor = floor_with(vec![], vec![object], vec![]);
        let builder = built(&mut floor);
        let mut player = controller();
        player.set_keyboard_input("KeyW", true);
        assert!(matches!(
            player.update(&camera(), &builder, &AllowList::default()),
            MoveOutcome::Blocked(_)
        ));
    }

    #[test]
    fn test_permitted_door_is_permeable() {
        let door = Door {
            id: "d1".into(),
            name: None,
            center: PlanPoint::new(0.0, 0.4),
            size: DoorSize { width: 1.0, depth: 0.2 },
            access_level: None,
            requires_allow_list: true,
        };
        let mut floor = floor_with(vec![], vec![], vec![door]);
        let builder = built(&mut floor);
        let mut player = controller();
        player.set_keyboard_input("ArrowUp", true);

        let locked = AllowList::default();
        assert!(matches!(
            player.update(&camera(), &builder, &locked),
            MoveOutcome::Blocked(_)
        ));
        let open = AllowList::new(["d1"]);
        assert!(matches!(
            player.update(&camera(), &builder, &open),
            MoveOutcome::Moved(_)
        ));
        assert_eq!(player.move_stats(), (1, 1));
    }

    #[test]
    fn test_no_input_is_idle() {
        let mut floor = floor_with(vec![], vec![], vec![]);
        let builder = built(&mut floor);
        let mut player = controller();
        assert_eq!(
            player.update(&camera(), &builder, &AllowList::default()),
            MoveOutcome::Idle
        );
    }

    #[test]
    fn test_respawn_keeps_avatar() {
        let mut floor = floor_with(vec![], vec![], vec![]);
        let builder = built(&mut floor);
        let mut player = controller();
        player.set_joystick_input(0.0, 1.0);
        player.update(&camera(), &builder, &AllowList::default());
        assert_ne!(player.position(), Some(player.spawn_point()));
        player.respawn();
        assert_eq!(player.position(), Some(player.spawn_point()));
        assert_eq!(player.input().move_vector(), glam::Vec2::ZERO);
        assert!(player.avatar().is_some());
    }
}
