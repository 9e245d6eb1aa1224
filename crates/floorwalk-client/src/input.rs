use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// The four directional flags driven by the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Key codes (DOM `KeyboardEvent.code` names) bound to each direction.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputBindings {
    #[serde(default = "default_up")]
    pub up: Vec<String>,
    #[serde(default = "default_down")]
    pub down: Vec<String>,
    #[serde(default = "default_left")]
    pub left: Vec<String>,
    #[serde(default = "default_right")]
    pub right: Vec<String>,
}

fn default_up() -> Vec<String> {
    vec!["ArrowUp".into(), "KeyW".into()]
}
fn default_down() -> Vec<String> {
    vec!["ArrowDown".into(), "KeyS".into()]
}
fn default_left() -> Vec<String> {
    vec!["ArrowLeft".into(), "KeyA".into()]
}
fn default_right() -> Vec<String> {
    vec!["ArrowRight".into(), "KeyD".into()]
}

impl Default for InputBindings {
    fn default() -> Self {
        Self {
            up: default_up(),
            down: default_down(),
            left: default_left(),
            right: default_right(),
        }
    }
}

impl InputBindings {
    /// Map a key code to the direction it drives.
    pub fn direction_for(&self, code: &str) -> Option<Direction> {
        let bound = |keys: &Vec<String>| keys.iter().any(|k| k == code);
        if bound(&self.up) {
            Some(Direction::Up)
        } else if bound(&self.down) {
            Some(Direction::Down)
        } else if bound(&self.left) {
            Some(Direction::Left)
        } else if bound(&self.right) {
            Some(Direction::Right)
        } else {
            None
        }
    }
}

/// Movement input state.
///
/// Event callbacks only write here; the tick reads `move_vector`. The vector
/// is `x` = right, `y` = forward, each in [-1, 1].
pub struct InputState {
    bindings: InputBindings,
    keys_held: HashSet<String>,
    move_vector: Vec2,
}

impl InputState {
    pub fn new(bindings: InputBindings) -> Self {
        Self {
            bindings,
            keys_held: HashSet::new(),
            move_vector: Vec2::ZERO,
        }
    }

    /// Record a key transition. Returns false for keys bound to no direction.
    pub fn set_key(&mut self, code: &str, pressed: bool) -> bool {
        if self.bindings.direction_for(code).is_none() {
            return false;
        }
        if pressed {
            self.keys_held.insert(code.to_string());
        } else {
            self.keys_held.remove(code);
        }
        self.move_vector = self.keyboard_axis();
        true
    }

    /// Record an analog stick vector. Ignored while any direction key is held.
    pub fn set_joystick(&mut self, x: f32, y: f32) -> bool {
        if self.any_direction_held() {
            return false;
        }
        let x = if x.is_finite() { x.clamp(-1.0, 1.0) } else { 0.0 };
        let y = if y.is_finite() { y.clamp(-1.0, 1.0) } else { 0.0 };
        self.move_vector = Vec2::new(x, y);
        true
    }

    pub fn held(&self, direction: Direction) -> bool {
        self.keys_held
            .iter()
            .any(|code| self.bindings.direction_for(code) == Some(direction))
    }

    pub fn any_direction_held(&self) -> bool {
        !self.keys_held.is_empty()
    }

    /// `right·(right−left) + forward·(up−down)` as a 2D axis.
    fn keyboard_axis(&self) -> Vec2 {
        let mut axis = Vec2::ZERO;
        if self.held(Direction::Up) {
            axis.y += 1.0;
        }
        if self.held(Direction::Down) {
            axis.y -= 1.0;
        }
        if self.held(Direction::Left) {
            axis.x -= 1.0;
        }
        if self.held(Direction::Right) {
            axis.x += 1.0;
        }
        axis
    }

    pub fn move_vector(&self) -> Vec2 {
        self.move_vector
    }

    /// Drop all held keys and stick input.
    pub fn clear(&mut self) {
        self.keys_held.clear();
        self.move_vector = Vec2::ZERO;
    }
}
