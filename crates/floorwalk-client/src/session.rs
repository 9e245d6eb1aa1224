//! Headless session playback.
//!
//! A session YAML file scripts input, selection and permission changes
//! against a building, interleaved with assertions on the engine state. No
//! window or GPU is involved.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use floorwalk_core::components::DoorState;
use floorwalk_core::schema::{self, FloorDataError};

use crate::config::EngineConfig;
use crate::detail::SelectionRequest;
use crate::engine::FloorplanEngine;

#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub name: Option<String>,
    /// Building JSON, relative to the session file.
    #[serde(default)]
    pub building: Option<String>,
    #[serde(default)]
    pub floor: Option<i32>,
    #[serde(default)]
    pub allow_list: Vec<String>,
    /// Initial surface size; sessions that click need one.
    #[serde(default)]
    pub viewport: Option<[f32; 2]>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Key {
        code: String,
        #[serde(default = "default_true")]
        pressed: bool,
    },
    Joystick {
        x: f32,
        y: f32,
    },
    Drag {
        active: bool,
    },
    Tick {
        #[serde(default = "default_one")]
        count: u64,
    },
    Click {
        x: f32,
        y: f32,
    },
    ClickCenter,
    Select {
        id: String,
    },
    CloseDetail,
    Allow {
        #[serde(default)]
        ids: Vec<String>,
    },
    Floor {
        number: i32,
    },
    Resize {
        width: f32,
        height: f32,
    },
    ExpectZone {
        #[serde(default)]
        id: Option<String>,
    },
    ExpectPosition {
        x: f32,
        z: f32,
        #[serde(default = "default_tolerance")]
        tolerance: f32,
    },
    ExpectDetail {
        open: bool,
        #[serde(default)]
        id: Option<String>,
    },
    ExpectDoor {
        id: String,
        unlocked: bool,
    },
}

fn default_true() -> bool {
    true
}
fn default_one() -> u64 {
    1
}
fn default_tolerance() -> f32 {
    0.01
}

impl Step {
    pub fn is_assertion(&self) -> bool {
        matches!(
            self,
            Step::ExpectZone { .. }
                | Step::ExpectPosition { .. }
                | Step::ExpectDetail { .. }
                | Step::ExpectDoor { .. }
        )
    }
}

#[derive(Debug)]
pub enum SessionError {
    Io(std::io::Error),
    Parse(serde_yaml::Error),
    FloorData(FloorDataError),
    NoBuilding,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "Session IO error: {}", e),
            Self::Parse(e) => write!(f, "Session parse error: {}", e),
            Self::FloorData(e) => write!(f, "Building data error: {}", e),
            Self::NoBuilding => write!(
                f,
                "No building file: set `building` in the session or floorwalk.yaml"
            ),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<FloorDataError> for SessionError {
    fn from(e: FloorDataError) -> Self {
        Self::FloorData(e)
    }
}

/// Outcome of one assertion step.
#[derive(Debug, Clone)]
pub struct AssertionResult {
    pub step: usize,
    pub name: String,
    pub passed: bool,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
pub struct SessionReport {
    pub name: String,
    pub results: Vec<AssertionResult>,
    pub ticks: u64,
    pub events: usize,
}

impl SessionReport {
    pub fn passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &AssertionResult> {
        self.results.iter().filter(|r| !r.passed)
    }
}

pub fn parse_session(contents: &str) -> Result<Session, SessionError> {
    serde_yaml::from_str(contents).map_err(SessionError::Parse)
}

pub fn load_session(path: &Path) -> Result<Session, SessionError> {
    let contents = std::fs::read_to_string(path).map_err(SessionError::Io)?;
    parse_session(&contents)
}

/// Building path for a session: its own `building` relative to the session
/// file, else `fallback`.
pub fn resolve_building(
    session: &Session,
    session_path: &Path,
    fallback: Option<&Path>,
) -> Option<PathBuf> {
    match &session.building {
        Some(rel) => {
            let root = session_path.parent().unwrap_or_else(|| Path::new("."));
            Some(root.join(rel))
        }
        None => fallback.map(Path::to_path_buf),
    }
}

/// Load a session file and its building, then play it on a fresh engine.
/// With `event_log`, every flushed event is appended there as a JSON line.
pub fn run_session_file(
    config: &EngineConfig,
    session_path: &Path,
    fallback_building: Option<&Path>,
    event_log: Option<&Path>,
) -> Result<SessionReport, SessionError> {
    let session = load_session(session_path)?;
    let building_path =
        resolve_building(&session, session_path, fallback_building).ok_or(SessionError::NoBuilding)?;
    let building = schema::load_building(&building_path)?;

    let mut engine = FloorplanEngine::new(config.clone(), building);
    if let Some(path) = event_log {
        engine.events.enable_file_logging(path.to_path_buf());
    }
    let mut report = run_session(&mut engine, &session);
    if report.name.is_empty() {
        report.name = session_path.display().to_string();
    }
    Ok(report)
}

/// Apply the session preamble and every step to `engine`.
pub fn run_session(engine: &mut FloorplanEngine, session: &Session) -> SessionReport {
    let mut report = SessionReport {
        name: session.name.clone().unwrap_or_default(),
        ..Default::default()
    };

    if let Some([w, h]) = session.viewport {
        engine.resize(w, h);
    }
    if let Some(n) = session.floor {
        if !engine.select_floor(n) {
            tracing::warn!("Session floor {} not found", n);
        }
    }
    engine.set_allow_list(session.allow_list.iter().cloned());

    let start_tick = engine.ticks();
    for (i, step) in session.steps.iter().enumerate() {
        if step.is_assertion() {
            let outcome = check(engine, step);
            report.results.push(AssertionResult {
                step: i,
                name: describe(step),
                passed: outcome.is_ok(),
                error: outcome.err(),
            });
        } else {
            report.events += apply(engine, step);
        }
    }
    report.events += engine.flush_events().len();
    report.ticks = engine.ticks() - start_tick;

    tracing::info!(
        "Session '{}': {}/{} assertions passed over {} ticks",
        report.name,
        report.results.iter().filter(|r| r.passed).count(),
        report.results.len(),
        report.ticks
    );
    report
}

/// Perform an action step. Returns the number of events it flushed.
fn apply(engine: &mut FloorplanEngine, step: &Step) -> usize {
    match step {
        Step::Key { code, pressed } => {
            if !engine.key_input(code, *pressed) {
                tracing::warn!("Key '{}' is not bound to a direction", code);
            }
            0
        }
        Step::Joystick { x, y } => {
            engine.joystick_input(*x, *y);
            0
        }
        Step::Drag { active } => {
            if *active {
                engine.begin_drag();
            } else {
                engine.end_drag();
            }
            0
        }
        Step::Tick { count } => engine.run_ticks(*count).len(),
        Step::Click { x, y } => {
            engine.click(*x, *y);
            0
        }
        Step::ClickCenter => {
            let center = engine.host.viewport().center();
            engine.click(center.x, center.y);
            0
        }
        Step::Select { id } => {
            engine.select(SelectionRequest::ById { id: id.clone() });
            0
        }
        Step::CloseDetail => {
            engine.close_detail();
            0
        }
        Step::Allow { ids } => {
            engine.set_allow_list(ids.iter().cloned());
            0
        }
        Step::Floor { number } => {
            engine.select_floor(*number);
            0
        }
        Step::Resize { width, height } => {
            engine.resize(*width, *height);
            0
        }
        _ => 0,
    }
}

fn check(engine: &FloorplanEngine, step: &Step) -> Result<(), String> {
    match step {
        Step::ExpectZone { id } => {
            let actual = engine.current_zone();
            if actual == id.as_deref() {
                Ok(())
            } else {
                Err(format!("zone is {:?}, expected {:?}", actual, id))
            }
        }
        Step::ExpectPosition { x, z, tolerance } => {
            let p = engine.player_position();
            if (p.x - x).abs() <= *tolerance && (p.z - z).abs() <= *tolerance {
                Ok(())
            } else {
                Err(format!(
                    "player at ({:.3}, {:.3}), expected ({:.3}, {:.3}) ± {}",
                    p.x, p.z, x, z, tolerance
                ))
            }
        }
        Step::ExpectDetail { open, id } => {
            if engine.is_detail_open() != *open {
                return Err(format!("detail open is {}, expected {}", !open, open));
            }
            match (id, engine.selection()) {
                (Some(want), Some(tag)) if tag.id() != want => {
                    Err(format!("selection is '{}', expected '{}'", tag.id(), want))
                }
                (Some(want), None) => Err(format!("nothing selected, expected '{}'", want)),
                _ => Ok(()),
            }
        }
        Step::ExpectDoor { id, unlocked } => {
            let want = if *unlocked {
                DoorState::Unlocked
            } else {
                DoorState::Locked
            };
            match engine.door_state(id) {
                Some(state) if state == want => Ok(()),
                Some(state) => Err(format!("door '{}' is {:?}, expected {:?}", id, state, want)),
                None => Err(format!("door '{}' is not on the current floor", id)),
            }
        }
        _ => Ok(()),
    }
}

fn describe(step: &Step) -> String {
    match step {
        Step::ExpectZone { id } => format!("expect_zone {}", id.as_deref().unwrap_or("null")),
        Step::ExpectPosition { x, z, .. } => format!("expect_position ({}, {})", x, z),
        Step::ExpectDetail { open, id } => match id {
            Some(id) => format!("expect_detail open={} id={}", open, id),
            None => format!("expect_detail open={}", open),
        },
        Step::ExpectDoor { id, unlocked } => format!("expect_door {} unlocked={}", id, unlocked),
        other => format!("{:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorwalk_core::schema::parse_building;

    const BUILDING: &str = r#"{
        "buildingId": "demo",
        "floors": [{
            "floor": 1,
            "floorName": "Ground",
            "walls": [],
            "zones": [{
                "id": "z1",
                "name": "Main",
                "rooms": [{
                    "id": "r1",
                    "name": "Office",
                    "boundary": {"min": {"x": -10, "y": -10}, "max": {"x": 10, "y": 10}},
                    "doors": [{
                        "id": "d1",
                        "center": {"x": 0, "y": 3},
                        "size": {"width": 2, "depth": 0.2}
                    }]
                }]
            }]
        }]
    }"#;

    fn engine() -> FloorplanEngine {
        let mut config = EngineConfig::default();
        // Camera behind the spawn looking down +z.
        config.camera.position = [0.0, 10.0, -10.0];
        config.camera.target = [0.0, 0.0, 0.0];
        config.camera.follow_offset = [0.0, 10.0, -10.0];
        FloorplanEngine::new(config, parse_building(BUILDING).unwrap())
    }

    #[test]
    fn test_parse_session_steps() {
        let yaml = r#"
name: walk
allow_list: [d1]
viewport: [800, 600]
steps:
  - key: { code: ArrowUp }
  - tick: { count: 5 }
  - close_detail
  - expect_zone: { id: r1 }
  - expect_detail: { open: false }
"#;
        let session = parse_session(yaml).unwrap();
        assert_eq!(session.allow_list, vec!["d1".to_string()]);
        assert_eq!(session.steps.len(), 5);
        assert!(matches!(session.steps[0], Step::Key { pressed: true, .. }));
        assert!(matches!(session.steps[2], Step::CloseDetail));
        assert!(session.steps[3].is_assertion());
    }

    #[test]
    fn test_door_blocks_until_allowed() {
        let yaml = r#"
steps:
  - key: { code: ArrowUp }
  - tick: { count: 40 }
  - expect_position: { x: 0, z: 2.6, tolerance: 0.11 }
  - expect_door: { id: d1, unlocked: false }
  - allow: { ids: [d1] }
  - tick: { count: 10 }
  - expect_door: { id: d1, unlocked: true }
  - expect_position: { x: 0, z: 3.6, tolerance: 0.11 }
"#;
        let session = parse_session(yaml).unwrap();
        let mut e = engine();
        let report = run_session(&mut e, &session);
        let failures: Vec<_> = report.failures().collect();
        assert!(failures.is_empty(), "{:?}", failures);
        assert_eq!(report.ticks, 50);
    }

    #[test]
    fn test_failed_assertion_is_reported() {
        let yaml = "steps:\n  - expect_zone: { id: nowhere }\n";
        let session = parse_session(yaml).unwrap();
        let mut e = engine();
        let report = run_session(&mut e, &session);
        assert!(!report.passed());
        assert_eq!(report.results[0].step, 0);
        assert!(report.results[0].error.as_ref().unwrap().contains("nowhere"));
    }

    #[test]
    fn test_resolve_building_prefers_session() {
        let session = parse_session("building: plan.json\n").unwrap();
        assert_eq!(
            resolve_building(&session, Path::new("/s/run.yaml"), Some(Path::new("/x.json"))),
            Some(PathBuf::from("/s/plan.json"))
        );
        let session = parse_session("steps: []\n").unwrap();
        assert_eq!(
            resolve_building(&session, Path::new("/s/run.yaml"), None),
            None
        );
    }
}
