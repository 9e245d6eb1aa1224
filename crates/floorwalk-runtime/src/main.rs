mod cli;
mod watcher;

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;

use cli::{CliArgs, Command};
use floorwalk_client::config::{self, EngineConfig};
use floorwalk_client::session;
use floorwalk_client::FloorplanEngine;
use floorwalk_core::floor::Building;
use floorwalk_core::schema;
use watcher::WatchEvent;

const WATCH_TICK: Duration = Duration::from_millis(50);

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();
    tracing::info!("floorwalk v{}", env!("CARGO_PKG_VERSION"));

    let (config, config_path) = resolve_config(args.config.as_deref());
    let building = args
        .building
        .as_ref()
        .map(PathBuf::from)
        .or_else(|| {
            config_path
                .as_deref()
                .and_then(|p| config::building_path(&config, p))
        });

    match args.command {
        // floorwalk run <session>...
        Command::Run {
            sessions,
            event_log,
        } => {
            let event_log = event_log.map(PathBuf::from);
            let mut total_passed = 0;
            let mut total_failed = 0;
            for file in &sessions {
                println!("--- {} ---", file);
                match session::run_session_file(
                    &config,
                    Path::new(file),
                    building.as_deref(),
                    event_log.as_deref(),
                ) {
                    Ok(report) => {
                        for result in &report.results {
                            let status = if result.passed { "OK" } else { "FAIL" };
                            println!("  {} #{} {}", status, result.step, result.name);
                            if let Some(ref err) = result.error {
                                println!("    Error: {}", err);
                            }
                        }
                        let passed = report.results.iter().filter(|r| r.passed).count();
                        total_passed += passed;
                        total_failed += report.results.len() - passed;
                        println!("  ({} ticks, {} events)", report.ticks, report.events);
                    }
                    Err(e) => {
                        println!("  FAIL {}", file);
                        println!("    Error: {}", e);
                        total_failed += 1;
                    }
                }
                println!();
            }
            println!(
                "{} passed, {} failed across {} session(s).",
                total_passed,
                total_failed,
                sessions.len()
            );
            if total_failed > 0 {
                std::process::exit(1);
            }
        }

        // floorwalk inspect [--floor N] [--search TERM]
        Command::Inspect { floor, search } => {
            let building = load_or_exit(building.as_deref());
            match search {
                Some(term) => print_search(&config, building, &term),
                None => print_floors(&config, building, floor),
            }
        }

        // floorwalk watch [--floor N]
        Command::Watch { floor } => {
            let Some(path) = building else {
                exit_no_building();
            };
            let mut config = config;
            if floor.is_some() {
                config.default_floor = floor;
            }
            watch(config, &path);
        }
    }
}

/// Explicit path, else `floorwalk.yaml` found upward from the working
/// directory, else built-in defaults.
fn resolve_config(explicit: Option<&str>) -> (EngineConfig, Option<PathBuf>) {
    let path = match explicit {
        Some(p) => Some(PathBuf::from(p)),
        None => std::env::current_dir()
            .ok()
            .and_then(|cwd| config::find_config(&cwd)),
    };
    let Some(path) = path else {
        tracing::info!("No {} found, using defaults", config::CONFIG_FILE);
        return (EngineConfig::default(), None);
    };
    match config::load_config(&path) {
        Ok(c) => {
            tracing::info!("Loaded project: {}", c.name);
            (c, Some(path))
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn exit_no_building() -> ! {
    eprintln!("Error: No building file. Pass --building or set `building` in floorwalk.yaml.");
    std::process::exit(1);
}

fn load_or_exit(path: Option<&Path>) -> Building {
    let Some(path) = path else {
        exit_no_building();
    };
    match schema::load_building(path) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_floors(config: &EngineConfig, building: Building, only: Option<i32>) {
    let numbers: Vec<i32> = building
        .floors
        .iter()
        .map(|f| f.floor)
        .filter(|n| only.map_or(true, |o| o == *n))
        .collect();
    if numbers.is_empty() {
        println!("No matching floors.");
        return;
    }
    println!(
        "{} ({} floor(s))",
        building
            .building_name
            .clone()
            .unwrap_or_else(|| building.building_id.clone()),
        building.floors.len()
    );

    let mut engine = FloorplanEngine::new(config.clone(), building);
    for n in numbers {
        engine.select_floor(n);
        let Some(floor) = engine.current_floor() else {
            continue;
        };
        let counts = engine.counts();
        println!(
            "  {}: {} zone(s), {} door(s); walls {}, floors {}, doors {}, objects {}",
            floor.display_name(),
            floor.zones.len(),
            floor.door_count(),
            counts.walls,
            counts.floors,
            counts.doors,
            counts.objects
        );
    }
}

fn print_search(config: &EngineConfig, building: Building, term: &str) {
    let engine = FloorplanEngine::new(config.clone(), building);
    let hits = engine.directory().search(term);
    if hits.is_empty() {
        println!("No matches for '{}'.", term);
        return;
    }
    for entry in hits {
        println!(
            "  {} [{}] {}",
            entry.label,
            entry.kind.as_str(),
            entry.breadcrumb
        );
    }
}

/// Keep the engine ticking and rebuild whenever the building file changes.
/// A file that fails to parse leaves the previous building in place.
fn watch(config: EngineConfig, path: &Path) {
    let building = load_or_exit(Some(path));
    let mut engine = FloorplanEngine::new(config, building);
    let (_watcher, rx) = match watcher::start_watching(path) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("Error: Failed to start file watcher: {}", e);
            std::process::exit(1);
        }
    };

    loop {
        engine.tick();
        match watcher::poll_latest(&rx) {
            Some(WatchEvent::BuildingChanged(changed)) => {
                let started = instant::Instant::now();
                match schema::load_building(&changed) {
                    Ok(building) => {
                        engine.reload_building(building);
                        let counts = engine.counts();
                        tracing::info!(
                            "Reloaded {:?} in {:.1}ms: {} primitives",
                            changed,
                            started.elapsed().as_secs_f64() * 1000.0,
                            counts.total()
                        );
                    }
                    Err(e) => tracing::warn!("Keeping previous building: {}", e),
                }
            }
            Some(WatchEvent::BuildingRemoved(removed)) => {
                tracing::warn!("Building file {:?} removed, keeping last load", removed);
            }
            None => {}
        }
        std::thread::sleep(WATCH_TICK);
    }
}
