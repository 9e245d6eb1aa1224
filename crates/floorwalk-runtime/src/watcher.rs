//! Building file watching for live reload.

use std::path::{Path, PathBuf};
use std::sync::mpsc;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    BuildingChanged(PathBuf),
    BuildingRemoved(PathBuf),
}

/// Watch the directory holding `building` and report changes to that file.
///
/// The parent directory is watched rather than the file itself so that
/// editors which save by rename still produce events.
pub fn start_watching(
    building: &Path,
) -> Result<(RecommendedWatcher, mpsc::Receiver<WatchEvent>), notify::Error> {
    let (tx, rx) = mpsc::channel();
    let target = building.to_path_buf();
    let dir = building
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            if let Some(change) = classify(&event, &target) {
                let _ = tx.send(change);
            }
        }
        Err(e) => tracing::warn!("File watcher error: {}", e),
    })?;
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    tracing::info!("Watching {:?}", building);
    Ok((watcher, rx))
}

/// Map a raw notify event onto the watched file, if it concerns it.
pub fn classify(event: &Event, target: &Path) -> Option<WatchEvent> {
    let name = target.file_name()?;
    let path = event
        .paths
        .iter()
        .find(|p| p.file_name() == Some(name))?
        .clone();
    match event.kind {
        EventKind::Create(_) | EventKind::Modify(_) => Some(WatchEvent::BuildingChanged(path)),
        EventKind::Remove(_) => Some(WatchEvent::BuildingRemoved(path)),
        _ => None,
    }
}

/// Drain pending events without blocking, collapsing bursts into the last
/// one.
pub fn poll_latest(rx: &mpsc::Receiver<WatchEvent>) -> Option<WatchEvent> {
    let mut latest = None;
    while let Ok(event) = rx.try_recv() {
        latest = Some(event);
    }
    latest
}
