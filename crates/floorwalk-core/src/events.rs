use std::collections::VecDeque;
use std::path::PathBuf;

use serde::Serialize;

use crate::components::Tag;

/// Per-type primitive counts reported after a floor build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PrimitiveCounts {
    pub walls: usize,
    pub floors: usize,
    pub doors: usize,
    pub objects: usize,
}

impl PrimitiveCounts {
    pub fn total(&self) -> usize {
        self.walls + self.floors + self.doors + self.objects
    }
}

/// Notifications produced by the engine for outside collaborators.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    ZoneChanged { zone_id: Option<String> },
    DetailOpened { selection: Tag },
    /// The open selection was re-issued, e.g. a door after a permission swap.
    DetailRefreshed { selection: Tag, unlocked: bool },
    DetailClosed,
    PermissionsChanged { allowed: usize },
    FloorLoaded { floor: i32, counts: PrimitiveCounts },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ZoneChanged,
    DetailOpened,
    DetailRefreshed,
    DetailClosed,
    PermissionsChanged,
    FloorLoaded,
}

impl EngineEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            EngineEvent::ZoneChanged { .. } => EventKind::ZoneChanged,
            EngineEvent::DetailOpened { .. } => EventKind::DetailOpened,
            EngineEvent::DetailRefreshed { .. } => EventKind::DetailRefreshed,
            EngineEvent::DetailClosed => EventKind::DetailClosed,
            EngineEvent::PermissionsChanged { .. } => EventKind::PermissionsChanged,
            EngineEvent::FloorLoaded { .. } => EventKind::FloorLoaded,
        }
    }
}

/// An event stamped with the tick it was emitted on.
#[derive(Debug, Clone, Serialize)]
pub struct EventRecord {
    pub tick: u64,
    #[serde(flatten)]
    pub event: EngineEvent,
}

type Listener = Box<dyn Fn(&EngineEvent) + Send + Sync>;

/// Central event bus with ring buffer logging.
pub struct EventBus {
    /// Listeners with their ids; `None` kind listens to everything.
    listeners: Vec<(u64, Option<EventKind>, Listener)>,
    next_listener_id: u64,
    /// Ring buffer log of recent events.
    log: VecDeque<EventRecord>,
    log_capacity: usize,
    /// File logger path (if enabled).
    log_file: Option<PathBuf>,
    tick: u64,
    /// Pending events to be flushed.
    pending: Vec<EventRecord>,
}

impl EventBus {
    pub fn new(log_capacity: usize) -> Self {
        Self {
            listeners: Vec::new(),
            next_listener_id: 0,
            log: VecDeque::with_capacity(log_capacity),
            log_capacity,
            log_file: None,
            tick: 0,
            pending: Vec::new(),
        }
    }

    /// Enable JSON-lines file logging.
    pub fn enable_file_logging(&mut self, path: PathBuf) {
        self.log_file = Some(path);
    }

    /// Queue an event for the next flush.
    pub fn emit(&mut self, event: EngineEvent) {
        tracing::debug!("event: {:?}", event.kind());
        self.pending.push(EventRecord {
            tick: self.tick,
            event,
        });
    }

    /// Register a listener for one event kind. Returns a listener ID for removal.
    pub fn listen<F>(&mut self, kind: EventKind, callback: F) -> u64
    where
        F: Fn(&EngineEvent) + Send + Sync + 'static,
    {
        self.add_listener(Some(kind), Box::new(callback))
    }

    /// Register a listener for every event.
    pub fn listen_all<F>(&mut self, callback: F) -> u64
    where
        F: Fn(&EngineEvent) + Send + Sync + 'static,
    {
        self.add_listener(None, Box::new(callback))
    }

    fn add_listener(&mut self, kind: Option<EventKind>, callback: Listener) -> u64 {
        let id = self.next_listener_id;
        self.next_listener_id += 1;
        self.listeners.push((id, kind, callback));
        id
    }

    /// Remove a listener by ID.
    pub fn remove_listener(&mut self, listener_id: u64) {
        self.listeners.retain(|(id, _, _)| *id != listener_id);
    }

    /// Flush pending events: notify listeners, log to ring buffer and file.
    pub fn flush(&mut self) -> Vec<EventRecord> {
        let records: Vec<EventRecord> = self.pending.drain(..).collect();

        for record in &records {
            let kind = record.event.kind();
            for (_id, filter, callback) in &self.listeners {
                if filter.map_or(true, |k| k == kind) {
                    callback(&record.event);
                }
            }

            if self.log.len() >= self.log_capacity {
                self.log.pop_front();
            }
            self.log.push_back(record.clone());

            if let Some(log_path) = &self.log_file {
                if let Ok(json) = serde_json::to_string(record) {
                    let _ = std::fs::OpenOptions::new()
                        .create(true)
                        .append(true)
                        .open(log_path)
                        .and_then(|mut f| {
                            use std::io::Write;
                            writeln!(f, "{}", json)
                        });
                }
            }
        }

        records
    }

    /// Advance the tick counter used to stamp events.
    pub fn advance_tick(&mut self) {
        self.tick += 1;
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Get the event log (ring buffer).
    pub fn get_log(&self) -> &VecDeque<EventRecord> {
        &self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_event_bus_emit_and_flush() {
        let mut bus = EventBus::new(100);
        let received = Arc::new(Mutex::new(Vec::new()));

        let recv_clone = received.clone();
        bus.listen(EventKind::ZoneChanged, move |event| {
            recv_clone.lock().unwrap().push(event.clone());
        });

        bus.emit(EngineEvent::ZoneChanged {
            zone_id: Some("r1".into()),
        });
        bus.emit(EngineEvent::DetailClosed);
        bus.flush();

        let events = received.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0],
            EngineEvent::ZoneChanged {
                zone_id: Some("r1".into())
            }
        );
    }

    #[test]
    fn test_ring_buffer_capacity() {
        let mut bus = EventBus::new(3);
        for i in 0..5 {
            bus.emit(EngineEvent::PermissionsChanged { allowed: i });
        }
        bus.flush();

        assert_eq!(bus.get_log().len(), 3);
        // Oldest two dropped
        assert_eq!(
            bus.get_log()[0].event,
            EngineEvent::PermissionsChanged { allowed: 2 }
        );
    }

    #[test]
    fn test_remove_listener() {
        let mut bus = EventBus::new(100);
        let received = Arc::new(Mutex::new(0));

        let recv_clone = received.clone();
        let id = bus.listen_all(move |_| {
            *recv_clone.lock().unwrap() += 1;
        });

        bus.emit(EngineEvent::DetailClosed);
        bus.flush();
        assert_eq!(*received.lock().unwrap(), 1);

        bus.remove_listener(id);
        bus.emit(EngineEvent::DetailClosed);
        bus.flush();
        assert_eq!(*received.lock().unwrap(), 1);
    }

    #[test]
    fn test_records_are_stamped_with_tick() {
        let mut bus = EventBus::new(10);
        bus.advance_tick();
        bus.advance_tick();
        bus.emit(EngineEvent::DetailClosed);
        let flushed = bus.flush();
        assert_eq!(flushed[0].tick, 2);
        let json = serde_json::to_value(&flushed[0]).unwrap();
        assert_eq!(json["event"], "detail_closed");
    }
}
