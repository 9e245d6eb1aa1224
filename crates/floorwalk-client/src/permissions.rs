use std::collections::BTreeSet;
use std::sync::Arc;

/// Immutable set of door ids the active user may pass.
///
/// An empty list permits nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList(BTreeSet<String>);

impl AllowList {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(ids.into_iter().map(Into::into).collect())
    }

    pub fn permits(&self, door_id: &str) -> bool {
        self.0.contains(door_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Single writer of the allow-list.
///
/// Each update swaps in a new `Arc`; readers hold the snapshot they took at
/// the start of a tick, so a swap is never observed halfway through one.
pub struct PermissionGate {
    current: Arc<AllowList>,
    generation: u64,
}

impl PermissionGate {
    pub fn new() -> Self {
        Self {
            current: Arc::new(AllowList::default()),
            generation: 0,
        }
    }

    /// Replace the allow-list wholesale. Returns the new snapshot.
    pub fn set_allow_list<I, S>(&mut self, ids: I) -> Arc<AllowList>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.current = Arc::new(AllowList::new(ids));
        self.generation += 1;
        tracing::info!(
            "Allow-list replaced ({} door(s), generation {})",
            self.current.len(),
            self.generation
        );
        Arc::clone(&self.current)
    }

    pub fn snapshot(&self) -> Arc<AllowList> {
        Arc::clone(&self.current)
    }

    /// Number of replacements so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Default for PermissionGate {
    fn default() -> Self {
        Self::new()
    }
}
