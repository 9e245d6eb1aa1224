use glam::Vec3;

use floorwalk_core::components::{EntityKind, Tag};

use crate::host::SceneHost;
use crate::permissions::AllowList;

/// An external request to focus an entity, e.g. from tree navigation.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionRequest {
    /// The entity payload itself, equivalent to a pick hit.
    Tagged(Tag),
    /// An id to resolve against the loaded building.
    ById { id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    Closed,
    Open(Tag),
}

/// Detail view state machine. While open, the camera look-at is pinned to
/// the selection instead of following the player.
pub struct SelectionDetailFlow {
    state: DetailState,
    pinned: Option<Vec3>,
    detail_zoom: f32,
}

impl SelectionDetailFlow {
    pub fn new(detail_zoom: f32) -> Self {
        Self {
            state: DetailState::Closed,
            pinned: None,
            detail_zoom,
        }
    }

    /// Enter (or switch) the open state. Returns the pan target if the
    /// entity has a center or boundary.
    pub fn open(&mut self, tag: Tag, host: &mut SceneHost) -> Option<Vec3> {
        let focus = tag.entity.focus_point().map(|p| p.to_world(0.0));
        match focus {
            Some(target) => self.pinned = Some(target),
            None => tracing::warn!(
                "{} '{}' has no center or boundary, camera stays put",
                tag.kind().as_str(),
                tag.id()
            ),
        }
        host.set_zoom(self.detail_zoom);
        tracing::info!("Detail opened: {} '{}'", tag.kind().as_str(), tag.id());
        self.state = DetailState::Open(tag);
        focus
    }

    /// Leave the open state, restoring neutral zoom. Returns false if it was
    /// already closed.
    pub fn close(&mut self, host: &mut SceneHost) -> bool {
        if !self.is_open() {
            return false;
        }
        self.state = DetailState::Closed;
        self.pinned = None;
        host.set_zoom(1.0);
        tracing::info!("Detail closed");
        true
    }

    /// If a door is open, its selection and current unlocked status.
    pub fn refresh_door(&self, allow: &AllowList) -> Option<(Tag, bool)> {
        match &self.state {
            DetailState::Open(tag) if tag.kind() == EntityKind::Door => {
                Some((tag.clone(), allow.permits(tag.id())))
            }
            _ => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, DetailState::Open(_))
    }

    pub fn selection(&self) -> Option<&Tag> {
        match &self.state {
            DetailState::Open(tag) => Some(tag),
            DetailState::Closed => None,
        }
    }

    /// Look-at target while open.
    pub fn pinned_target(&self) -> Option<Vec3> {
        self.pinned
    }

    pub fn state(&self) -> &DetailState {
        &self.state
    }
}
