use floorwalk_core::components::{GeometryHandle, Shape};

/// Per-primitive geometry storage with allocation accounting.
///
/// Geometry is never shared between primitives, so each build allocates one
/// slot per primitive and `clear` must dispose every one of them.
pub struct GeometryCache {
    slots: Vec<Option<Shape>>,
    allocated: usize,
    disposed: usize,
}

impl GeometryCache {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            allocated: 0,
            disposed: 0,
        }
    }

    pub fn allocate(&mut self, shape: Shape) -> GeometryHandle {
        let handle = GeometryHandle(self.slots.len());
        self.slots.push(Some(shape));
        self.allocated += 1;
        handle
    }

    /// Release one geometry. Disposing twice is a no-op.
    pub fn dispose(&mut self, handle: GeometryHandle) {
        if let Some(slot) = self.slots.get_mut(handle.0) {
            if slot.take().is_some() {
                self.disposed += 1;
            }
        }
    }

    pub fn get(&self, handle: GeometryHandle) -> Option<&Shape> {
        self.slots.get(handle.0).and_then(|s| s.as_ref())
    }

    /// Total allocations since creation.
    pub fn allocated(&self) -> usize {
        self.allocated
    }

    pub fn disposed(&self) -> usize {
        self.disposed
    }

    pub fn live(&self) -> usize {
        self.allocated - self.disposed
    }

    /// Forget the disposed slots once nothing is live.
    pub fn compact(&mut self) {
        if self.live() == 0 {
            self.slots.clear();
        }
    }
}

impl Default for GeometryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_allocate_and_dispose_accounting() {
        let mut cache = GeometryCache::new();
        let a = cache.allocate(Shape::Box { size: Vec3::ONE });
        let b = cache.allocate(Shape::Quad { width: 2.0, depth: 3.0 });
        assert_eq!(cache.live(), 2);

        cache.dispose(a);
        cache.dispose(a);
        assert_eq!(cache.disposed(), 1);
        assert!(cache.get(a).is_none());
        assert_eq!(cache.get(b), Some(&Shape::Quad { width: 2.0, depth: 3.0 }));

        cache.dispose(b);
        cache.compact();
        assert_eq!(cache.live(), 0);
        assert_eq!(cache.allocated(), 2);
    }
}
