/// Single-writer state holder with edge-triggered change detection.
///
/// `set` only reports a change (and bumps the version) when the new value
/// differs from the current one.
#[derive(Debug, Clone)]
pub struct Watch<T> {
    value: T,
    version: u64,
}

impl<T: PartialEq> Watch<T> {
    pub fn new(value: T) -> Self {
        Self { value, version: 0 }
    }

    /// Store `value`. Returns true if it differed from the previous value.
    pub fn set(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        self.version += 1;
        true
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Number of effective changes so far.
    pub fn version(&self) -> u64 {
        self.version
    }
}

impl<T: PartialEq + Default> Default for Watch<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_is_edge_triggered() {
        let mut zone: Watch<Option<String>> = Watch::default();
        assert!(zone.set(Some("a".into())));
        assert!(!zone.set(Some("a".into())));
        assert!(!zone.set(Some("a".into())));
        assert!(zone.set(Some("b".into())));
        assert!(zone.set(Some("a".into())));
        assert_eq!(zone.version(), 3);
        assert_eq!(zone.get().as_deref(), Some("a"));
    }
}
