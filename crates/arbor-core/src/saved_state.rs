use indexmap::IndexMap;

/// Flat, ordered key/value state one controller saves for itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bundle {
    values: IndexMap<String, String>,
}

impl Bundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.shift_remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Saved state for a whole subtree: the node's own bundle plus one entry
/// per occupied slot, keyed by slot name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedState {
    bundle: Bundle,
    children: IndexMap<String, SavedState>,
}

impl SavedState {
    pub fn new(bundle: Bundle) -> Self {
        Self {
            bundle,
            children: IndexMap::new(),
        }
    }

    pub fn into_parts(self) -> (Bundle, IndexMap<String, SavedState>) {
        (self.bundle, self.children)
    }

    pub fn bundle(&self) -> &Bundle {
        &self.bundle
    }

    pub fn bundle_mut(&mut self) -> &mut Bundle {
        &mut self.bundle
    }

    pub fn child(&self, slot: &str) -> Option<&SavedState> {
        self.children.get(slot)
    }

    /// Follows a `/`-separated slot path.
    pub fn at(&self, path: &str) -> Option<&SavedState> {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |state, segment| state.child(segment))
    }

    pub fn insert_child(&mut self, slot: impl Into<String>, state: SavedState) {
        self.children.insert(slot.into(), state);
    }

    pub fn take_child(&mut self, slot: &str) -> Option<SavedState> {
        self.children.shift_remove(slot)
    }

    pub fn slots(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.bundle.is_empty() && self.children.values().all(SavedState::is_empty)
    }
}
