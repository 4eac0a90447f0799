use parking_lot::Mutex;
use std::collections::HashSet;

/// Session-local set of match ids already surfaced to the user.
///
/// This is what makes the merge of the two subscription channels (and
/// the swipe path's own surfacing) commutative and idempotent: the
/// first writer for a match id wins, every later delivery is a no-op.
/// Cleared only by process restart.
#[derive(Debug, Default)]
pub struct ProcessedMatchRegistry {
    ids: Mutex<HashSet<String>>,
}

impl ProcessedMatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a match id. Returns `false` if it was already present,
    /// in which case the caller must not surface the match again.
    pub fn insert(&self, match_id: &str) -> bool {
        self.ids.lock().insert(match_id.to_string())
    }

    /// Forget a match id (unmatch path). Returns `false` if the id was
    /// never registered, which is not an error.
    pub fn remove(&self, match_id: &str) -> bool {
        self.ids.lock().remove(match_id)
    }

    pub fn contains(&self, match_id: &str) -> bool {
        self.ids.lock().contains(match_id)
    }

    pub fn len(&self) -> usize {
        self.ids.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.lock().is_empty()
    }
}
