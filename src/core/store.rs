use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{ClassificationSets, Profile};

/// Immutable snapshot of everything the engine knows locally.
///
/// Mutations are pure functions returning a new state; `ProfileStore`
/// applies each one as a single whole-state replacement, so no partial
/// update is ever observable.
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    /// Raw candidate pool as fetched, duplicates and all. Filtering is
    /// the selector's job.
    pub discover_pool: Vec<Profile>,
    pub classifications: ClassificationSets,
    /// Hydrated profiles for matched ids.
    pub matched_profiles: HashMap<String, Profile>,
}

impl StoreState {
    pub fn with_pool(&self, pool: Vec<Profile>) -> StoreState {
        let mut next = self.clone();
        next.discover_pool = pool;
        next
    }

    pub fn with_liked(&self, id: &str) -> StoreState {
        let mut next = self.clone();
        next.classifications.liked.insert(id.to_string());
        next
    }

    pub fn with_disliked(&self, id: &str) -> StoreState {
        let mut next = self.clone();
        next.classifications.disliked.insert(id.to_string());
        next
    }

    /// Classify `profile` as matched and hydrate its details.
    ///
    /// Does not remove the id from `liked`: the overlap is the expected
    /// transitional state when a like resolves into a match.
    pub fn with_matched(&self, profile: Profile) -> StoreState {
        let mut next = self.clone();
        next.classifications.matched.insert(profile.id.clone());
        next.matched_profiles.insert(profile.id.clone(), profile);
        next
    }

    /// Remove `id` from the pool, all three classification sets, and
    /// the hydrated map in one step. Idempotent.
    pub fn without_everywhere(&self, id: &str) -> StoreState {
        let mut next = self.clone();
        next.discover_pool.retain(|p| p.id != id);
        next.classifications.liked.remove(id);
        next.classifications.disliked.remove(id);
        next.classifications.matched.remove(id);
        next.matched_profiles.remove(id);
        next
    }

    /// Flag a matched profile as a missed connection. The only field
    /// mutable after fetch.
    pub fn with_missed_connection_flag(&self, id: &str) -> StoreState {
        let mut next = self.clone();
        if let Some(profile) = next.matched_profiles.get_mut(id) {
            profile.is_missed_connection = true;
        }
        next
    }
}

/// Shared handle over the engine's local state.
///
/// The snapshot `Arc` doubles as the memoization token for the
/// candidate selector: two reads return pointer-identical snapshots
/// until something commits.
#[derive(Debug, Default)]
pub struct ProfileStore {
    state: RwLock<Arc<StoreState>>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial(state: StoreState) -> Self {
        Self {
            state: RwLock::new(Arc::new(state)),
        }
    }

    /// Current snapshot. Cheap; clones an `Arc`.
    pub fn snapshot(&self) -> Arc<StoreState> {
        self.state.read().clone()
    }

    /// Apply a pure state transition as one atomic replacement.
    pub fn apply<F>(&self, mutate: F) -> Arc<StoreState>
    where
        F: FnOnce(&StoreState) -> StoreState,
    {
        let mut guard = self.state.write();
        let next = Arc::new(mutate(guard.as_ref()));
        *guard = next.clone();
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: &str) -> Profile {
        Profile {
            id: id.to_string(),
            name: format!("User {}", id),
            age: 27,
            image_file_ids: vec![],
            distance: Some(5.0),
            is_missed_connection: false,
        }
    }

    #[test]
    fn test_without_everywhere_is_total() {
        let mut state = StoreState::default();
        state.discover_pool.push(profile("x"));
        state.classifications.liked.insert("x".to_string());
        state.classifications.disliked.insert("x".to_string());
        state.classifications.matched.insert("x".to_string());
        state.matched_profiles.insert("x".to_string(), profile("x"));

        let next = state.without_everywhere("x");

        assert!(next.discover_pool.is_empty());
        assert!(!next.classifications.contains("x"));
        assert!(!next.matched_profiles.contains_key("x"));
    }

    #[test]
    fn test_without_everywhere_idempotent() {
        let state = StoreState::default().with_liked("x");
        let once = state.without_everywhere("x");
        let twice = once.without_everywhere("x");
        assert_eq!(once.classifications, twice.classifications);
    }

    #[test]
    fn test_matched_keeps_liked_overlap() {
        let state = StoreState::default().with_liked("y").with_matched(profile("y"));
        assert!(state.classifications.liked.contains("y"));
        assert!(state.classifications.matched.contains("y"));
    }

    #[test]
    fn test_snapshot_pointer_identity() {
        let store = ProfileStore::new();
        let a = store.snapshot();
        let b = store.snapshot();
        assert!(Arc::ptr_eq(&a, &b));

        store.apply(|s| s.with_liked("z"));
        let c = store.snapshot();
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn test_apply_is_whole_state_replacement() {
        let store = ProfileStore::with_initial(StoreState {
            discover_pool: vec![profile("a"), profile("b")],
            ..StoreState::default()
        });

        store.apply(|s| s.without_everywhere("a"));
        let snap = store.snapshot();
        assert_eq!(snap.discover_pool.len(), 1);
        assert_eq!(snap.discover_pool[0].id, "b");
    }

    #[test]
    fn test_missed_connection_flag() {
        let store = ProfileStore::new();
        store.apply(|s| s.with_matched(profile("m")));
        store.apply(|s| s.with_missed_connection_flag("m"));
        assert!(store.snapshot().matched_profiles["m"].is_missed_connection);
    }
}
