use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use crate::core::store::StoreState;
use crate::models::Profile;

/// Hard age-range filter applied to the candidate pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryFilter {
    pub min_age: u8,
    pub max_age: u8,
}

impl Default for DiscoveryFilter {
    fn default() -> Self {
        Self {
            min_age: 18,
            max_age: 100,
        }
    }
}

impl DiscoveryFilter {
    fn accepts(&self, profile: &Profile) -> bool {
        profile.age >= self.min_age && profile.age <= self.max_age
    }
}

/// Derive the browsable candidate queue from a state snapshot.
///
/// Single pass over the raw pool:
/// - duplicate ids keep the first occurrence only (defensive policy for
///   upstream duplication, not an error),
/// - anything already classified or in `extra_exclusions` (soft
///   excludes, in-flight swipes) is dropped,
/// - anything outside the age range is dropped,
///
/// followed by a stable ascending sort on `distance` where a missing
/// distance sorts after every known one and ties keep input order.
pub fn select_candidates(
    state: &StoreState,
    filter: &DiscoveryFilter,
    extra_exclusions: &HashSet<String>,
) -> Vec<Profile> {
    let sets = &state.classifications;
    let mut emitted: HashSet<&str> = HashSet::with_capacity(state.discover_pool.len());

    let mut candidates: Vec<Profile> = state
        .discover_pool
        .iter()
        .filter(|p| emitted.insert(p.id.as_str()))
        .filter(|p| !sets.contains(&p.id) && !extra_exclusions.contains(&p.id))
        .filter(|p| filter.accepts(p))
        .cloned()
        .collect();

    candidates.sort_by(|a, b| compare_distance(a.distance, b.distance));
    candidates
}

/// Ascending by distance, `None` last. Equal for two `None`s so the
/// stable sort keeps their input order.
fn compare_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Memoizing wrapper around [`select_candidates`].
///
/// Keyed on pointer identity of the snapshot plus equality of filter
/// and exclusions; correctness never depends on the cache, it only
/// skips re-deriving on unchanged inputs across renders.
#[derive(Debug, Default)]
pub struct CandidateSelector {
    cached: Mutex<Option<CacheSlot>>,
}

#[derive(Debug)]
struct CacheSlot {
    state: Arc<StoreState>,
    filter: DiscoveryFilter,
    exclusions: HashSet<String>,
    output: Arc<[Profile]>,
}

impl CandidateSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(
        &self,
        state: Arc<StoreState>,
        filter: DiscoveryFilter,
        exclusions: &HashSet<String>,
    ) -> Arc<[Profile]> {
        let mut slot = self.cached.lock();
        if let Some(cache) = slot.as_ref() {
            if Arc::ptr_eq(&cache.state, &state)
                && cache.filter == filter
                && cache.exclusions == *exclusions
            {
                return cache.output.clone();
            }
        }

        let output: Arc<[Profile]> = select_candidates(&state, &filter, exclusions).into();
        *slot = Some(CacheSlot {
            state,
            filter,
            exclusions: exclusions.clone(),
            output: output.clone(),
        });
        output
    }
}
