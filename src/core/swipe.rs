use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::core::registry::ProcessedMatchRegistry;
use crate::core::store::ProfileStore;
use crate::models::{EngineEvent, Profile, SwipeDirection};
use crate::services::backend::MatchBackend;

/// Profiles currently "transitioning out": swiped, awaiting the remote
/// round-trip. A UI-facing transient state, not a classification — the
/// selector excludes these so the card disappears before the network
/// call resolves.
#[derive(Debug, Default)]
pub struct TransientSet {
    ids: Mutex<HashSet<String>>,
}

impl TransientSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an id as in flight. Returns `false` if it already is, which
    /// makes a double-tap on the same card a no-op.
    fn mark(&self, id: &str) -> bool {
        self.ids.lock().insert(id.to_string())
    }

    fn clear(&self, id: &str) {
        self.ids.lock().remove(id);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.lock().contains(id)
    }

    /// Snapshot for the selector's exclusion set.
    pub fn snapshot(&self) -> HashSet<String> {
        self.ids.lock().clone()
    }
}

/// Clears the transient mark exactly once, on every exit path.
///
/// Success, failure, and post-teardown abort all converge here, so a
/// profile can never be left permanently unswipeable.
struct TransientGuard<'a> {
    set: &'a TransientSet,
    id: String,
}

impl Drop for TransientGuard<'_> {
    fn drop(&mut self) {
        self.set.clear(&self.id);
    }
}

/// How a swipe settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwipeOutcome {
    /// Precondition failed (not in pool, already classified, or already
    /// in flight); nothing happened.
    Ignored,
    Disliked,
    /// Liked; `matched` carries the match id when the like was mutual.
    Liked { matched: Option<String> },
    /// Remote call failed; transient state reverted, classification
    /// sets untouched. The card reappears on the next derivation.
    Reverted,
    /// Resolution arrived after teardown; nothing was committed.
    Aborted,
}

/// Executes like/dislike actions: optimistic transient mark, remote
/// mutation, commit-or-revert, mutual-match surfacing.
pub struct SwipeProcessor {
    store: Arc<ProfileStore>,
    backend: Arc<dyn MatchBackend>,
    registry: Arc<ProcessedMatchRegistry>,
    transient: Arc<TransientSet>,
    events: mpsc::UnboundedSender<EngineEvent>,
    live: Arc<AtomicBool>,
}

impl SwipeProcessor {
    pub fn new(
        store: Arc<ProfileStore>,
        backend: Arc<dyn MatchBackend>,
        registry: Arc<ProcessedMatchRegistry>,
        transient: Arc<TransientSet>,
        events: mpsc::UnboundedSender<EngineEvent>,
        live: Arc<AtomicBool>,
    ) -> Self {
        Self {
            store,
            backend,
            registry,
            transient,
            events,
            live,
        }
    }

    pub async fn swipe(&self, profile_id: &str, direction: SwipeDirection) -> SwipeOutcome {
        let snapshot = self.store.snapshot();
        let in_pool = snapshot.discover_pool.iter().any(|p| p.id == profile_id);
        if !in_pool || snapshot.classifications.contains(profile_id) {
            tracing::debug!("Ignoring swipe on unswipeable profile {}", profile_id);
            return SwipeOutcome::Ignored;
        }

        if !self.transient.mark(profile_id) {
            tracing::debug!("Swipe already in flight for {}", profile_id);
            return SwipeOutcome::Ignored;
        }
        let _guard = TransientGuard {
            set: &self.transient,
            id: profile_id.to_string(),
        };

        match direction {
            SwipeDirection::Like => self.resolve_like(profile_id).await,
            SwipeDirection::Dislike => self.resolve_dislike(profile_id).await,
        }
    }

    async fn resolve_like(&self, profile_id: &str) -> SwipeOutcome {
        let outcome = match self.backend.like(profile_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("Like for {} failed, reverting: {}", profile_id, e);
                return SwipeOutcome::Reverted;
            }
        };

        if !self.live.load(Ordering::SeqCst) {
            tracing::debug!("Like for {} resolved after teardown, dropping", profile_id);
            return SwipeOutcome::Aborted;
        }

        self.store.apply(|s| s.with_liked(profile_id));

        if !outcome.is_match {
            return SwipeOutcome::Liked { matched: None };
        }

        let Some(match_id) = outcome.match_id else {
            tracing::warn!("Mutual like for {} missing match id, treating as plain like", profile_id);
            return SwipeOutcome::Liked { matched: None };
        };

        let other_profile = outcome
            .matched_profile
            .or_else(|| self.pool_profile(profile_id))
            .unwrap_or_else(|| Profile {
                id: profile_id.to_string(),
                name: String::new(),
                age: 0,
                image_file_ids: vec![],
                distance: None,
                is_missed_connection: false,
            });

        self.store.apply(|s| s.with_matched(other_profile.clone()));

        // Registering here preempts a duplicate surfacing when the same
        // match arrives on the reconciler channels. If the reconciler
        // got there first, the match is already on screen: commit only.
        if self.registry.insert(&match_id) {
            tracing::info!("Match {} discovered via swipe on {}", match_id, profile_id);
            let _ = self.events.send(EngineEvent::MatchDiscovered {
                match_id: match_id.clone(),
                other_profile,
                conversation_id: outcome.conversation_id,
            });
        }

        SwipeOutcome::Liked {
            matched: Some(match_id),
        }
    }

    async fn resolve_dislike(&self, profile_id: &str) -> SwipeOutcome {
        if let Err(e) = self.backend.dislike(profile_id).await {
            tracing::warn!("Dislike for {} failed, reverting: {}", profile_id, e);
            return SwipeOutcome::Reverted;
        }

        if !self.live.load(Ordering::SeqCst) {
            tracing::debug!("Dislike for {} resolved after teardown, dropping", profile_id);
            return SwipeOutcome::Aborted;
        }

        self.store.apply(|s| s.with_disliked(profile_id));
        SwipeOutcome::Disliked
    }

    fn pool_profile(&self, profile_id: &str) -> Option<Profile> {
        self.store
            .snapshot()
            .discover_pool
            .iter()
            .find(|p| p.id == profile_id)
            .cloned()
    }
}
