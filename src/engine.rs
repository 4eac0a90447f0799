use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::core::{
    CandidateSelector, DiscoveryFilter, MatchReconciler, ProcessedMatchRegistry, ProfileStore,
    ReconcilerHandle, SwipeOutcome, SwipeProcessor, TransientSet,
};
use crate::models::{EngineEvent, Profile, SwipeDirection};
use crate::services::backend::{BackendError, MatchBackend};
use crate::services::conversations::ConversationBinder;
use crate::services::realtime::LiveSubscriptionClient;

/// Everything the engine needs wired together: store, selector,
/// transient swipe state, registry, swipe processor, and reconciler.
///
/// One instance per signed-in user session. `start` goes live on the
/// subscription channels; `shutdown` tears them down and prevents any
/// still-in-flight swipe from committing afterwards.
pub struct MatchEngine {
    user_id: String,
    store: Arc<ProfileStore>,
    selector: CandidateSelector,
    filter: DiscoveryFilter,
    transient: Arc<TransientSet>,
    registry: Arc<ProcessedMatchRegistry>,
    swipes: SwipeProcessor,
    reconciler: Arc<MatchReconciler>,
    backend: Arc<dyn MatchBackend>,
    binder: Arc<dyn ConversationBinder>,
    live: Arc<AtomicBool>,
    handle: parking_lot::Mutex<Option<ReconcilerHandle>>,
    events: parking_lot::Mutex<Option<mpsc::UnboundedReceiver<EngineEvent>>>,
}

impl MatchEngine {
    pub fn new(
        user_id: String,
        backend: Arc<dyn MatchBackend>,
        binder: Arc<dyn ConversationBinder>,
        filter: DiscoveryFilter,
    ) -> Self {
        let store = Arc::new(ProfileStore::new());
        let registry = Arc::new(ProcessedMatchRegistry::new());
        let transient = Arc::new(TransientSet::new());
        let live = Arc::new(AtomicBool::new(true));
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let swipes = SwipeProcessor::new(
            store.clone(),
            backend.clone(),
            registry.clone(),
            transient.clone(),
            events_tx.clone(),
            live.clone(),
        );

        let reconciler = Arc::new(MatchReconciler::new(
            user_id.clone(),
            store.clone(),
            backend.clone(),
            registry.clone(),
            binder.clone(),
            events_tx,
        ));

        Self {
            user_id,
            store,
            selector: CandidateSelector::new(),
            filter,
            transient,
            registry,
            swipes,
            reconciler,
            backend,
            binder,
            live,
            handle: parking_lot::Mutex::new(None),
            events: parking_lot::Mutex::new(Some(events_rx)),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn store(&self) -> &Arc<ProfileStore> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<ProcessedMatchRegistry> {
        &self.registry
    }

    /// Take the engine event receiver. Yields `None` on second call;
    /// there is exactly one consumer.
    pub fn take_events(&self) -> Option<mpsc::UnboundedReceiver<EngineEvent>> {
        self.events.lock().take()
    }

    /// Fetch the discover pool and start the reconciler's two
    /// subscription channels.
    pub async fn start(&self, client: &dyn LiveSubscriptionClient) -> Result<(), BackendError> {
        let pool = self.backend.fetch_discover_pool().await?;
        self.store.apply(|s| s.with_pool(pool));

        let handle = self.reconciler.run(client).await?;
        *self.handle.lock() = Some(handle);

        tracing::info!("Engine live for {}", self.user_id);
        Ok(())
    }

    /// Current browsing queue: filtered, de-duplicated, distance-sorted,
    /// with in-flight swipes hidden. Memoized until state or exclusions
    /// change.
    pub fn candidates(&self) -> Arc<[Profile]> {
        self.candidates_excluding(&HashSet::new())
    }

    /// Like [`candidates`](Self::candidates), additionally hiding
    /// `soft_exclude` — ids the user has an active missed-connection
    /// conversation with, supplied by the chat layer.
    pub fn candidates_excluding(&self, soft_exclude: &HashSet<String>) -> Arc<[Profile]> {
        let snapshot = self.store.snapshot();

        let mut exclusions: HashSet<String> = self.transient.snapshot();
        exclusions.extend(soft_exclude.iter().cloned());

        self.selector.select(snapshot, self.filter, &exclusions)
    }

    pub async fn swipe(&self, profile_id: &str, direction: SwipeDirection) -> SwipeOutcome {
        self.swipes.swipe(profile_id, direction).await
    }

    /// Request an unmatch. Local effects (cascade, registry removal)
    /// arrive through the caller's own `removed` subscription event,
    /// same as for the other participant.
    pub async fn unmatch(&self, match_id: &str) -> Result<(), BackendError> {
        self.backend.unmatch(match_id).await
    }

    /// Resolve the conversation for a matched user.
    pub async fn open_conversation(&self, other_user_id: &str) -> Result<String, BackendError> {
        self.binder.resolve_or_create(other_user_id).await
    }

    /// Tear the session down: unsubscribe both channels and block any
    /// in-flight swipe resolution from committing.
    pub fn shutdown(&self) {
        self.live.store(false, Ordering::SeqCst);
        if let Some(mut handle) = self.handle.lock().take() {
            handle.shutdown();
        }
        tracing::info!("Engine shut down for {}", self.user_id);
    }
}

impl Drop for MatchEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
