use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::core::cascade::run_unmatch_cascade;
use crate::core::registry::ProcessedMatchRegistry;
use crate::core::store::ProfileStore;
use crate::models::{ChangeEvent, ChangeType, EngineEvent, MatchRecord, MatchRole, Profile};
use crate::services::backend::{BackendError, MatchBackend};
use crate::services::conversations::ConversationBinder;
use crate::services::realtime::{ChannelError, LiveSubscriptionClient};

/// Merges the two role-filtered match subscriptions into one consistent
/// local view.
///
/// The channels have no relative ordering guarantee between each other
/// or against an in-flight swipe's commit, and the transport may
/// redeliver; the [`ProcessedMatchRegistry`] is what turns that
/// unordered, duplicate-prone stream into an effectively-once
/// "match discovered" signal.
pub struct MatchReconciler {
    user_id: String,
    store: Arc<ProfileStore>,
    backend: Arc<dyn MatchBackend>,
    registry: Arc<ProcessedMatchRegistry>,
    binder: Arc<dyn ConversationBinder>,
    events: mpsc::UnboundedSender<EngineEvent>,
}

/// Owns the reconciler's running tasks; aborting them drops the
/// subscriptions, which unsubscribes.
#[derive(Debug)]
pub struct ReconcilerHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl ReconcilerHandle {
    pub fn shutdown(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for ReconcilerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl MatchReconciler {
    pub fn new(
        user_id: String,
        store: Arc<ProfileStore>,
        backend: Arc<dyn MatchBackend>,
        registry: Arc<ProcessedMatchRegistry>,
        binder: Arc<dyn ConversationBinder>,
        events: mpsc::UnboundedSender<EngineEvent>,
    ) -> Self {
        Self {
            user_id,
            store,
            backend,
            registry,
            binder,
            events,
        }
    }

    /// Subscribe once per role and start consuming the merged stream.
    ///
    /// Per-channel failure semantics: an `Unauthorized` error ends that
    /// channel silently and it is not retried; any other error is
    /// logged and the channel keeps running (the transport is assumed
    /// to auto-reconnect).
    pub async fn run(
        self: &Arc<Self>,
        client: &dyn LiveSubscriptionClient,
    ) -> Result<ReconcilerHandle, BackendError> {
        let (merged_tx, mut merged_rx) = mpsc::unbounded_channel::<(MatchRole, Vec<ChangeEvent>)>();
        let mut tasks = Vec::with_capacity(3);

        for role in MatchRole::BOTH {
            let mut subscription = client.subscribe(&self.user_id, role).await?;
            let merged_tx = merged_tx.clone();

            tasks.push(tokio::spawn(async move {
                while let Some(message) = subscription.recv().await {
                    match message {
                        Ok(batch) => {
                            if merged_tx.send((role, batch)).is_err() {
                                break;
                            }
                        }
                        Err(ChannelError::Unauthorized) => {
                            tracing::debug!("Channel {:?} unauthorized, stopping", role);
                            break;
                        }
                        Err(e) => {
                            tracing::warn!("Channel {:?} error, keeping channel: {}", role, e);
                        }
                    }
                }
            }));
        }
        drop(merged_tx);

        let reconciler = self.clone();
        tasks.push(tokio::spawn(async move {
            while let Some((role, batch)) = merged_rx.recv().await {
                reconciler.handle_batch(role, batch).await;
            }
        }));

        Ok(ReconcilerHandle { tasks })
    }

    /// Single reducer both channels feed. Which role delivered an event
    /// never changes how it is handled.
    pub async fn handle_batch(&self, role: MatchRole, batch: Vec<ChangeEvent>) {
        tracing::debug!("Processing {} event(s) from {:?}", batch.len(), role);
        for event in batch {
            self.handle_event(&event).await;
        }
    }

    async fn handle_event(&self, event: &ChangeEvent) {
        match event.change {
            ChangeType::Added => self.handle_added(&event.record).await,
            ChangeType::Modified => self.handle_modified(&event.record).await,
            ChangeType::Removed => self.handle_removed(&event.record).await,
        }
    }

    async fn handle_added(&self, record: &MatchRecord) {
        if self.registry.contains(&record.id) {
            // Already surfaced, either by the swipe path or by the other
            // channel's delivery of the same logical event.
            tracing::debug!("Match {} already processed, discarding", record.id);
            return;
        }

        let profile = self.hydrate_other_participant(record).await;
        self.store.apply(|s| s.with_matched(profile.clone()));

        if record.animation_played {
            // Seen elsewhere already (e.g. another device): commit
            // silently, no event.
            tracing::debug!("Match {} already animated upstream, committing silently", record.id);
            return;
        }

        if self.registry.insert(&record.id) {
            tracing::info!("Match {} discovered via subscription", record.id);
            let _ = self.events.send(EngineEvent::MatchDiscovered {
                match_id: record.id.clone(),
                other_profile: profile,
                conversation_id: record.conversation_id.clone(),
            });
        }
    }

    async fn handle_modified(&self, record: &MatchRecord) {
        if record.terminated {
            // The removal event is the authoritative unmatch signal; a
            // terminated flag arriving via modify is not acted on.
            tracing::debug!("Ignoring terminated flag via modify for {}", record.id);
            return;
        }

        if self.registry.contains(&record.id) {
            // Known match: refresh the fields that can change upstream.
            if record.is_missed_connection {
                let other = record.other_participant(&self.user_id).to_string();
                self.store.apply(|s| s.with_missed_connection_flag(&other));
            }
            return;
        }

        // A modify for a match this session never saw behaves like an
        // add; the transport collapses add+modify on reconnect.
        self.handle_added(record).await;
    }

    async fn handle_removed(&self, record: &MatchRecord) {
        // No-op if the id was never registered; the cascade still runs
        // because the other participant is always on the record itself.
        let was_known = self.registry.remove(&record.id);
        if !was_known {
            tracing::debug!("Removal for unseen match {}, cascading defensively", record.id);
        }

        let other = record.other_participant(&self.user_id).to_string();
        run_unmatch_cascade(&self.store, &self.binder, &self.events, &other).await;
    }

    /// Hydrated profile for the match's other participant: discover
    /// pool or matched details if already local, otherwise fetched, and
    /// a bare stub as the last resort so a hydration failure never
    /// drops a match.
    async fn hydrate_other_participant(&self, record: &MatchRecord) -> Profile {
        let other_id = record.other_participant(&self.user_id).to_string();
        let snapshot = self.store.snapshot();

        let mut profile = if let Some(known) = snapshot
            .matched_profiles
            .get(&other_id)
            .or_else(|| snapshot.discover_pool.iter().find(|p| p.id == other_id))
        {
            known.clone()
        } else {
            match self.backend.fetch_profile(&other_id).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    tracing::warn!("Failed to hydrate profile {}: {}", other_id, e);
                    Profile {
                        id: other_id.clone(),
                        name: String::new(),
                        age: 0,
                        image_file_ids: vec![],
                        distance: None,
                        is_missed_connection: false,
                    }
                }
            }
        };

        if record.is_missed_connection {
            profile.is_missed_connection = true;
        }
        profile
    }
}
