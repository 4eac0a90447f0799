use std::sync::Arc;
use tokio::sync::mpsc;

use crate::core::store::ProfileStore;
use crate::models::EngineEvent;
use crate::services::conversations::ConversationBinder;

/// Remove an un-matched user from every local list that could reference
/// them, drop their conversations, and signal any open detail view to
/// close.
///
/// Idempotent: running twice for the same id is harmless. A binder
/// failure is logged and does not undo the local removal — the local
/// lists are the authority for what the user can see.
pub async fn run_unmatch_cascade(
    store: &Arc<ProfileStore>,
    binder: &Arc<dyn ConversationBinder>,
    events: &mpsc::UnboundedSender<EngineEvent>,
    profile_id: &str,
) {
    store.apply(|s| s.without_everywhere(profile_id));

    if let Err(e) = binder.drop_by_participant(profile_id).await {
        tracing::warn!("Failed to drop conversations for {}: {}", profile_id, e);
    }

    let _ = events.send(EngineEvent::ProfileRemoved {
        profile_id: profile_id.to_string(),
    });

    tracing::info!("Unmatch cascade completed for {}", profile_id);
}
