use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::models::{ChangeEvent, MatchRole};
use crate::services::backend::BackendError;

/// Errors a live channel can deliver in-band.
#[derive(Debug, Clone, Error)]
pub enum ChannelError {
    /// Session ended; the channel stops producing and is not retried.
    #[error("subscription unauthorized: session ended")]
    Unauthorized,

    /// Anything else. The transport auto-reconnects, so the channel is
    /// left running.
    #[error("subscription transport error: {0}")]
    Transport(String),
}

/// One delivery on a live channel: a batch of change events or an
/// in-band error.
pub type ChannelMessage = Result<Vec<ChangeEvent>, ChannelError>;

/// A live subscription to the match collection filtered to one role.
///
/// Dropping the subscription unsubscribes: the producer side observes
/// the closed channel and tears the remote listener down.
#[derive(Debug)]
pub struct Subscription {
    role: MatchRole,
    receiver: mpsc::UnboundedReceiver<ChannelMessage>,
}

impl Subscription {
    pub fn new(role: MatchRole, receiver: mpsc::UnboundedReceiver<ChannelMessage>) -> Self {
        Self { role, receiver }
    }

    pub fn role(&self) -> MatchRole {
        self.role
    }

    /// Next delivery, or `None` once the channel is closed.
    pub async fn recv(&mut self) -> Option<ChannelMessage> {
        self.receiver.recv().await
    }
}

/// Factory for role-parameterized live subscriptions.
///
/// One implementation serves both roles; the reconciler calls it once
/// per [`MatchRole`] and merges the resulting channels. Injected at
/// construction time so the reconciler can be driven by a fake in
/// tests.
#[async_trait]
pub trait LiveSubscriptionClient: Send + Sync {
    /// Subscribe to non-terminated match records where `user_id` fills
    /// the given participant role.
    async fn subscribe(
        &self,
        user_id: &str,
        role: MatchRole,
    ) -> Result<Subscription, BackendError>;
}

/// Producer handle for pushing deliveries into a [`Subscription`].
///
/// Transport implementations hold one of these per channel; tests use
/// it to script arbitrary interleavings.
#[derive(Debug, Clone)]
pub struct SubscriptionPublisher {
    sender: mpsc::UnboundedSender<ChannelMessage>,
}

impl SubscriptionPublisher {
    /// True if the delivery was accepted; false once the subscriber has
    /// dropped the channel.
    pub fn publish(&self, batch: Vec<ChangeEvent>) -> bool {
        self.sender.send(Ok(batch)).is_ok()
    }

    pub fn publish_error(&self, error: ChannelError) -> bool {
        self.sender.send(Err(error)).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Build a connected publisher/subscription pair for one role.
pub fn subscription_channel(role: MatchRole) -> (SubscriptionPublisher, Subscription) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (
        SubscriptionPublisher { sender },
        Subscription::new(role, receiver),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChangeType, MatchRecord};

    fn record(id: &str) -> MatchRecord {
        MatchRecord {
            id: id.to_string(),
            participant_a: "u1".to_string(),
            participant_b: "u2".to_string(),
            created_at: chrono::Utc::now(),
            terminated: false,
            animation_played: false,
            conversation_id: None,
            is_missed_connection: false,
        }
    }

    #[tokio::test]
    async fn test_publish_and_receive_batch() {
        let (publisher, mut sub) = subscription_channel(MatchRole::ParticipantA);
        assert!(publisher.publish(vec![ChangeEvent {
            change: ChangeType::Added,
            record: record("m1"),
        }]));

        let batch = sub.recv().await.unwrap().unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].record.id, "m1");
        assert_eq!(sub.role(), MatchRole::ParticipantA);
    }

    #[tokio::test]
    async fn test_drop_unsubscribes() {
        let (publisher, sub) = subscription_channel(MatchRole::ParticipantB);
        drop(sub);
        assert!(publisher.is_closed());
        assert!(!publisher.publish(vec![]));
    }
}
