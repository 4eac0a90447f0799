pub mod backend;
pub mod conversations;
pub mod realtime;

pub use backend::{BackendError, DocumentClient, MatchBackend, StoreCollections};
pub use conversations::{ConversationBinder, DocumentConversations};
pub use realtime::{
    subscription_channel, ChannelError, ChannelMessage, LiveSubscriptionClient, Subscription,
    SubscriptionPublisher,
};
