pub mod domain;
pub mod events;

pub use domain::{
    ChangeEvent, ChangeType, ClassificationSets, Conversation, LikeOutcome, MatchRecord,
    MatchRole, Profile, SwipeDirection,
};
pub use events::EngineEvent;
