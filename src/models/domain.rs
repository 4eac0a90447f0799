use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A browsable candidate profile.
///
/// `distance` arrives precomputed from upstream and is unit-agnostic;
/// `None` means unknown and sorts after every known distance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub age: u8,
    #[serde(rename = "imageFileIds", default)]
    pub image_file_ids: Vec<String>,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(rename = "isMissedConnection", default)]
    pub is_missed_connection: bool,
}

/// The current user's classification of profiles they have acted on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationSets {
    pub liked: HashSet<String>,
    pub disliked: HashSet<String>,
    pub matched: HashSet<String>,
}

impl ClassificationSets {
    /// True if the id has been classified in any way.
    pub fn contains(&self, id: &str) -> bool {
        self.liked.contains(id) || self.disliked.contains(id) || self.matched.contains(id)
    }
}

/// Server-owned record of a mutual-like pairing.
///
/// Created server-side when a mutual like is detected; the client never
/// fabricates one. Termination is a logical delete (`terminated`) that
/// surfaces to a no-longer-matching listener as the record leaving the
/// filtered subscription query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: String,
    #[serde(rename = "participantA")]
    pub participant_a: String,
    #[serde(rename = "participantB")]
    pub participant_b: String,
    #[serde(rename = "createdAt")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub terminated: bool,
    #[serde(rename = "animationPlayed", default)]
    pub animation_played: bool,
    #[serde(rename = "conversationId", default)]
    pub conversation_id: Option<String>,
    #[serde(rename = "isMissedConnection", default)]
    pub is_missed_connection: bool,
}

impl MatchRecord {
    /// The participant that is not `user_id`.
    ///
    /// A correctly-filtered subscription only delivers records the user
    /// is on, so one of the two sides always matches.
    pub fn other_participant(&self, user_id: &str) -> &str {
        if self.participant_b == user_id {
            &self.participant_a
        } else {
            &self.participant_b
        }
    }

    pub fn involves(&self, user_id: &str) -> bool {
        self.participant_a == user_id || self.participant_b == user_id
    }
}

/// Which side of a match record a subscription watches.
///
/// The remote store cannot express "participant A or B equals me" as a
/// single live query, so the reconciler subscribes once per role and
/// merges the two channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchRole {
    ParticipantA,
    ParticipantB,
}

impl MatchRole {
    pub const BOTH: [MatchRole; 2] = [MatchRole::ParticipantA, MatchRole::ParticipantB];
}

/// Kind of change delivered on a live subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Modified,
    Removed,
}

/// One item of a live-subscription batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    #[serde(rename = "type")]
    pub change: ChangeType,
    pub record: MatchRecord,
}

/// Result of the remote like mutation.
///
/// `is_match: false` carries no further fields; `is_match: true` carries
/// the server-created match id and the hydrated other profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeOutcome {
    #[serde(rename = "isMatch")]
    pub is_match: bool,
    #[serde(rename = "matchId", default)]
    pub match_id: Option<String>,
    #[serde(rename = "matchedProfile", default)]
    pub matched_profile: Option<Profile>,
    #[serde(rename = "conversationId", default)]
    pub conversation_id: Option<String>,
}

impl LikeOutcome {
    pub fn no_match() -> Self {
        Self {
            is_match: false,
            match_id: None,
            matched_profile: None,
            conversation_id: None,
        }
    }
}

/// Messaging thread bound to a confirmed match. Referenced, not owned,
/// by the match engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub participants: HashSet<String>,
}

/// Swipe direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDirection {
    Like,
    Dislike,
}
