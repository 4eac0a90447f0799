use serde::{Deserialize, Serialize};

use crate::models::Profile;

/// Events the engine emits upward to the UI/animation layer.
///
/// Delivered on an unbounded channel; the engine never blocks on a slow
/// consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum EngineEvent {
    /// A new mutual match was surfaced. Fires at most once per match id
    /// per session regardless of how many times the underlying change
    /// is delivered.
    #[serde(rename_all = "camelCase")]
    MatchDiscovered {
        match_id: String,
        other_profile: Profile,
        conversation_id: Option<String>,
    },
    /// A profile was removed by the unmatch cascade; any open detail
    /// view for it must close.
    #[serde(rename_all = "camelCase")]
    ProfileRemoved { profile_id: String },
}

impl EngineEvent {
    pub fn match_id(&self) -> Option<&str> {
        match self {
            EngineEvent::MatchDiscovered { match_id, .. } => Some(match_id),
            EngineEvent::ProfileRemoved { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = EngineEvent::ProfileRemoved {
            profile_id: "u9".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"profileRemoved\""));
        assert!(json.contains("\"profileId\":\"u9\""));
    }
}
