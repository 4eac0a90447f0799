//! Spark Engine - discovery and match-state engine for the Spark client
//!
//! This library implements the client-side candidate pipeline and
//! real-time match reconciliation: deriving the browsable candidate
//! queue from local state, resolving swipe actions against the remote
//! store, and merging the two role-filtered match subscriptions into
//! one idempotent, effectively-once stream of match events.

pub mod config;
pub mod core;
pub mod engine;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use crate::core::{
    select_candidates, CandidateSelector, DiscoveryFilter, MatchReconciler,
    ProcessedMatchRegistry, ProfileStore, StoreState, SwipeOutcome,
};
pub use crate::engine::MatchEngine;
pub use crate::models::{
    ChangeEvent, ChangeType, EngineEvent, MatchRecord, MatchRole, Profile, SwipeDirection,
};
pub use crate::services::{ConversationBinder, LiveSubscriptionClient, MatchBackend};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_library_exports() {
        // Verify that the library exports work correctly
        let state = StoreState::default();
        let out = select_candidates(&state, &DiscoveryFilter::default(), &HashSet::new());
        assert!(out.is_empty());
    }
}
