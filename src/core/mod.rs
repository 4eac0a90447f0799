pub mod cascade;
pub mod reconciler;
pub mod registry;
pub mod selector;
pub mod store;
pub mod swipe;

pub use cascade::run_unmatch_cascade;
pub use reconciler::{MatchReconciler, ReconcilerHandle};
pub use registry::ProcessedMatchRegistry;
pub use selector::{select_candidates, CandidateSelector, DiscoveryFilter};
pub use store::{ProfileStore, StoreState};
pub use swipe::{SwipeOutcome, SwipeProcessor, TransientSet};
