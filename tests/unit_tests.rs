// Unit tests for Spark Engine

use spark_engine::core::{select_candidates, DiscoveryFilter, ProcessedMatchRegistry, StoreState};
use spark_engine::models::Profile;
use std::collections::HashSet;

fn profile(id: &str, age: u8, distance: Option<f64>) -> Profile {
    Profile {
        id: id.to_string(),
        name: format!("User {}", id),
        age,
        image_file_ids: vec![],
        distance,
        is_missed_connection: false,
    }
}

fn state(pool: Vec<Profile>) -> StoreState {
    StoreState {
        discover_pool: pool,
        ..StoreState::default()
    }
}

#[test]
fn test_selector_worked_example() {
    // Pool [a(50), a(50), b(null), c(10)], no exclusions
    // -> [c(10), a(50), b(null)]
    let s = state(vec![
        profile("a", 25, Some(50.0)),
        profile("a", 25, Some(50.0)),
        profile("b", 25, None),
        profile("c", 25, Some(10.0)),
    ]);

    let out = select_candidates(&s, &DiscoveryFilter::default(), &HashSet::new());
    let ids: Vec<&str> = out.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
}

#[test]
fn test_selector_dedup_invariant() {
    let s = state(vec![
        profile("x", 30, Some(1.0)),
        profile("y", 30, Some(2.0)),
        profile("x", 30, Some(0.5)),
        profile("x", 30, None),
    ]);

    let out = select_candidates(&s, &DiscoveryFilter::default(), &HashSet::new());
    let xs: Vec<&Profile> = out.iter().filter(|p| p.id == "x").collect();
    assert_eq!(xs.len(), 1);
    // First occurrence retained, so x keeps distance 1.0.
    assert_eq!(xs[0].distance, Some(1.0));
}

#[test]
fn test_selector_sort_invariant() {
    let s = state(vec![
        profile("a", 25, None),
        profile("b", 25, Some(42.0)),
        profile("c", 25, Some(3.0)),
        profile("d", 25, None),
        profile("e", 25, Some(17.0)),
    ]);

    let out = select_candidates(&s, &DiscoveryFilter::default(), &HashSet::new());

    // Distances non-decreasing, nulls after all non-nulls.
    let mut seen_null = false;
    let mut last = f64::NEG_INFINITY;
    for p in out.iter() {
        match p.distance {
            Some(d) => {
                assert!(!seen_null, "non-null distance after a null");
                assert!(d >= last);
                last = d;
            }
            None => seen_null = true,
        }
    }
}

#[test]
fn test_selector_exclusion_invariant() {
    let mut s = state(vec![
        profile("a", 25, Some(1.0)),
        profile("b", 25, Some(2.0)),
        profile("c", 25, Some(3.0)),
        profile("d", 25, Some(4.0)),
    ]);
    s.classifications.liked.insert("a".to_string());
    s.classifications.disliked.insert("b".to_string());
    s.classifications.matched.insert("c".to_string());

    let out = select_candidates(&s, &DiscoveryFilter::default(), &HashSet::new());
    for p in out.iter() {
        assert!(!s.classifications.contains(&p.id));
    }
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].id, "d");
}

#[test]
fn test_selector_empty_pool() {
    let out = select_candidates(
        &StoreState::default(),
        &DiscoveryFilter::default(),
        &HashSet::new(),
    );
    assert!(out.is_empty());
}

#[test]
fn test_selector_age_bounds_inclusive() {
    let s = state(vec![
        profile("low", 21, Some(1.0)),
        profile("high", 35, Some(2.0)),
        profile("under", 20, Some(3.0)),
        profile("over", 36, Some(4.0)),
    ]);
    let filter = DiscoveryFilter {
        min_age: 21,
        max_age: 35,
    };

    let out = select_candidates(&s, &filter, &HashSet::new());
    let ids: Vec<&str> = out.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["low", "high"]);
}

#[test]
fn test_registry_merge_is_commutative() {
    // Whichever writer registers first, the second sees false.
    let forward = ProcessedMatchRegistry::new();
    assert!(forward.insert("m1"));
    assert!(!forward.insert("m1"));

    let reverse = ProcessedMatchRegistry::new();
    assert!(reverse.insert("m1"));
    assert!(!reverse.insert("m1"));

    assert_eq!(forward.len(), reverse.len());
}

#[test]
fn test_registry_shared_across_tasks() {
    use std::sync::Arc;

    // Concurrent inserts of the same id from interleaved tasks: exactly
    // one wins.
    let registry = Arc::new(ProcessedMatchRegistry::new());
    let wins = tokio_test::block_on(async {
        let mut handles = vec![];
        for _ in 0..8 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move { registry.insert("m1") }));
        }
        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap() {
                wins += 1;
            }
        }
        wins
    });

    assert_eq!(wins, 1);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_store_state_revert_equality() {
    // A failed swipe commits nothing, so "revert" means the state is
    // simply untouched; verify pure mutations do not alias.
    let before = state(vec![profile("a", 25, Some(1.0))]);
    let after = before.with_liked("a");

    assert!(before.classifications.liked.is_empty());
    assert!(after.classifications.liked.contains("a"));
}
