//! Integration tests for the engine.
//!
//! These tests run a small catalog through medoid resolution, affinity
//! scoring and selection the way a daily run would.

use catalog::{
    CatalogIndex, CatalogItem, Guest, GuestHistory, Transaction, build_guest_history,
};
use engine::{
    AffinityScorer, EngineConfig, EngineError, MedoidResolver, RecommendationSelector,
};

/// Three clusters of four items each; features are disjoint per cluster.
///
/// Cluster 0: bits 0-3, cluster 1: bits 4-7, cluster 2: bits 8-11.
fn create_test_index() -> CatalogIndex {
    let mut index = CatalogIndex::new();

    let mut serial_id = 1;
    for cluster in 0..3 {
        for variant in 0..4 {
            let mut bits = vec![b'0'; 12];
            for offset in 0..4 {
                // Each variant drops a different bit, except variant 0
                if variant == 0 || offset != variant {
                    bits[cluster * 4 + offset] = b'1';
                }
            }
            let bits = String::from_utf8(bits).unwrap();
            index.insert_item(CatalogItem {
                serial_id,
                cluster_label: cluster,
                features: bits.parse().unwrap(),
            });
            serial_id += 1;
        }
    }

    index.insert_guest(Guest {
        id: 100,
        name: "Alice".to_string(),
    });
    index.insert_guest(Guest {
        id: 101,
        name: "Bob".to_string(),
    });

    // Alice mostly eats from cluster 1, with an old cluster 0 phase
    let alice = [1, 2, 5, 6, 7, 6, 5, 7];
    for (day, &serial_id) in alice.iter().enumerate() {
        index.insert_transaction(Transaction {
            day: day as u32,
            guest_id: 100,
            serial_id,
        });
    }

    index.build_secondary_indices();
    index
        .set_daily_menu(&[2, 3, 6, 8, 10, 12])
        .unwrap();
    index
}

fn alice(index: &CatalogIndex) -> GuestHistory {
    build_guest_history(index, 100).unwrap()
}

#[test]
fn test_full_recommendation_flow() {
    let index = create_test_index();
    let config = EngineConfig::default();

    let medoids = MedoidResolver::new()
        .resolve(index.items(), index.num_clusters())
        .unwrap();
    assert_eq!(medoids.len(), 3);
    // The full-bit variant sits closest to all its siblings
    assert_eq!(medoids.get(0).unwrap().serial_id, 1);
    assert_eq!(medoids.get(1).unwrap().serial_id, 5);
    assert_eq!(medoids.get(2).unwrap().serial_id, 9);

    let history = alice(&index);
    let affinity = AffinityScorer::from_config(&config)
        .score(&history.features, &medoids)
        .unwrap();
    assert_eq!(affinity.ranked_clusters()[0], 1);

    let result = RecommendationSelector::from_config(&config).select(
        &affinity,
        index.daily_menu(),
        &history.seen,
    );

    // Cluster 1 first: 6 already tried, 8 is new
    assert_eq!(result.new_items[0], 8);
    assert!(result.seen_items.contains(&6));
    assert!(result.seen_items.contains(&2));
    assert!(!result.new_items.contains(&6));
    assert!(result.new_items.len() <= config.top_n);
}

#[test]
fn test_seen_and_new_are_disjoint_and_from_menu() {
    let index = create_test_index();
    let medoids = MedoidResolver
        .resolve(index.items(), index.num_clusters())
        .unwrap();
    let history = alice(&index);
    let affinity = AffinityScorer::new().score(&history.features, &medoids).unwrap();

    let result = RecommendationSelector::new(10).select(&affinity, index.daily_menu(), &history.seen);

    let menu_ids: Vec<u32> = index.daily_menu().iter().map(|c| c.serial_id).collect();
    for id in result.new_items.iter().chain(&result.seen_items) {
        assert!(menu_ids.contains(id));
    }
    for id in &result.new_items {
        assert!(!result.seen_items.contains(id));
        assert!(!history.seen.contains(id));
    }
    assert_eq!(result.new_items.len() + result.seen_items.len(), menu_ids.len());
}

#[test]
fn test_guest_without_history_cannot_be_scored() {
    let index = create_test_index();
    let medoids = MedoidResolver
        .resolve(index.items(), index.num_clusters())
        .unwrap();

    let bob = build_guest_history(&index, 101).unwrap();
    assert!(bob.is_empty());

    let err = AffinityScorer::new().score(&bob.features, &medoids).unwrap_err();
    assert_eq!(err, EngineError::EmptyHistory);
}

#[test]
fn test_recency_settings_change_ranking() {
    let index = create_test_index();
    let medoids = MedoidResolver
        .resolve(index.items(), index.num_clusters())
        .unwrap();
    let history = alice(&index);

    let flat = AffinityScorer::new()
        .with_decay_factor(1.0)
        .score(&history.features, &medoids)
        .unwrap();
    let steep = AffinityScorer::new()
        .with_block_size(1)
        .with_decay_factor(0.5)
        .score(&history.features, &medoids)
        .unwrap();

    // The old cluster 0 phase matters less when older items decay faster
    assert!(steep.get(0).unwrap() < flat.get(0).unwrap());
    assert!(steep.get(1).unwrap() > flat.get(1).unwrap());
}
