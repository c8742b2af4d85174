//! Tests for the decision cache, through the manager and standalone.

use std::thread;
use std::time::Duration;

use abac_engine_core::access::{
    AccessCache, AccessControlManager, AccessResult, CombiningAlgorithm, Decision,
};
use abac_engine_test::{evening_reader_context, reader_context, standard_evaluator};

fn manager() -> AccessControlManager {
    let manager = AccessControlManager::new();
    manager.register_evaluator("docs", standard_evaluator(CombiningAlgorithm::DenyOverrides));
    manager
}

#[test]
fn second_call_with_same_key_tuple_is_served_from_cache() {
    let manager = manager();
    let context = reader_context("u-1", &["admin"]);

    let first = manager.check_access("docs", &context);
    assert!(!first.from_cache());

    let second = manager.check_access("docs", &context);
    assert!(second.from_cache());
    assert_eq!(second.result().decision(), first.result().decision());
    assert_eq!(second.result().reason(), first.result().reason());
    assert_eq!(manager.decision_cache().unwrap().hit_count(), 1);
}

#[test]
fn coarse_key_collides_across_time_of_day() {
    // Same domain/subject/object/verb/ip/day, different hour and user
    // agent: the second request reuses the first decision. This is the
    // documented correctness gap of the coarse fingerprint.
    let manager = manager();

    let morning = reader_context("u-1", &["admin"]);
    let evening = evening_reader_context("u-1", &["admin"]);

    let first = manager.check_access("docs", &morning);
    let second = manager.check_access("docs", &evening);
    assert!(!first.from_cache());
    assert!(second.from_cache());
}

#[test]
fn ttl_elapse_turns_hit_into_miss() {
    let manager = AccessControlManager::new()
        .cache(AccessCache::new().ttl(Duration::from_millis(30)));
    manager.register_evaluator("docs", standard_evaluator(CombiningAlgorithm::DenyOverrides));
    let context = reader_context("u-1", &["admin"]);

    manager.check_access("docs", &context);
    thread::sleep(Duration::from_millis(60));
    let result = manager.check_access("docs", &context);
    assert!(!result.from_cache());

    let stats = manager.decision_cache().unwrap().stats();
    assert_eq!(stats.hits, 0);
    assert_eq!(stats.misses, 2);
}

#[test]
fn clear_cache_forces_reevaluation() {
    let manager = manager();
    let context = reader_context("u-1", &["admin"]);

    manager.check_access("docs", &context);
    manager.clear_cache();
    let result = manager.check_access("docs", &context);
    assert!(!result.from_cache());
}

#[test]
fn capacity_overflow_evicts_oldest_tenth() {
    let cache = AccessCache::new().max_size(30);
    cache.put("key-0".to_string(), AccessResult::permit("ok"));
    // Make the first entry strictly oldest on coarse monotonic clocks.
    thread::sleep(Duration::from_millis(5));
    for i in 1..31 {
        cache.put(format!("key-{}", i), AccessResult::permit("ok"));
    }
    // Insert 31 into a 30-entry cache: the oldest 3 are evicted first.
    assert_eq!(cache.len(), 28);
    assert!(cache.get("key-0").is_none());
    assert!(cache.get("key-30").is_some());
}

#[test]
fn unregistered_domain_result_is_not_cached() {
    let manager = AccessControlManager::new();
    let context = reader_context("u-1", &["admin"]);

    let first = manager.check_access("nowhere", &context);
    assert_eq!(first.result().decision(), Decision::Indeterminate);

    // Still a miss the second time: error results are never stored.
    let second = manager.check_access("nowhere", &context);
    assert!(!second.from_cache());
    assert_eq!(manager.decision_cache().unwrap().hit_count(), 0);
}

#[test]
fn hit_rate_reporting() {
    let manager = manager();
    let context = reader_context("u-1", &["admin"]);

    manager.check_access("docs", &context);
    manager.check_access("docs", &context);
    manager.check_access("docs", &context);

    let stats = manager.decision_cache().unwrap().stats();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.hits, 2);
    assert!((stats.hit_rate - 2.0 / 3.0).abs() < 1e-9);
}
