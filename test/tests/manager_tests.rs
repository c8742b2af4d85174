//! Tests for the manager facade: routing, audit, stats, concurrency.

use std::sync::Arc;
use std::thread;

use abac_engine_core::access::{
    AccessControlManager, AuditLog, CombiningAlgorithm, Decision,
};
use abac_engine_test::{reader_context, standard_evaluator};

fn manager() -> AccessControlManager {
    let manager = AccessControlManager::new().no_cache();
    manager.register_evaluator("docs", standard_evaluator(CombiningAlgorithm::DenyOverrides));
    manager
}

#[test]
fn n_uncached_checks_produce_n_audit_entries() {
    let manager = manager();

    for i in 0..5 {
        let context = reader_context(&format!("u-{}", i), &["admin"]);
        manager.check_access("docs", &context);
    }

    assert_eq!(manager.audit().total_access_attempts(), 5);
    assert_eq!(manager.audit().len(), 5);
    assert_eq!(manager.audit().granted_count(), 5);
}

#[test]
fn unregistered_domain_is_distinct_from_policy_deny() {
    let manager = manager();

    let denied = manager.check_access("docs", &reader_context("u-1", &["contractor"]));
    assert_eq!(denied.result().decision(), Decision::Deny);

    let unrouted = manager.check_access("billing", &reader_context("u-1", &["contractor"]));
    assert_eq!(unrouted.result().decision(), Decision::Indeterminate);
    assert!(unrouted.result().reason().contains("billing"));
}

#[test]
fn is_access_allowed_boolean_form() {
    let manager = manager();
    assert!(manager.is_access_allowed("docs", &reader_context("u-1", &["admin"])));
    assert!(!manager.is_access_allowed("docs", &reader_context("u-1", &["guest"])));
}

#[test]
fn audit_entry_carries_context_snapshot() {
    let manager = manager();
    manager.check_access("docs", &reader_context("u-42", &["admin"]));

    let entries = manager.audit().entries();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.domain, "docs");
    assert_eq!(entry.subject_id, "u-42");
    assert_eq!(entry.subject_name, "test-user");
    assert_eq!(entry.object_id, "doc-1");
    assert_eq!(entry.object_type, "document");
    assert_eq!(entry.action_verb, "read");
    assert!(entry.granted);
    assert_eq!(entry.client_ip, "192.168.1.20");
    assert_eq!(entry.user_agent, "test-suite/1.0");
}

#[test]
fn audit_log_bound_is_respected() {
    let manager = AccessControlManager::new()
        .no_cache()
        .audit_log(AuditLog::new().max_entries(3));
    manager.register_evaluator("docs", standard_evaluator(CombiningAlgorithm::DenyOverrides));

    for i in 0..10 {
        manager.check_access("docs", &reader_context(&format!("u-{}", i), &["admin"]));
    }

    assert_eq!(manager.audit().len(), 3);
    assert_eq!(manager.audit().total_access_attempts(), 10);
    let retained = manager.audit().entries();
    assert_eq!(retained[0].subject_id, "u-7");
    assert_eq!(retained[2].subject_id, "u-9");
}

#[test]
fn stats_aggregate_registry_audit_and_cache() {
    let manager = AccessControlManager::new();
    manager.register_evaluator("docs", standard_evaluator(CombiningAlgorithm::DenyOverrides));
    manager.register_evaluator(
        "billing",
        standard_evaluator(CombiningAlgorithm::DenyUnlessPermit),
    );

    let context = reader_context("u-1", &["admin"]);
    manager.check_access("docs", &context);
    manager.check_access("docs", &context); // cache hit

    let stats = manager.stats();
    assert_eq!(stats.evaluator_count, 2);
    assert_eq!(stats.total_access_attempts, 1);
    assert_eq!(stats.granted_count, 1);
    assert_eq!(stats.audit_entries, 1);
    let cache = stats.cache.unwrap();
    assert_eq!(cache.hits, 1);
    assert_eq!(cache.misses, 1);
}

#[test]
fn concurrent_checks_do_not_lose_counter_updates() {
    let manager = Arc::new(manager());

    let mut handles = Vec::new();
    for t in 0..8 {
        let manager = Arc::clone(&manager);
        handles.push(thread::spawn(move || {
            for i in 0..25 {
                let context = reader_context(&format!("u-{}-{}", t, i), &["admin"]);
                manager.check_access("docs", &context);
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(manager.audit().total_access_attempts(), 200);
    assert_eq!(manager.audit().granted_count(), 200);
}

#[test]
fn registration_races_with_checks() {
    // A concurrent reader sees either no evaluator (INDETERMINATE) or the
    // fully built policy set (PERMIT) — never anything in between.
    let manager = Arc::new(AccessControlManager::new().no_cache());

    let writer = {
        let manager = Arc::clone(&manager);
        thread::spawn(move || {
            for _ in 0..50 {
                manager.register_evaluator(
                    "docs",
                    standard_evaluator(CombiningAlgorithm::DenyOverrides),
                );
                manager.unregister_evaluator("docs");
            }
        })
    };

    let reader = {
        let manager = Arc::clone(&manager);
        thread::spawn(move || {
            for _ in 0..200 {
                let result = manager.check_access("docs", &reader_context("u-1", &["admin"]));
                match result.result().decision() {
                    Decision::Permit | Decision::Indeterminate => {}
                    other => panic!("unexpected decision under race: {:?}", other),
                }
            }
        })
    };

    writer.join().unwrap();
    reader.join().unwrap();
}

#[test]
fn domains_listing() {
    let manager = manager();
    manager.register_evaluator("billing", standard_evaluator(CombiningAlgorithm::DenyOverrides));
    let mut domains = manager.domains();
    domains.sort();
    assert_eq!(domains, vec!["billing".to_string(), "docs".to_string()]);
}
